use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::watch;

use crate::config::Settings;
use crate::constants::messages::{ERROR_PREFIX, UNKNOWN_FAILURE};
use crate::ingest::{ingest_batch, FileHandle};
use crate::llm::ChatBackend;
use crate::state::ConversationState;

/// How a `send_message` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or a reply was already streaming. Nothing changed.
    Rejected,
    Completed,
    /// The reply failed; carries the text written into the placeholder.
    Failed(String),
}

/// The single active conversation.
///
/// Sole writer of `ConversationState`. Every transition publishes a new
/// snapshot on a watch channel; renderers call `subscribe` and redraw on
/// change.
pub struct Session {
    backend: Box<dyn ChatBackend>,
    state: watch::Sender<Arc<ConversationState>>,
}

impl Session {
    pub fn new(backend: Box<dyn ChatBackend>) -> Self {
        let (state, _) = watch::channel(Arc::new(ConversationState::default()));
        Self { backend, state }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Box::new(settings.build_client()))
    }

    pub fn snapshot(&self) -> Arc<ConversationState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ConversationState>> {
        self.state.subscribe()
    }

    /// Apply `transition` atomically; publishes only when it returns a state.
    fn update<F>(&self, transition: F) -> bool
    where
        F: FnOnce(&ConversationState) -> Option<ConversationState>,
    {
        self.state.send_if_modified(|current| match transition(current) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    /// Send `text` and stream the reply into the placeholder.
    ///
    /// Returns once the reply has finished or failed. Stream errors never
    /// escape: they become the assistant's reply and the session goes back
    /// to idle.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let mut started = None;
        self.state.send_if_modified(|current| {
            match current.begin_send(text, Utc::now()) {
                Some((next, ticket)) => {
                    // context is what existed before this exchange
                    started = Some((ticket, current.files.clone(), current.messages.clone()));
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });

        let Some((ticket, files, history)) = started else {
            tracing::debug!("Send rejected: blank input or reply in progress");
            return SendOutcome::Rejected;
        };

        tracing::debug!(
            "Sending message {} with {} files and {} prior messages",
            ticket.user_id,
            files.len(),
            history.len()
        );

        let mut fragments = self.backend.stream_reply(text, &files, &history);
        let mut accumulated = String::new();

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(fragment) => {
                    accumulated.push_str(&fragment);
                    self.update(|s| Some(s.with_message_content(ticket.reply_id, &accumulated)));
                }
                Err(e) => {
                    let description = e.to_string();
                    let description = if description.is_empty() {
                        UNKNOWN_FAILURE.to_string()
                    } else {
                        description
                    };
                    let content = format!("{ERROR_PREFIX}{description}");
                    self.update(|s| {
                        Some(
                            s.with_message_content(ticket.reply_id, &content)
                                .with_processing(false),
                        )
                    });
                    tracing::warn!("Reply {} failed: {}", ticket.reply_id, description);
                    return SendOutcome::Failed(content);
                }
            }
        }

        self.update(|s| Some(s.with_processing(false)));
        tracing::debug!(
            "Reply {} complete ({} bytes)",
            ticket.reply_id,
            accumulated.len()
        );
        SendOutcome::Completed
    }

    /// Ingest a selection and append the records. Returns how many were
    /// added; 0 without reading anything when the selection is empty or
    /// another batch is still loading.
    pub async fn add_files(&self, handles: &[Box<dyn FileHandle>]) -> usize {
        if handles.is_empty() {
            return 0;
        }

        let started = self.update(|s| (!s.is_file_loading).then(|| s.with_file_loading(true)));
        if !started {
            tracing::debug!("Upload rejected: a batch is already loading");
            return 0;
        }

        let records = ingest_batch(handles).await;
        let added = records.len();
        self.update(|s| Some(s.with_files_appended(records).with_file_loading(false)));
        added
    }

    /// Remove the file with this id. Returns false (and publishes nothing)
    /// when there is none.
    pub fn remove_file(&self, id: &str) -> bool {
        self.update(|s| s.without_file(id))
    }

    pub fn toggle_sidebar(&self) {
        self.update(|s| Some(s.with_sidebar_toggled()));
    }
}
