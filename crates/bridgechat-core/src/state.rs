use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::FileRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Millisecond timestamp, strictly increasing within a session.
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(id: u64, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            created_at,
        }
    }

    /// The empty assistant message filled in while a reply streams.
    pub fn placeholder(id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            created_at,
        }
    }
}

/// Everything the presentation layer renders. Never mutated in place: each
/// transition below returns a fresh value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    /// Shared between snapshots; only rebuilt when the file set changes.
    pub files: Arc<Vec<FileRecord>>,
    pub messages: Vec<ChatMessage>,
    pub is_processing: bool,
    pub is_file_loading: bool,
    pub is_sidebar_visible: bool,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            files: Arc::new(Vec::new()),
            messages: Vec::new(),
            is_processing: false,
            is_file_loading: false,
            is_sidebar_visible: true,
        }
    }
}

/// Ids handed out by `begin_send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTicket {
    pub user_id: u64,
    pub reply_id: u64,
}

impl ConversationState {
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn message(&self, id: u64) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn file(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    fn next_message_id(&self, now: DateTime<Utc>) -> u64 {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        match self.messages.last() {
            Some(last) if last.id >= millis => last.id + 1,
            _ => millis,
        }
    }

    /// Append the user message and its placeholder and mark the session busy.
    /// `None` when the prompt is blank or a reply is already streaming.
    pub fn begin_send(&self, prompt: &str, now: DateTime<Utc>) -> Option<(Self, SendTicket)> {
        if prompt.trim().is_empty() || self.is_processing {
            return None;
        }

        let user_id = self.next_message_id(now);
        let reply_id = user_id + 1;

        let mut next = self.clone();
        next.messages.push(ChatMessage::user(user_id, prompt, now));
        next.messages.push(ChatMessage::placeholder(reply_id, now));
        next.is_processing = true;
        Some((next, SendTicket { user_id, reply_id }))
    }

    /// Replace (not append to) the content of message `id`.
    pub fn with_message_content(&self, id: u64, content: &str) -> Self {
        let mut next = self.clone();
        if let Some(message) = next.messages.iter_mut().find(|m| m.id == id) {
            message.content = content.to_string();
        }
        next
    }

    pub fn with_processing(&self, is_processing: bool) -> Self {
        Self {
            is_processing,
            ..self.clone()
        }
    }

    pub fn with_file_loading(&self, is_file_loading: bool) -> Self {
        Self {
            is_file_loading,
            ..self.clone()
        }
    }

    pub fn with_files_appended(&self, records: Vec<FileRecord>) -> Self {
        let mut files = self.files.as_ref().clone();
        files.extend(records);
        Self {
            files: Arc::new(files),
            ..self.clone()
        }
    }

    /// `None` when no file has this id.
    pub fn without_file(&self, id: &str) -> Option<Self> {
        if !self.files.iter().any(|f| f.id == id) {
            return None;
        }
        let files: Vec<FileRecord> = self.files.iter().filter(|f| f.id != id).cloned().collect();
        Some(Self {
            files: Arc::new(files),
            ..self.clone()
        })
    }

    pub fn with_sidebar_toggled(&self) -> Self {
        Self {
            is_sidebar_visible: !self.is_sidebar_visible,
            ..self.clone()
        }
    }
}
