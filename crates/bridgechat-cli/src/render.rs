use std::io::{self, Write};

use bridgechat_core::ingest::format_size;
use bridgechat_core::{ConversationState, Role};

/// Prints a streaming reply incrementally: only the text added since the
/// last snapshot is written. When the content is replaced rather than
/// extended (an error overwriting a partial answer), the new content is
/// printed on a fresh line.
#[derive(Debug, Default)]
pub struct ReplyPrinter {
    reply_id: Option<u64>,
    printed: String,
}

impl ReplyPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, state: &ConversationState, out: &mut impl Write) -> io::Result<()> {
        let Some(reply) = state
            .last_message()
            .filter(|m| m.role == Role::Assistant)
        else {
            return Ok(());
        };

        if self.reply_id != Some(reply.id) {
            self.reply_id = Some(reply.id);
            self.printed.clear();
        }

        match reply.content.strip_prefix(self.printed.as_str()) {
            Some(added) => write!(out, "{added}")?,
            None => write!(out, "\n{}", reply.content)?,
        }
        self.printed.clone_from(&reply.content);
        out.flush()
    }
}

/// The file panel: one line per uploaded document.
pub fn file_listing(state: &ConversationState) -> String {
    if state.files.is_empty() {
        return "No documents uploaded. Use /add or /dir to upload reference material.\n".into();
    }

    let mut listing = format!("Documents ({}):\n", state.files.len());
    for file in state.files.iter() {
        listing.push_str(&format!(
            "  {}  [{}] {} ({})\n",
            file.id,
            file.kind().label(),
            file.display_path(),
            format_size(file.size_bytes)
        ));
    }
    if state.is_file_loading {
        listing.push_str("  loading...\n");
    }
    listing
}
