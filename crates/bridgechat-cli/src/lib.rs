// Library interface for bridgechat-cli so integration tests can reach the
// command parser and the transcript renderer.

pub mod app;
pub mod commands;
pub mod render;

pub use commands::{handle_command, CommandResult};
pub use render::{file_listing, ReplyPrinter};
