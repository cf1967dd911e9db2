use std::path::PathBuf;

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Upload individual files.
    AddFiles(Vec<PathBuf>),
    /// Upload a whole folder.
    AddFolder(PathBuf),
    /// Remove an uploaded file by id.
    RemoveFile(String),
    /// List uploaded files.
    ListFiles,
    /// Show or hide the file panel.
    ToggleSidebar,
    /// Not a command - treat as a chat message.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        "/add" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /add <file> [file...]".into())
            } else {
                CommandResult::AddFiles(arg.split_whitespace().map(PathBuf::from).collect())
            }
        }
        "/dir" | "/folder" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /dir <folder>".into())
            } else {
                CommandResult::AddFolder(PathBuf::from(arg))
            }
        }
        "/rm" | "/remove" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /rm <file-id>  (see /files for ids)".into())
            } else {
                CommandResult::RemoveFile(arg.to_string())
            }
        }
        "/files" | "/ls" => CommandResult::ListFiles,
        "/sidebar" => CommandResult::ToggleSidebar,
        "/version" => {
            CommandResult::Message(format!("bridgechat v{}", env!("CARGO_PKG_VERSION")))
        }

        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ bridgechat commands ──────────────────────────────────────────╮

  DOCUMENTS
    /add <file> [file...]     Upload one or more files
    /dir <folder>             Upload a whole folder
    /rm <id>                  Remove an uploaded file
    /files, /ls               List uploaded files
    /sidebar                  Show or hide the file panel

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit

  Anything else is sent to the assistant.

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
