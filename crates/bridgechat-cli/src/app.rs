use anyhow::Result;
use bridgechat_core::ingest::{select_directory, select_files};
use bridgechat_core::{FileHandle, SendOutcome, Session};
use crossterm::style::Stylize;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{handle_command, CommandResult};
use crate::render::{file_listing, ReplyPrinter};

// ── Sending ─────────────────────────────────────────────────────────────

/// Send one message and print the reply as it streams in.
pub async fn send_and_render(session: &Session, text: &str) -> Result<SendOutcome> {
    let mut updates = session.subscribe();
    let mut printer = ReplyPrinter::new();
    let mut stdout = io::stdout();

    let send = session.send_message(text);
    tokio::pin!(send);

    let outcome = loop {
        tokio::select! {
            outcome = &mut send => break outcome,
            changed = updates.changed() => {
                if changed.is_err() {
                    break (&mut send).await;
                }
                let state = updates.borrow_and_update().clone();
                printer.render(&state, &mut stdout)?;
            }
        }
    };

    // flush whatever arrived between the last change and completion
    printer.render(&session.snapshot(), &mut stdout)?;
    if outcome != SendOutcome::Rejected {
        writeln!(stdout)?;
    }
    Ok(outcome)
}

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(session: &Session, prompt: &str) -> Result<()> {
    match send_and_render(session, prompt).await? {
        SendOutcome::Rejected => anyhow::bail!("Nothing to send: the prompt is empty"),
        SendOutcome::Failed(_) => anyhow::bail!("The assistant could not answer"),
        SendOutcome::Completed => Ok(()),
    }
}

// ── Uploads ─────────────────────────────────────────────────────────────

/// Stat the selected paths off the runtime threads.
pub async fn pick_files(paths: Vec<PathBuf>) -> Result<Vec<Box<dyn FileHandle>>> {
    Ok(tokio::task::spawn_blocking(move || select_files(paths)).await?)
}

/// Walk a folder off the runtime threads.
pub async fn pick_folder(root: PathBuf) -> Result<Vec<Box<dyn FileHandle>>> {
    let handles = tokio::task::spawn_blocking(move || select_directory(&root)).await??;
    Ok(handles)
}

pub async fn upload(session: &Session, handles: Vec<Box<dyn FileHandle>>) {
    let selected = handles.len();
    let added = session.add_files(&handles).await;
    println!("{}", format!("Added {added} of {selected} selected files.").dark_grey());
    if session.snapshot().is_sidebar_visible {
        print!("{}", file_listing(&session.snapshot()));
    }
}

// ── Interactive loop ────────────────────────────────────────────────────

pub async fn run_repl(session: &Session) -> Result<()> {
    println!("{}", "bridgechat - ask questions about your documents".bold());
    println!("{}", "Type /help for commands.".dark_grey());
    if !session.snapshot().has_files() {
        println!(
            "{}",
            "Upload reference documents first (/add, /dir) to get grounded answers.".yellow()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match handle_command(&line) {
            CommandResult::Quit => break,
            CommandResult::Message(msg) => println!("{msg}"),
            CommandResult::AddFiles(paths) => upload(session, pick_files(paths).await?).await,
            CommandResult::AddFolder(path) => match pick_folder(path).await {
                Ok(handles) => upload(session, handles).await,
                Err(e) => eprintln!("{}", e.to_string().red()),
            },
            CommandResult::RemoveFile(id) => {
                let name = session.snapshot().file(&id).map(|f| f.display_path().to_string());
                if session.remove_file(&id) {
                    println!("Removed {}.", name.unwrap_or(id));
                    if session.snapshot().is_sidebar_visible {
                        print!("{}", file_listing(&session.snapshot()));
                    }
                } else {
                    println!("No uploaded file has id {id}.");
                }
            }
            CommandResult::ListFiles => print!("{}", file_listing(&session.snapshot())),
            CommandResult::ToggleSidebar => {
                session.toggle_sidebar();
                let state = if session.snapshot().is_sidebar_visible {
                    "shown"
                } else {
                    "hidden"
                };
                println!("File panel {state}.");
            }
            CommandResult::NotACommand => {
                if line.trim().is_empty() {
                    continue;
                }
                println!("{}", "assistant:".green().bold());
                send_and_render(session, &line).await?;
            }
        }
    }

    Ok(())
}
