use anyhow::Result;
use bridgechat_cli::app;
use bridgechat_core::{Session, Settings};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bridgechat")]
#[command(about = "bridgechat - chat with your course documents")]
#[command(version)]
struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Upload these files before starting
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Upload this folder before starting
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(ref model) = cli.model {
        settings.llm.model = model.clone();
    }
    if settings.api_key().is_none() {
        tracing::warn!(
            "{} is not set; requests will fail until it is",
            settings.llm.api_key_env
        );
    }

    let session = Session::from_settings(&settings);

    if !cli.files.is_empty() {
        app::upload(&session, app::pick_files(cli.files).await?).await;
    }
    if let Some(dir) = cli.dir {
        app::upload(&session, app::pick_folder(dir).await?).await;
    }

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&session, &prompt).await?;
    } else {
        app::run_repl(&session).await?;
    }

    Ok(())
}
