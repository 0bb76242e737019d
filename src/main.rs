//! Binary entry point that wires configuration, logging and the command line
//! into the Tahreez chat assistant.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tahreez::assistant;
use tahreez::config::{self, CONFIG_PATH};

/// Bilingual (English/Arabic) Q&A assistant for Tahreez.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Knowledge file to use instead of the built-in table.
    #[arg(long)]
    knowledge: Option<PathBuf>,

    /// Do not speak answers aloud.
    #[arg(long)]
    no_speech: bool,

    /// Answer one question and exit.
    #[arg(long, value_name = "QUESTION")]
    ask: Option<String>,
}

#[tokio::main]
/// Bootstraps environment variables and logging, then runs either a single
/// answer or the interactive chat loop.
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = config::load_app_config(&cli.config).apply_env();
    if let Some(path) = cli.knowledge {
        settings.knowledge_path = Some(path);
    }
    if cli.no_speech {
        settings.speech_enabled = false;
    }

    match cli.ask {
        Some(question) => assistant::answer_once(settings, &question).await,
        None => assistant::run_chat_assistant(settings).await,
    }
}
