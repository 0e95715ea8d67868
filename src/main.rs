//! Wayplan - multi-agent travel itinerary planner
//!
//! CLI entry point for the interactive planning chat.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use wayplan::cli::{ChatSession, Cli, Command};
use wayplan::config::Config;
use wayplan::llm::create_client;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wayplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Log to file so the chat UI stays clean
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("wayplan.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "Wayplan loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Some(Command::ShowConfig) => {
            let yaml = serde_yaml::to_string(&config).context("Failed to render config")?;
            print!("{}", yaml);
            Ok(())
        }
        // `wayplan` with no subcommand starts a chat
        command => {
            let initial_message = match command {
                Some(Command::Chat { initial_message }) => initial_message,
                _ => None,
            };

            config.validate()?;
            let client = create_client(&config.llm).context("Failed to create LLM client")?;
            let mut session = ChatSession::new(client, &config);
            session.run(initial_message).await
        }
    }
}
