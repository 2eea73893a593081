//! Flipbook CLI binary.
//!
//! This binary provides command-line access to Flipbook's functionality:
//! - Generate a full animation from a scene description
//! - Generate and archive frame prompts only
//! - Render frames from an archived run
//! - Assemble a frames directory into a video

use clap::Parser;
use flipbook::FlipbookConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, execute};

    // API keys may live in .env
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => FlipbookConfig::from_file(path)?,
        None => FlipbookConfig::load()?,
    };

    // Ctrl-C stops the run but keeps what was produced so far
    let token = CancellationToken::new();
    let watcher = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            watcher.cancel();
        }
    });

    execute(cli.command, config, token).await?;

    Ok(())
}
