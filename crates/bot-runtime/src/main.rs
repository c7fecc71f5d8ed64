//! # Reply-Chain Bot
//!
//! ```text
//! reply-chain-bot --config config.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bot_runtime::{init_logging, BotConfig, BotRuntime};

#[derive(Debug, Parser)]
#[command(name = "reply-chain-bot", about = "Measures reply chains on Nostr")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();

    let config = BotConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let runtime = BotRuntime::new(config).context("Invalid configuration")?;

    info!("starting Reply Tree Measurer!");
    runtime.start();

    info!("Bot is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
