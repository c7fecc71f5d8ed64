//! # Set Profile
//!
//! Publishes the `[profile]` table as the bot's kind-0 metadata.
//!
//! ```text
//! set-profile --config config.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rc_01_relay_pool::RelayPool;
use rc_02_reply_tree::publish_to_endpoints;
use shared_types::EventBuilder;
use tracing::{info, warn};

use bot_runtime::adapters::RelayPoolConnector;
use bot_runtime::{init_logging, BotConfig};

const PROFILE_PUBLISH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Parser)]
#[command(name = "set-profile", about = "Publishes the bot's profile metadata")]
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
    config.validate().context("Invalid configuration")?;
    let keys = config.keys()?;

    let metadata = EventBuilder::metadata(config.profile_json()?)
        .sign(&keys)
        .context("Failed to sign metadata")?;
    info!(event_id = %metadata.id, content = %metadata.content, "Publishing profile");

    let pool = Arc::new(RelayPool::new(config.pool.clone()));
    let connector = RelayPoolConnector::new(Arc::clone(&pool));
    let report = publish_to_endpoints(
        &connector,
        &metadata,
        &config.relay.write,
        PROFILE_PUBLISH_TIMEOUT,
    )
    .await;
    pool.shutdown();

    if report.accepted_count() == 0 {
        warn!("No relay accepted the profile");
    }
    info!(
        accepted = report.accepted_count(),
        relays = report.endpoints.len(),
        "setting profile completed"
    );
    Ok(())
}
