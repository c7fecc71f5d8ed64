//! # Bot Configuration
//!
//! TOML file plus environment overrides.
//!
//! ```toml
//! private_key = "<64 hex chars>"
//! bot_pubkeys = ["<hex pubkey>"]
//! timeout_secs = 30
//! trigger_phrase = "連鎖数"
//!
//! [relay]
//! read = ["wss://relay.example"]
//! write = ["wss://relay.example"]
//!
//! [profile]
//! name = "reply-chain"
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `RC_PRIVATE_KEY` | `private_key` |
//! | `RC_TIMEOUT_SECS` | `timeout_secs` |

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use rc_01_relay_pool::RelayPoolConfig;
use rc_02_reply_tree::{MeasureConfig, DEFAULT_MEASURE_TIMEOUT_SECS, DEFAULT_PUBLISH_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use shared_types::{Keys, PublicKey};
use thiserror::Error;
use tracing::{info, warn};

/// Default phrase that marks a note as a measurement request.
pub const DEFAULT_TRIGGER_PHRASE: &str = "連鎖数";

const ENV_PRIVATE_KEY: &str = "RC_PRIVATE_KEY";
const ENV_TIMEOUT_SECS: &str = "RC_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid bot pubkey {pubkey:?}: {reason}")]
    InvalidBotPubkey { pubkey: String, reason: String },

    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("At least one read relay is required")]
    NoReadRelays,

    #[error("At least one write relay is required")]
    NoWriteRelays,
}

/// Relay lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relays queried for triggers, targets and replies.
    #[serde(default)]
    pub read: Vec<String>,
    /// Relays every response is published to.
    #[serde(default)]
    pub write: Vec<String>,
}

/// Complete bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Hex secret key the bot signs with.
    pub private_key: String,

    /// Other bots. Their notes never trigger and their replies are never
    /// counted.
    #[serde(default)]
    pub bot_pubkeys: Vec<String>,

    /// Deadline for one measurement.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-relay publish timeout.
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,

    #[serde(default = "default_trigger_phrase")]
    pub trigger_phrase: String,

    pub relay: RelayConfig,

    /// Profile metadata published by `set-profile`.
    #[serde(default)]
    pub profile: BTreeMap<String, String>,

    /// Connection tuning.
    #[serde(default)]
    pub pool: RelayPoolConfig,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_MEASURE_TIMEOUT_SECS
}

fn default_publish_timeout_secs() -> u64 {
    DEFAULT_PUBLISH_TIMEOUT_SECS
}

fn default_trigger_phrase() -> String {
    DEFAULT_TRIGGER_PHRASE.to_string()
}

impl BotConfig {
    /// Load from a TOML file and apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse TOML content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_PRIVATE_KEY) {
            self.private_key = key;
            info!("Loaded private key from environment");
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS),
            }
        }
    }

    /// Check everything the runtime relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.keys()?;
        self.bot_pubkey_set()?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.relay.read.is_empty() {
            return Err(ConfigError::NoReadRelays);
        }
        if self.relay.write.is_empty() {
            return Err(ConfigError::NoWriteRelays);
        }
        Ok(())
    }

    pub fn keys(&self) -> Result<Keys, ConfigError> {
        Keys::from_hex(&self.private_key).map_err(|e| ConfigError::InvalidPrivateKey(e.to_string()))
    }

    pub fn bot_pubkey_set(&self) -> Result<HashSet<PublicKey>, ConfigError> {
        self.bot_pubkeys
            .iter()
            .map(|hex| {
                PublicKey::from_hex(hex).map_err(|e| ConfigError::InvalidBotPubkey {
                    pubkey: hex.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    /// Measurement settings. The bot's own key is excluded alongside the
    /// configured bot pubkeys.
    pub fn measure_config(&self, own: PublicKey) -> Result<MeasureConfig, ConfigError> {
        let mut excluded_authors = self.bot_pubkey_set()?;
        excluded_authors.insert(own);
        Ok(MeasureConfig {
            timeout: self.timeout(),
            excluded_authors,
            read_relays: self.relay.read.clone(),
        })
    }

    /// Kind-0 content for `set-profile`.
    pub fn profile_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(&self.profile).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const SECRET: &str = "0707070707070707070707070707070707070707070707070707070707070707";

    fn sample() -> String {
        format!(
            r#"
private_key = "{SECRET}"
bot_pubkeys = ["{}"]

[relay]
read = ["wss://read.example"]
write = ["wss://write.example", "wss://write2.example"]

[profile]
name = "reply-chain"
about = "counts replies"
"#,
            "ab".repeat(32)
        )
    }

    #[test]
    fn test_parse_with_defaults() {
        let config = BotConfig::parse(&sample()).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.publish_timeout_secs, 5);
        assert_eq!(config.trigger_phrase, "連鎖数");
        assert_eq!(config.relay.write.len(), 2);
        assert_eq!(config.pool.fetch_timeout_ms, RelayPoolConfig::default().fetch_timeout_ms);
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BotConfig::parse(&sample()).unwrap();
        let env: HashMap<&str, &str> = [("RC_TIMEOUT_SECS", "12")].into();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_bad_env_timeout_is_ignored() {
        let mut config = BotConfig::parse(&sample()).unwrap();
        config.apply_overrides(|name| (name == "RC_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = BotConfig::parse(&sample()).unwrap();
        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_validate_rejects_missing_relays() {
        let mut config = BotConfig::parse(&sample()).unwrap();
        config.relay.write.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoWriteRelays)));
        config.relay.read.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoReadRelays)));
    }

    #[test]
    fn test_validate_rejects_bad_keys() {
        let mut config = BotConfig::parse(&sample()).unwrap();
        config.bot_pubkeys.push("zz".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBotPubkey { .. })
        ));

        let mut config = BotConfig::parse(&sample()).unwrap();
        config.private_key = "00".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_measure_config_excludes_self() {
        let config = BotConfig::parse(&sample()).unwrap();
        let own = config.keys().unwrap().public_key();
        let measure = config.measure_config(own).unwrap();
        assert!(measure.excluded_authors.contains(&own));
        assert_eq!(measure.excluded_authors.len(), 2);
        assert_eq!(measure.read_relays, vec!["wss://read.example".to_string()]);
    }

    #[test]
    fn test_profile_json() {
        let config = BotConfig::parse(&sample()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&config.profile_json().unwrap()).unwrap();
        assert_eq!(json["name"], "reply-chain");
        assert_eq!(json["about"], "counts replies");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample().as_bytes()).unwrap();
        let config = BotConfig::load(file.path()).unwrap();
        assert_eq!(config.relay.read.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            BotConfig::load("/nonexistent/config.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
