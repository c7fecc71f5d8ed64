//! # Reply-Tree Configuration

use std::collections::HashSet;
use std::time::Duration;

use shared_types::PublicKey;

use crate::domain::DEFAULT_MEASURE_TIMEOUT_SECS;

/// Measurement configuration.
#[derive(Clone, Debug)]
pub struct MeasureConfig {
    /// Deadline for one whole measurement.
    pub timeout: Duration,

    /// Authors whose replies are never counted (bot identities).
    pub excluded_authors: HashSet<PublicKey>,

    /// Relays replies are read from.
    pub read_relays: Vec<String>,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_MEASURE_TIMEOUT_SECS),
            excluded_authors: HashSet::new(),
            read_relays: Vec::new(),
        }
    }
}

impl MeasureConfig {
    /// Create a config for testing (single in-memory relay, short deadline).
    pub fn for_testing() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            excluded_authors: HashSet::new(),
            read_relays: vec!["wss://relay.test".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MeasureConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.excluded_authors.is_empty());
    }

    #[test]
    fn test_testing_config() {
        let config = MeasureConfig::for_testing();
        assert_eq!(config.read_relays.len(), 1);
        assert!(config.timeout < Duration::from_secs(30));
    }
}
