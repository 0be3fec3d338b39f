//! Configuration loading and validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use usage_protocol::to_id;
use usage_stats::{WeightingError, WeightingPolicy};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid weighting for tier {tier}: {error}")]
    WeightingError { tier: String, error: WeightingError },
}

/// Per-tier settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    #[serde(default)]
    pub weighting: WeightingPolicy,

    /// Battles that ended before this turn are dropped (early forfeits)
    #[serde(default)]
    pub min_turns: u32,
}

/// Main pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent worker tasks
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-log fetch timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Skip undecodable lines instead of abandoning the battle
    #[serde(default)]
    pub tolerate_decode_errors: bool,

    /// Tier id -> settings; logs from other tiers are rejected
    #[serde(default)]
    pub tiers: BTreeMap<String, TierConfig>,

    /// Where processed ids and tallies persist between runs
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,

    /// Rewrite the checkpoint after this many newly processed logs; 0 saves
    /// only when the run ends
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
}

fn default_workers() -> usize {
    4
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_checkpoint_every() -> usize {
    500
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fetch_timeout_secs: default_fetch_timeout(),
            tolerate_decode_errors: false,
            tiers: BTreeMap::new(),
            checkpoint_path: None,
            checkpoint_every: default_checkpoint_every(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: PipelineConfig = serde_json::from_str(json)?;
        config.tiers = std::mem::take(&mut config.tiers)
            .into_iter()
            .map(|(name, tier)| (to_id(&name), tier))
            .collect();
        config.validate()?;
        Ok(config)
    }

    /// Add or replace a tier
    pub fn with_tier(mut self, name: &str, tier: TierConfig) -> Self {
        self.tiers.insert(to_id(name), tier);
        self
    }

    /// Settings for a tier id, also matching keys that were inserted unsanitized
    pub fn tier(&self, id: &str) -> Option<&TierConfig> {
        self.tiers.get(id).or_else(|| {
            self.tiers
                .iter()
                .find(|(name, _)| to_id(name) == id)
                .map(|(_, tier)| tier)
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ValidationError(
                "workers must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "fetch timeout must be greater than 0".to_string(),
            ));
        }

        if self.tiers.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one tier must be configured".to_string(),
            ));
        }

        for (tier, settings) in &self.tiers {
            settings
                .weighting
                .validate()
                .map_err(|error| ConfigError::WeightingError {
                    tier: tier.clone(),
                    error,
                })?;
        }

        Ok(())
    }
}
