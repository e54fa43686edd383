//! Configuration management for chatpulse
//!
//! Loads the TOML configuration, applies `CHATPULSE_SECTION__KEY` environment
//! overrides and validates the result. Every cap and truncation length used
//! by the engine is configured here; the keyword taxonomy itself lives in a
//! separate file (see [`crate::taxonomy`]).

use crate::error::{PulseError, Result};
use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyFileConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Caps and truncation lengths for every bounded output list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub top_contributors: usize,
    pub top_words: usize,
    pub topic_examples: usize,
    pub theme_examples: usize,
    pub sentiment_examples: usize,
    pub staff_examples: usize,
    /// Characters kept for topic, theme and sentiment examples
    pub example_chars: usize,
    /// Characters kept for prioritized questions
    pub question_chars: usize,
    /// Characters kept for staff message samples
    pub staff_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            top_contributors: 10,
            top_words: 50,
            topic_examples: 15,
            theme_examples: 5,
            sentiment_examples: 30,
            staff_examples: 50,
            example_chars: 250,
            question_chars: 300,
            staff_chars: 200,
        }
    }
}

/// Sampling sizes and summarizer payload shaping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Records kept for the dashboard sample
    pub dashboard_max: usize,
    /// Records kept for the summarizer payload
    pub summary_max: usize,
    /// Characters of message text per payload line
    pub line_chars: usize,
    /// Characters of the whole joined message block
    pub block_chars: usize,
    /// Characters of message text per payload question
    pub question_chars: usize,
    /// Questions included in the payload
    pub question_head: usize,
    /// Characters of each message scanned for common words
    pub word_prefix_chars: usize,
    /// Words must occur more than this many times to be reported
    pub word_min_count: u64,
    /// Common words included in the payload
    pub word_head: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            dashboard_max: 4000,
            summary_max: 2500,
            line_chars: 250,
            block_chars: 25_000,
            question_chars: 200,
            question_head: 40,
            word_prefix_chars: 200,
            word_min_count: 3,
            word_head: 30,
        }
    }
}

/// Location of a custom taxonomy file; the built-in taxonomy is used if unset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PulseError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PulseError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| PulseError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load the configured taxonomy, falling back to the built-in one
    pub fn load_taxonomy(&self) -> Result<Taxonomy> {
        match &self.taxonomy.file {
            Some(path) => {
                tracing::debug!("Loading taxonomy from {:?}", path);
                Taxonomy::from_file(path)
            }
            None => Taxonomy::builtin(),
        }
    }

    /// Apply environment variable overrides
    /// Environment variables in format: CHATPULSE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("CHATPULSE_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SAMPLING__DASHBOARD_MAX" => self.sampling.dashboard_max = parse_value(path, value)?,
            "SAMPLING__SUMMARY_MAX" => self.sampling.summary_max = parse_value(path, value)?,
            "SAMPLING__QUESTION_HEAD" => self.sampling.question_head = parse_value(path, value)?,
            "LIMITS__TOP_WORDS" => self.limits.top_words = parse_value(path, value)?,
            "LIMITS__TOP_CONTRIBUTORS" => {
                self.limits.top_contributors = parse_value(path, value)?
            }
            "TAXONOMY__FILE" => self.taxonomy.file = Some(PathBuf::from(value)),
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PulseError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("chatpulse").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| PulseError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
            },
            limits: LimitsConfig::default(),
            sampling: SamplingConfig::default(),
            taxonomy: TaxonomyFileConfig::default(),
        }
    }
}
