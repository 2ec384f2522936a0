use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Policy for a canonical slot that no scraped time mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSlotPolicy {
    /// Fill the slot with the schedule's default duration (completeness-first).
    FillDefault,
    /// Leave the slot out and emit fewer than 16 events (fidelity-first).
    Omit,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Upper bound on athletes processed in a single run.
    pub max_athletes: usize,
    /// Per-request timeout, seconds.
    pub timeout_seconds: u64,
    /// Mandatory pause between successive athlete detail fetches, milliseconds.
    pub delay_ms: u64,
    /// Attempts per URL before giving up.
    pub retry_attempts: u32,
    /// Backoff grows as attempt * retry_base_delay_ms.
    pub retry_base_delay_ms: u64,
    pub missing_slot_policy: MissingSlotPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_athletes: 50,
            timeout_seconds: 30,
            delay_ms: 2000,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
            missing_slot_policy: MissingSlotPolicy::FillDefault,
        }
    }
}

impl ScraperConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ScraperError::Config(format!("Failed to read config file '{path}': {e}")))?;
        let config: ScraperConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config file if present, otherwise falls back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!("No config file at {path}, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.retry_attempts == 0 {
            return Err(ScraperError::Config(
                "retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_athletes == 0 {
            return Err(ScraperError::Config(
                "max_athletes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = ScraperConfig::default();
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.missing_slot_policy, MissingSlotPolicy::FillDefault);
    }

    #[test]
    fn loads_partial_config_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_athletes = 5\nmissing_slot_policy = \"omit\"").unwrap();

        let config = ScraperConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.max_athletes, 5);
        assert_eq!(config.missing_slot_policy, MissingSlotPolicy::Omit);
        // untouched fields keep their defaults
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn rejects_zero_retries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retry_attempts = 0").unwrap();

        assert!(ScraperConfig::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ScraperConfig::load_or_default("/nonexistent/config.toml").unwrap();
        assert_eq!(config.max_athletes, 50);
    }
}
