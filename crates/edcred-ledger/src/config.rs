use std::sync::Arc;

use edcred_types::{Clock, ManualClock, SystemClock, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Construction-time settings for a [`crate::CredentialRegistry`].
///
/// Ledgers always start empty with every id counter at 1; the only knob is
/// where the assessment and certificate ledgers read the time from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub clock: ClockConfig,
}

/// Time source shared by the time-aware ledgers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClockConfig {
    /// The process wall clock.
    #[default]
    System,
    /// A frozen instant, for reproducible runs.
    Fixed { now_ms: u64 },
}

impl RegistryConfig {
    /// A configuration whose clock is frozen at `now`.
    pub fn fixed_at(now: Timestamp) -> Self {
        Self {
            clock: ClockConfig::Fixed {
                now_ms: now.as_millis(),
            },
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn build_clock(&self) -> Arc<dyn Clock> {
        match self.clock {
            ClockConfig::System => Arc::new(SystemClock),
            ClockConfig::Fixed { now_ms } => {
                Arc::new(ManualClock::new(Timestamp::from_millis(now_ms)))
            }
        }
    }
}
