//! Two-threshold gate with settle delays
//!
//! Used by analog sensors (light, wind) to turn a noisy measurement into a
//! stable high/low level.

use chrono::{DateTime, Local};
use dom_core::{ConfigurationError, ConfigurationResult};
use serde::{Deserialize, Serialize};

use crate::elapsed_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

/// Thresholds and settle delays of a [`HysteresisGate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HysteresisSettings {
    /// Going from high to low requires a value strictly below this
    pub low_threshold: i32,
    /// Going from low to high requires a value strictly above this
    pub high_threshold: i32,
    /// How long the value must stay above the high threshold
    #[serde(default)]
    pub low_to_high_ms: u64,
    /// How long the value must stay below the low threshold
    #[serde(default)]
    pub high_to_low_ms: u64,
}

impl HysteresisSettings {
    pub fn validate(&self, block: &str) -> ConfigurationResult<()> {
        if self.low_threshold > self.high_threshold {
            return Err(ConfigurationError::InvalidValue {
                block: block.to_string(),
                key: "low_threshold".to_string(),
                reason: format!(
                    "{} is above high_threshold {}",
                    self.low_threshold, self.high_threshold
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HysteresisGate {
    settings: HysteresisSettings,
    level: Level,
    candidate: Level,
    candidate_since: Option<DateTime<Local>>,
    last_value: Option<i32>,
}

impl HysteresisGate {
    pub fn new(settings: HysteresisSettings) -> Self {
        Self {
            settings,
            level: Level::Low,
            candidate: Level::Low,
            candidate_since: None,
            last_value: None,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn last_value(&self) -> Option<i32> {
        self.last_value
    }

    pub fn settings(&self) -> &HysteresisSettings {
        &self.settings
    }

    /// Feed one measurement; returns the new level when it flips
    ///
    /// A value that falls back inside the band cancels a pending flip, so the
    /// settle delay restarts on the next crossing.
    pub fn update(&mut self, value: i32, now: DateTime<Local>) -> Option<Level> {
        self.last_value = Some(value);

        let candidate = match self.level {
            Level::Low if value > self.settings.high_threshold => Level::High,
            Level::High if value < self.settings.low_threshold => Level::Low,
            current => current,
        };

        if candidate == self.level {
            self.candidate = candidate;
            self.candidate_since = None;
            return None;
        }

        let since = match self.candidate_since {
            Some(since) if self.candidate == candidate => since,
            _ => {
                self.candidate = candidate;
                self.candidate_since = Some(now);
                now
            }
        };

        let settle_ms = match candidate {
            Level::High => self.settings.low_to_high_ms,
            Level::Low => self.settings.high_to_low_ms,
        };

        if elapsed_ms(since, now) >= settle_ms as i64 {
            self.level = candidate;
            self.candidate_since = None;
            Some(candidate)
        } else {
            None
        }
    }
}
