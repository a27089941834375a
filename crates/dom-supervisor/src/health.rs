//! Health report produced by every monitoring check

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Health {
    Healthy,
    DriverExited,
    /// The loop sequence did not advance since the previous check
    LoopStalled,
    /// The tick loop hit a hardware fault and asked for a restart
    RestartRequested,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Healthy => "healthy",
            Self::DriverExited => "driver process exited",
            Self::LoopStalled => "tick loop stalled",
            Self::RestartRequested => "restart requested by tick loop",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub checked_at: DateTime<Local>,
    pub loop_sequence: u64,
    /// Sequence seen at the previous check; `None` on the first check
    pub previous_sequence: Option<u64>,
    pub driver_alive: bool,
    pub restart_requested: bool,
}

impl HealthReport {
    pub fn verdict(&self) -> Health {
        if !self.driver_alive {
            return Health::DriverExited;
        }
        if self.restart_requested {
            return Health::RestartRequested;
        }
        match self.previous_sequence {
            Some(previous) if self.loop_sequence <= previous => Health::LoopStalled,
            _ => Health::Healthy,
        }
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loop_sequence={} previous={} driver={} restart_requested={} verdict={}",
            self.loop_sequence,
            self.previous_sequence
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            if self.driver_alive { "alive" } else { "dead" },
            self.restart_requested,
            self.verdict()
        )
    }
}
