//! Runtime and scheduler tuning

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_notify_every() -> u64 {
    10
}

fn default_max_dispatch_depth() -> usize {
    32
}

fn default_tick_period_ms() -> u64 {
    50
}

fn default_join_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// UI listeners are notified every this many ticks
    #[serde(default = "default_notify_every")]
    pub notify_every: u64,
    /// Longest event chain a single emission may trigger
    #[serde(default = "default_max_dispatch_depth")]
    pub max_dispatch_depth: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            notify_every: default_notify_every(),
            max_dispatch_depth: default_max_dispatch_depth(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Pause between the end of one tick and the start of the next
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// How long `stop` waits for the tick thread to exit
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl SchedulerSettings {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}
