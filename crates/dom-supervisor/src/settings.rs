//! Supervisor tuning

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::driver::{DriverLauncher, SubprocessLauncher, UnmanagedLauncher};

fn default_ready_line() -> String {
    "DRIVER READY".to_string()
}

fn default_monitoring_interval_ms() -> u64 {
    5000
}

fn default_readiness_poll_ms() -> u64 {
    200
}

fn default_readiness_attempts() -> u32 {
    25
}

fn default_stop_grace_ms() -> u64 {
    500
}

fn default_restart_backoff_ms() -> u64 {
    30_000
}

fn default_restart_on_failure() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorSettings {
    /// Driver executable; without one the driver is assumed to be managed
    /// elsewhere and only the tick loop is supervised
    #[serde(default)]
    pub driver_path: Option<PathBuf>,
    /// Exact stdout line the driver prints once it accepts connections
    #[serde(default = "default_ready_line")]
    pub ready_line: String,
    #[serde(default = "default_monitoring_interval_ms")]
    pub monitoring_interval_ms: u64,
    #[serde(default = "default_readiness_poll_ms")]
    pub readiness_poll_ms: u64,
    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,
    /// Time the driver gets to exit after the stop command before it is killed
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    #[serde(default = "default_restart_backoff_ms")]
    pub restart_backoff_ms: u64,
    /// When false a failed check is only logged
    #[serde(default = "default_restart_on_failure")]
    pub restart_on_failure: bool,
}

impl SupervisorSettings {
    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring_interval_ms)
    }

    pub fn readiness_poll(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn restart_backoff(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_ms)
    }

    /// Launcher matching `driver_path`
    pub fn launcher(&self) -> Arc<dyn DriverLauncher> {
        match &self.driver_path {
            Some(path) => Arc::new(SubprocessLauncher::new(path, self.ready_line.clone())),
            None => Arc::new(UnmanagedLauncher),
        }
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            driver_path: None,
            ready_line: default_ready_line(),
            monitoring_interval_ms: default_monitoring_interval_ms(),
            readiness_poll_ms: default_readiness_poll_ms(),
            readiness_attempts: default_readiness_attempts(),
            stop_grace_ms: default_stop_grace_ms(),
            restart_backoff_ms: default_restart_backoff_ms(),
            restart_on_failure: default_restart_on_failure(),
        }
    }
}
