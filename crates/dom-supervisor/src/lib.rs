//! Supervision of the hardware driver process and the tick loop
//!
//! The [`Supervisor`] spawns the driver, waits for its readiness line,
//! restores the remembered outputs, starts the tick loop, and then checks
//! every monitoring interval that the driver is alive and the loop sequence
//! keeps advancing. A failed check tears everything down and starts over
//! after a backoff.

mod driver;
mod health;
mod settings;
mod state;
mod supervisor;

pub use driver::{
    DriverEvent, DriverLauncher, DriverProcess, LaunchedDriver, SubprocessLauncher,
    UnmanagedLauncher,
};
pub use health::{Health, HealthReport};
pub use settings::SupervisorSettings;
pub use state::{InvalidTransition, SupervisorState, Transition};
pub use supervisor::{Supervisor, SupervisorHandle};

use dom_runtime::RuntimeError;
use dom_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("cannot start driver {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("supervisor task ended abnormally: {0}")]
    Join(String),
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;
