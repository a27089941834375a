//! Supervisor state machine
//!
//! ```text
//! Starting → Ready → Monitoring → Failed → Starting (after backoff)
//!    ↘ Stopped (driver cannot be spawned)
//!
//! Starting/Ready/Monitoring/Failed → Stopping → Stopped
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SupervisorState {
    /// Spawning the driver and waiting for its readiness signal
    Starting,
    /// Driver up; restoring outputs and starting the tick loop
    Ready,
    /// Periodic liveness and heartbeat checks
    Monitoring,
    /// Tearing down after a failed check; restarts after the backoff
    Failed,
    /// External stop: tearing down without restart
    Stopping,
    Stopped,
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid supervisor transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: SupervisorState,
    pub to: SupervisorState,
}

/// One accepted transition, as published to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SupervisorState,
    pub to: SupervisorState,
}

impl SupervisorState {
    /// Attempt a transition to a new state
    pub fn try_transition(self, to: SupervisorState) -> Result<SupervisorState, InvalidTransition> {
        use SupervisorState::*;

        let valid = match (self, to) {
            (Starting, Ready) => true,
            (Starting, Failed) => true,
            // the driver executable cannot be started at all
            (Starting, Stopped) => true,

            (Ready, Monitoring) => true,
            (Ready, Failed) => true,

            (Monitoring, Failed) => true,

            (Failed, Starting) => true,

            (Starting | Ready | Monitoring | Failed, Stopping) => true,
            (Stopping, Stopped) => true,

            (Stopped, _) => false,
            _ => false,
        };

        if valid {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    pub fn can_transition_to(self, to: SupervisorState) -> bool {
        self.try_transition(to).is_ok()
    }

    pub fn is_terminal(self) -> bool {
        self == SupervisorState::Stopped
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "STARTING",
            Self::Ready => "READY",
            Self::Monitoring => "MONITORING",
            Self::Failed => "FAILED",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}
