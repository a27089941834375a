//! Runtime error types

use dom_blocks::BlockError;
use dom_core::{ConfigurationError, EventType};
use dom_hardware::ChannelFault;
use thiserror::Error;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Hardware link failure outside of any block
    #[error(transparent)]
    Channel(#[from] ChannelFault),

    /// A block's tick or event handler failed
    #[error("block '{block}' failed: {source}")]
    Block {
        block: String,
        #[source]
        source: BlockError,
    },

    /// Event chain deeper than the configured limit, most likely a wiring cycle
    #[error("dispatch depth {depth} exceeded delivering '{event}' to block '{block}'")]
    DispatchDepth {
        depth: usize,
        block: String,
        event: EventType,
    },

    /// A UI action names an action its block does not handle
    #[error("block '{block}' does not support action '{action}'")]
    UnsupportedAction { block: String, action: String },

    #[error("scheduler is already running")]
    SchedulerRunning,

    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("runtime state lock poisoned")]
    Poisoned,
}

impl RuntimeError {
    /// Whether this error means the hardware link is down
    pub fn is_channel_fault(&self) -> bool {
        matches!(
            self,
            Self::Channel(_)
                | Self::Block {
                    source: BlockError::Channel(_),
                    ..
                }
        )
    }
}
