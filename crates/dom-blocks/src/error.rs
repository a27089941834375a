//! Error types for block logic

use dom_core::EventType;
use dom_hardware::ChannelFault;
use thiserror::Error;

/// Result type for block operations
pub type BlockResult<T> = Result<T, BlockError>;

/// Errors raised by block logic during a tick
///
/// Block errors are never swallowed by the dispatcher: they abort the tick,
/// because a half-applied physical command is worse than a stopped loop.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BlockError {
    /// Hardware link failure while reading or writing a channel
    #[error(transparent)]
    Channel(#[from] ChannelFault),

    /// An event reached a block that does not handle it
    #[error("block '{block}' cannot handle event '{event}'")]
    UnsupportedEvent { block: String, event: EventType },

    /// Block-internal inconsistency
    #[error("block '{block}': {reason}")]
    Logic { block: String, reason: String },
}
