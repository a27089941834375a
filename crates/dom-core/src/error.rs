//! Error type for wiring and registration problems

use thiserror::Error;

use crate::{BlockNameError, EventType, UnknownEventAlias};

/// Result type for configuration and wiring operations
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Errors detected while building the block graph
///
/// All of these are fatal at startup: the runtime refuses to tick with a graph
/// that silently dropped part of its configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Two blocks were registered under the same name
    #[error("block '{name}' is already registered")]
    DuplicateBlock { name: String },

    /// A wiring entry references a block that was never registered
    #[error("unknown block '{name}' referenced by {context}")]
    UnknownBlock { name: String, context: String },

    /// A wiring entry targets a block that does not react to events
    #[error("block '{name}' cannot receive event '{event}'")]
    NotAListener { name: String, event: EventType },

    /// Invalid block name
    #[error("invalid block name '{name}': {source}")]
    InvalidName {
        name: String,
        #[source]
        source: BlockNameError,
    },

    /// Unknown event alias in wiring
    #[error(transparent)]
    UnknownEvent(#[from] UnknownEventAlias),

    /// Invalid parameter on a block
    #[error("invalid value for '{key}' on block '{block}': {reason}")]
    InvalidValue {
        block: String,
        key: String,
        reason: String,
    },
}
