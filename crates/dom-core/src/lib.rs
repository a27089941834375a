//! Core types for the domotic runtime
//!
//! This crate provides the vocabulary shared by every other crate in the
//! workspace: block names, the closed set of semantic events exchanged between
//! blocks, connectors (the wiring between blocks), remembered actuator outputs
//! and the display state handed to UI clients.

mod block_name;
mod connector;
mod error;
mod event;
mod remembered;
mod ui;

pub use block_name::{BlockName, BlockNameError};
pub use connector::{BlockIndex, Connector};
pub use error::{ConfigurationError, ConfigurationResult};
pub use event::{EventType, UnknownEventAlias};
pub use remembered::RememberedOutput;
pub use ui::UiState;

/// Maximum length of a block name
pub const MAX_BLOCK_NAME_LENGTH: usize = 64;
