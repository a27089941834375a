//! Block name type, the unique key of a block within one runtime

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::MAX_BLOCK_NAME_LENGTH;

/// Error type for invalid block names
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlockNameError {
    #[error("block name cannot be empty")]
    Empty,

    #[error("block name exceeds 64 characters")]
    TooLong,

    #[error(
        "block name contains invalid characters (must be ASCII alphanumeric, '_', '-' or '.')"
    )]
    InvalidChars,
}

/// Name of a block (e.g., "SwitchKitchen", "lamp_living")
///
/// Names are stable for the lifetime of the process: they key the remembered
/// output snapshot and the UI state, so they must survive a restart unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockName(String);

impl BlockName {
    /// Create a new block name, validating its characters
    pub fn new(name: impl Into<String>) -> Result<Self, BlockNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BlockNameError::Empty);
        }
        if name.len() > MAX_BLOCK_NAME_LENGTH {
            return Err(BlockNameError::TooLong);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(BlockNameError::InvalidChars);
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BlockName {
    type Err = BlockNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BlockName {
    type Error = BlockNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BlockName> for String {
    fn from(name: BlockName) -> String {
        name.0
    }
}

impl Borrow<str> for BlockName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BlockName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
