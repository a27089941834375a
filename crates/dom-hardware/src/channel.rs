//! Logical hardware channel identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical channel on the hardware boards (e.g., "0", "10", "kitchenUp")
///
/// The transport maps logical channels onto board/channel pairs; blocks only
/// ever see the logical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Channel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u32> for Channel {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
