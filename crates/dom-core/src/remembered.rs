//! Last-known actuator output, used for continuity across restarts

use serde::{Deserialize, Serialize};

/// Serialized last-known output of one actuator
///
/// Binary actuators store a single value, multi-channel or stateful actuators
/// store as many values as they need. The meaning of each value is private to
/// the actuator kind that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedOutput {
    /// Name of the actuator this output belongs to
    pub block_name: String,
    /// Ordered output values
    pub values: Vec<i32>,
}

impl RememberedOutput {
    /// Create a remembered output
    pub fn new(block_name: impl Into<String>, values: Vec<i32>) -> Self {
        Self {
            block_name: block_name.into(),
            values,
        }
    }

    /// Get the value at a position, if present
    pub fn value(&self, index: usize) -> Option<i32> {
        self.values.get(index).copied()
    }

    /// Interpret the value at a position as a boolean (non-zero is true)
    pub fn flag(&self, index: usize) -> Option<bool> {
        self.value(index).map(|v| v != 0)
    }
}
