//! Display state of UI-capable blocks

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display state of one block, as pushed to UI clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    /// Block name
    pub name: String,
    /// Block kind (e.g., "lamp", "dimmed_lamp")
    pub block_type: String,
    /// Human-readable description
    pub description: String,
    /// Primary state value (e.g., "on", "off", "up")
    pub state: String,
    /// Additional parameters (level, position, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl UiState {
    /// Create a display state without attributes
    pub fn new(
        name: impl Into<String>,
        block_type: impl Into<String>,
        description: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            block_type: block_type.into(),
            description: description.into(),
            state: state.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get an attribute value by key
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
