//! Connectors: directed wiring from a source event to a target block

use std::fmt;

use crate::EventType;

/// Stable index of a block inside a runtime's block arena
///
/// Indices are assigned at registration time and never change afterwards,
/// so connectors can address their target without owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockIndex(usize);

impl BlockIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Wiring from a source block's emitted event to a target block's reaction
///
/// When the source emits `source_event`, the target receives `target_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    /// Event emitted by the source block that fires this connector
    pub source_event: EventType,
    /// Block receiving the event, resolved at wiring time
    pub target: BlockIndex,
    /// Event delivered to the target
    pub target_event: EventType,
    /// Diagnostic label, only used in logs
    pub label: String,
}

impl Connector {
    /// Create a new connector
    pub fn new(
        source_event: EventType,
        target: BlockIndex,
        target_event: EventType,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source_event,
            target,
            target_event,
            label: label.into(),
        }
    }

    /// Whether this connector fires for the given emitted event
    pub fn matches(&self, event: EventType) -> bool {
        self.source_event == event
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {}:{})",
            self.label, self.source_event, self.target, self.target_event
        )
    }
}
