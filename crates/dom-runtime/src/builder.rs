//! Registration and wiring of blocks into a runtime

use dom_blocks::Block;
use dom_core::{BlockIndex, BlockName, ConfigurationError, ConfigurationResult, Connector, EventType};
use dom_hardware::HardwareIo;
use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::runtime::Runtime;
use crate::RuntimeSettings;

/// Collects blocks and connectors, then freezes them into a [`Runtime`]
///
/// Registration order is evaluation order within each block category.
pub struct RuntimeBuilder {
    settings: RuntimeSettings,
    pub(crate) blocks: Vec<Box<dyn Block>>,
    pub(crate) names: IndexMap<BlockName, BlockIndex>,
    /// Outgoing connectors per source block, in wiring order
    pub(crate) connectors: Vec<Vec<Connector>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::with_settings(RuntimeSettings::default())
    }

    pub fn with_settings(settings: RuntimeSettings) -> Self {
        Self {
            settings,
            blocks: Vec::new(),
            names: IndexMap::new(),
            connectors: Vec::new(),
        }
    }

    /// Register a block; names must be unique
    #[instrument(skip_all, fields(block = %block.name(), kind = block.block_type()))]
    pub fn register(&mut self, block: Box<dyn Block>) -> ConfigurationResult<BlockIndex> {
        let name = block.name().clone();
        if self.names.contains_key(&name) {
            return Err(ConfigurationError::DuplicateBlock {
                name: name.to_string(),
            });
        }
        let index = BlockIndex::new(self.blocks.len());
        debug!(index = %index, category = %block.category(), "Registered block");
        self.blocks.push(block);
        self.connectors.push(Vec::new());
        self.names.insert(name, index);
        Ok(index)
    }

    pub fn add<B: Block + 'static>(&mut self, block: B) -> ConfigurationResult<BlockIndex> {
        self.register(Box::new(block))
    }

    pub fn index_of(&self, name: &str) -> Option<BlockIndex> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn resolve(&self, name: &str, context: &str) -> ConfigurationResult<BlockIndex> {
        self.index_of(name)
            .ok_or_else(|| ConfigurationError::UnknownBlock {
                name: name.to_string(),
                context: context.to_string(),
            })
    }

    /// Wire `source_event` of `source` to `target_event` on `target`
    ///
    /// Connectors sharing a source fire in the order they were added.
    pub fn connect(
        &mut self,
        source: &str,
        source_event: EventType,
        target: &str,
        target_event: EventType,
        label: impl Into<String>,
    ) -> ConfigurationResult<()> {
        let source_index = self.resolve(source, "connector source")?;
        let target_index = self.resolve(target, "connector target")?;

        let target_block = &self.blocks[target_index.get()];
        if !target_block.accepts(target_event) {
            return Err(ConfigurationError::NotAListener {
                name: target.to_string(),
                event: target_event,
            });
        }

        let connector = Connector::new(source_event, target_index, target_event, label);
        debug!(source, connector = %connector, "Wired connector");
        self.connectors[source_index.get()].push(connector);
        Ok(())
    }

    /// Freeze the graph; wiring can no longer change afterwards
    pub fn build(self, hw: Box<dyn HardwareIo>) -> Runtime {
        Runtime::from_parts(self.settings, self.blocks, self.names, self.connectors, hw)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
