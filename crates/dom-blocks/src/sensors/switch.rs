//! Push button reporting single, double and long clicks

use dom_core::EventType;
use dom_hardware::Channel;
use tracing::debug;

use crate::timing::{ClickClassifier, ClickSettings};
use crate::{Block, BlockCategory, BlockContext, BlockInfo, BlockResult, Tickable};

pub struct Switch {
    info: BlockInfo,
    channel: Channel,
    classifier: ClickClassifier,
    last_click: Option<EventType>,
}

impl Switch {
    pub fn new(info: BlockInfo, channel: Channel, settings: ClickSettings) -> Self {
        Self {
            info,
            channel,
            classifier: ClickClassifier::new(settings),
            last_click: None,
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Most recent click reported by this switch
    pub fn last_click(&self) -> Option<EventType> {
        self.last_click
    }
}

impl Tickable for Switch {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        let pressed = ctx.read_digital_input(&self.channel)?;
        if let Some(click) = self.classifier.update(pressed, ctx.now()) {
            debug!(block = %self.info.name, event = %click, "Switch clicked");
            self.last_click = Some(click);
            ctx.emit(click);
        }
        Ok(())
    }
}

impl Block for Switch {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Sensor
    }

    fn block_type(&self) -> &'static str {
        "switch"
    }
}
