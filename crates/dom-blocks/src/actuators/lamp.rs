//! On/off lamp on one digital output

use dom_core::{EventType, RememberedOutput, UiState};
use dom_hardware::{Channel, HardwareIo};
use tracing::debug;

use crate::{
    Actuator, Block, BlockCategory, BlockContext, BlockError, BlockInfo, BlockResult,
    EventListener, Tickable, UiExposable,
};

const ACCEPTED: &[EventType] = &[EventType::On, EventType::Off, EventType::Toggle];

pub struct Lamp {
    info: BlockInfo,
    channel: Channel,
    on: bool,
    written: Option<bool>,
}

impl Lamp {
    pub fn new(info: BlockInfo, channel: Channel) -> Self {
        Self {
            info,
            channel,
            on: false,
            written: None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Tickable for Lamp {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        if self.written != Some(self.on) {
            ctx.write_digital_output(&self.channel, self.on)?;
            self.written = Some(self.on);
        }
        Ok(())
    }
}

impl EventListener for Lamp {
    fn on_event(&mut self, event: EventType, _ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        self.on = match event {
            EventType::On => true,
            EventType::Off => false,
            EventType::Toggle => !self.on,
            other => {
                return Err(BlockError::UnsupportedEvent {
                    block: self.info.name.to_string(),
                    event: other,
                })
            }
        };
        debug!(block = %self.info.name, on = self.on, "Lamp switched");
        Ok(())
    }
}

impl Actuator for Lamp {
    fn dump_output(&self) -> RememberedOutput {
        RememberedOutput::new(self.info.name.as_str(), vec![i32::from(self.on)])
    }

    fn initialize_output(
        &mut self,
        remembered: Option<&RememberedOutput>,
        hw: &mut dyn HardwareIo,
    ) -> BlockResult<()> {
        self.on = remembered.and_then(|r| r.flag(0)).unwrap_or(false);
        hw.write_digital_output(&self.channel, self.on)?;
        self.written = Some(self.on);
        Ok(())
    }
}

impl UiExposable for Lamp {
    fn ui_state(&self) -> UiState {
        UiState::new(
            self.info.name.as_str(),
            "lamp",
            &self.info.description,
            if self.on { "on" } else { "off" },
        )
    }
}

impl Block for Lamp {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Actuator
    }

    fn block_type(&self) -> &'static str {
        "lamp"
    }

    fn accepted_events(&self) -> &'static [EventType] {
        ACCEPTED
    }

    fn as_listener(&mut self) -> Option<&mut dyn EventListener> {
        Some(self)
    }

    fn as_actuator(&self) -> Option<&dyn Actuator> {
        Some(self)
    }

    fn as_actuator_mut(&mut self) -> Option<&mut dyn Actuator> {
        Some(self)
    }

    fn as_ui(&self) -> Option<&dyn UiExposable> {
        Some(self)
    }
}
