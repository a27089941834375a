//! Dimmable lamp on one analog output, driven by a linear ramp

use dom_core::{ConfigurationError, ConfigurationResult, EventType, RememberedOutput, UiState};
use dom_hardware::{Channel, HardwareIo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timing::{Ramp, RampDirection};
use crate::{
    Actuator, Block, BlockCategory, BlockContext, BlockError, BlockInfo, BlockResult,
    EventListener, Tickable, UiExposable,
};

const ACCEPTED: &[EventType] = &[
    EventType::On,
    EventType::Off,
    EventType::Toggle,
    EventType::Up,
    EventType::Down,
    EventType::Stop,
    EventType::Full,
];

fn default_full_scale() -> i32 {
    1024
}

fn default_full_dim_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimmedLampSettings {
    /// Output value at full brightness
    #[serde(default = "default_full_scale")]
    pub full_scale: i32,
    /// Time for a ramp to sweep from dark to full brightness
    #[serde(default = "default_full_dim_ms")]
    pub full_dim_ms: u64,
}

impl DimmedLampSettings {
    pub fn validate(&self, block: &str) -> ConfigurationResult<()> {
        if self.full_scale <= 0 {
            return Err(ConfigurationError::InvalidValue {
                block: block.to_string(),
                key: "full_scale".to_string(),
                reason: format!("{} is not a positive output value", self.full_scale),
            });
        }
        Ok(())
    }
}

impl Default for DimmedLampSettings {
    fn default() -> Self {
        Self {
            full_scale: default_full_scale(),
            full_dim_ms: default_full_dim_ms(),
        }
    }
}

pub struct DimmedLamp {
    info: BlockInfo,
    channel: Channel,
    ramp: Ramp,
    /// Level restored by ON or TOGGLE after an OFF
    on_level: i32,
    written: Option<i32>,
}

impl DimmedLamp {
    pub fn new(info: BlockInfo, channel: Channel, settings: DimmedLampSettings) -> Self {
        let half = settings.full_scale / 2;
        Self {
            info,
            channel,
            ramp: Ramp::new(settings.full_scale, settings.full_dim_ms, half),
            on_level: half,
            written: None,
        }
    }

    pub fn level(&self) -> i32 {
        self.ramp.value()
    }

    pub fn full_scale(&self) -> i32 {
        self.ramp.full_scale()
    }

    pub fn is_on(&self) -> bool {
        self.ramp.value() > 0
    }

    /// Jump to a level; zero switches the lamp off
    pub fn on(&mut self, level: i32) {
        if level <= 0 {
            self.off();
        } else {
            self.ramp.set(level);
        }
    }

    pub fn off(&mut self) {
        if self.ramp.value() > 0 {
            self.on_level = self.ramp.value();
        }
        self.ramp.set(0);
    }
}

impl Tickable for DimmedLamp {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        self.ramp.update(ctx.now());
        let level = self.ramp.value();
        if !self.ramp.is_moving() && level > 0 {
            self.on_level = level;
        }
        if self.written != Some(level) {
            ctx.write_analog_output(&self.channel, level)?;
            self.written = Some(level);
        }
        Ok(())
    }
}

impl EventListener for DimmedLamp {
    fn on_event(&mut self, event: EventType, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        match event {
            EventType::On => {
                if !self.is_on() {
                    self.ramp.set(self.on_level);
                }
            }
            EventType::Off => self.off(),
            EventType::Toggle => {
                if self.is_on() {
                    self.off();
                } else {
                    self.ramp.set(self.on_level);
                }
            }
            EventType::Up => self.ramp.start(RampDirection::Up, ctx.now()),
            EventType::Down => self.ramp.start(RampDirection::Down, ctx.now()),
            EventType::Stop => {
                self.ramp.update(ctx.now());
                self.ramp.stop();
            }
            EventType::Full => self.ramp.set(self.ramp.full_scale()),
            other => {
                return Err(BlockError::UnsupportedEvent {
                    block: self.info.name.to_string(),
                    event: other,
                })
            }
        }
        debug!(block = %self.info.name, event = %event, level = self.ramp.value(), "Dimmer command");
        Ok(())
    }
}

impl Actuator for DimmedLamp {
    fn dump_output(&self) -> RememberedOutput {
        RememberedOutput::new(
            self.info.name.as_str(),
            vec![self.ramp.value(), self.on_level],
        )
    }

    fn initialize_output(
        &mut self,
        remembered: Option<&RememberedOutput>,
        hw: &mut dyn HardwareIo,
    ) -> BlockResult<()> {
        let half = self.ramp.full_scale() / 2;
        let level = remembered.and_then(|r| r.value(0)).unwrap_or(half);
        self.ramp.set(level);
        self.on_level = remembered
            .and_then(|r| r.value(1))
            .unwrap_or(half)
            .clamp(0, self.ramp.full_scale());
        hw.write_analog_output(&self.channel, self.ramp.value())?;
        self.written = Some(self.ramp.value());
        Ok(())
    }
}

impl UiExposable for DimmedLamp {
    fn ui_state(&self) -> UiState {
        UiState::new(
            self.info.name.as_str(),
            "dimmed_lamp",
            &self.info.description,
            if self.is_on() { "on" } else { "off" },
        )
        .with_attribute("level", self.ramp.value())
        .with_attribute("full_scale", self.ramp.full_scale())
    }
}

impl Block for DimmedLamp {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Actuator
    }

    fn block_type(&self) -> &'static str {
        "dimmed_lamp"
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
