//! Analog threshold sensors (light intensity, wind frequency)

use dom_core::{ConfigurationResult, EventType, UiState};
use dom_hardware::Channel;
use tracing::info;

use crate::timing::{HysteresisGate, HysteresisSettings, Level};
use crate::{Block, BlockCategory, BlockContext, BlockInfo, BlockResult, Tickable, UiExposable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    Light,
    Wind,
}

impl ThresholdKind {
    fn event(self, level: Level) -> EventType {
        match (self, level) {
            (Self::Light, Level::High) => EventType::LightHigh,
            (Self::Light, Level::Low) => EventType::LightLow,
            (Self::Wind, Level::High) => EventType::WindHigh,
            (Self::Wind, Level::Low) => EventType::WindLow,
        }
    }

    fn block_type(self) -> &'static str {
        match self {
            Self::Light => "light_sensor",
            Self::Wind => "wind_sensor",
        }
    }
}

/// Hysteresis-gated sensor over one analog input
pub struct ThresholdSensor {
    info: BlockInfo,
    kind: ThresholdKind,
    channel: Channel,
    gate: HysteresisGate,
}

impl ThresholdSensor {
    pub fn new(
        info: BlockInfo,
        kind: ThresholdKind,
        channel: Channel,
        settings: HysteresisSettings,
    ) -> ConfigurationResult<Self> {
        settings.validate(info.name.as_str())?;
        Ok(Self {
            info,
            kind,
            channel,
            gate: HysteresisGate::new(settings),
        })
    }

    pub fn light(
        info: BlockInfo,
        channel: Channel,
        settings: HysteresisSettings,
    ) -> ConfigurationResult<Self> {
        Self::new(info, ThresholdKind::Light, channel, settings)
    }

    pub fn wind(
        info: BlockInfo,
        channel: Channel,
        settings: HysteresisSettings,
    ) -> ConfigurationResult<Self> {
        Self::new(info, ThresholdKind::Wind, channel, settings)
    }

    pub fn kind(&self) -> ThresholdKind {
        self.kind
    }

    pub fn level(&self) -> Level {
        self.gate.level()
    }
}

impl Tickable for ThresholdSensor {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        let value = ctx.read_analog_input(&self.channel)?;
        if let Some(level) = self.gate.update(value, ctx.now()) {
            let event = self.kind.event(level);
            info!(block = %self.info.name, value, event = %event, "Threshold level changed");
            ctx.emit(event);
        }
        Ok(())
    }
}

impl UiExposable for ThresholdSensor {
    fn ui_state(&self) -> UiState {
        let level = match self.gate.level() {
            Level::High => "high",
            Level::Low => "low",
        };
        let settings = self.gate.settings();
        UiState::new(
            self.info.name.as_str(),
            self.kind.block_type(),
            &self.info.description,
            level,
        )
        .with_attribute("value", self.gate.last_value().unwrap_or(0))
        .with_attribute("low_threshold", settings.low_threshold)
        .with_attribute("high_threshold", settings.high_threshold)
    }
}

impl Block for ThresholdSensor {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Sensor
    }

    fn block_type(&self) -> &'static str {
        self.kind.block_type()
    }

    fn as_ui(&self) -> Option<&dyn UiExposable> {
        Some(self)
    }
}
