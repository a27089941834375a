//! Sun and wind protection for screens
//!
//! Combines light and wind sensor levels into screen commands: WIND while a
//! wind alarm is active, SUN when the sun is strong and automation is
//! enabled, UP once the sun is gone again.

use dom_core::{EventType, UiState};
use tracing::info;

use crate::{
    Block, BlockCategory, BlockContext, BlockError, BlockInfo, BlockResult, EventListener,
    Tickable, UiExposable,
};

const ACCEPTED: &[EventType] = &[
    EventType::On,
    EventType::Off,
    EventType::Toggle,
    EventType::LightHigh,
    EventType::LightLow,
    EventType::WindHigh,
    EventType::WindLow,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    Idle,
    Sun,
    Wind,
}

impl Protection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sun => "sun",
            Self::Wind => "wind",
        }
    }
}

pub struct SunWindController {
    info: BlockInfo,
    enabled: bool,
    sun_high: bool,
    wind_high: bool,
    mode: Protection,
}

impl SunWindController {
    pub fn new(info: BlockInfo) -> Self {
        Self {
            info,
            enabled: true,
            sun_high: false,
            wind_high: false,
            mode: Protection::Idle,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> Protection {
        self.mode
    }

    fn wanted(&self) -> Protection {
        if self.wind_high {
            Protection::Wind
        } else if self.enabled && self.sun_high {
            Protection::Sun
        } else {
            Protection::Idle
        }
    }
}

impl Tickable for SunWindController {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        let wanted = self.wanted();
        if wanted == self.mode {
            return Ok(());
        }

        let command = match (self.mode, wanted) {
            (_, Protection::Wind) => Some(EventType::Wind),
            (_, Protection::Sun) => Some(EventType::Sun),
            (Protection::Sun, Protection::Idle) => Some(EventType::Up),
            _ => None,
        };
        info!(
            block = %self.info.name,
            from = self.mode.as_str(),
            to = wanted.as_str(),
            "Sun/wind protection changed"
        );
        self.mode = wanted;
        if let Some(command) = command {
            ctx.emit(command);
        }
        Ok(())
    }
}

impl EventListener for SunWindController {
    fn on_event(&mut self, event: EventType, _ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        match event {
            EventType::On => self.enabled = true,
            EventType::Off => self.enabled = false,
            EventType::Toggle => self.enabled = !self.enabled,
            EventType::LightHigh => self.sun_high = true,
            EventType::LightLow => self.sun_high = false,
            EventType::WindHigh => self.wind_high = true,
            EventType::WindLow => self.wind_high = false,
            other => {
                return Err(BlockError::UnsupportedEvent {
                    block: self.info.name.to_string(),
                    event: other,
                })
            }
        }
        Ok(())
    }
}

impl UiExposable for SunWindController {
    fn ui_state(&self) -> UiState {
        UiState::new(
            self.info.name.as_str(),
            "sun_wind",
            &self.info.description,
            self.mode.as_str(),
        )
        .with_attribute("enabled", self.enabled)
    }
}

impl Block for SunWindController {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Controller
    }

    fn block_type(&self) -> &'static str {
        "sun_wind"
    }

    fn accepted_events(&self) -> &'static [EventType] {
        ACCEPTED
    }

    fn as_listener(&mut self) -> Option<&mut dyn EventListener> {
        Some(self)
    }

    fn as_ui(&self) -> Option<&dyn UiExposable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;
    use dom_core::BlockName;
    use dom_hardware::SimulatedHardware;

    fn step(c: &mut SunWindController, events: &[EventType]) -> Vec<EventType> {
        let mut hw = SimulatedHardware::new();
        let mut ctx = BlockContext::new(at(13, 0), 1, &mut hw);
        for event in events {
            c.on_event(*event, &mut ctx).unwrap();
        }
        c.tick(&mut ctx).unwrap();
        ctx.take_emitted()
    }

    #[test]
    fn test_sun_then_wind_then_calm() {
        let mut c = SunWindController::new(BlockInfo::new(BlockName::new("sw").unwrap(), ""));

        assert_eq!(step(&mut c, &[EventType::LightHigh]), vec![EventType::Sun]);
        assert!(step(&mut c, &[]).is_empty());
        assert_eq!(step(&mut c, &[EventType::WindHigh]), vec![EventType::Wind]);
        assert_eq!(step(&mut c, &[EventType::WindLow]), vec![EventType::Sun]);
        assert_eq!(step(&mut c, &[EventType::LightLow]), vec![EventType::Up]);
        assert_eq!(c.mode(), Protection::Idle);
    }

    #[test]
    fn test_disabled_ignores_sun_but_not_wind() {
        let mut c = SunWindController::new(BlockInfo::new(BlockName::new("sw").unwrap(), ""));

        assert!(step(&mut c, &[EventType::Off, EventType::LightHigh]).is_empty());
        assert_eq!(step(&mut c, &[EventType::WindHigh]), vec![EventType::Wind]);
        assert!(step(&mut c, &[EventType::WindLow]).is_empty());
        assert_eq!(step(&mut c, &[EventType::Toggle]), vec![EventType::Sun]);
    }
}
