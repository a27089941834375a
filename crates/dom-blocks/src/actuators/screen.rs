//! Motorized screen with separate up and down motor outputs
//!
//! The position is estimated from motor run time, in permille closed
//! (0 fully up, 1000 fully down).

use chrono::{DateTime, Local};
use dom_core::{EventType, RememberedOutput, UiState};
use dom_hardware::{Channel, HardwareIo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    elapsed_ms, Actuator, Block, BlockCategory, BlockContext, BlockError, BlockInfo, BlockResult,
    EventListener, Tickable, UiExposable,
};

pub const CLOSED: i32 = 1000;

const ACCEPTED: &[EventType] = &[
    EventType::Up,
    EventType::Down,
    EventType::ToggleUp,
    EventType::ToggleDown,
    EventType::Stop,
    EventType::Sun,
    EventType::Wind,
];

fn default_motor_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSettings {
    /// Full travel time from down to up
    #[serde(default = "default_motor_ms")]
    pub motor_up_ms: u64,
    /// Full travel time from up to down
    #[serde(default = "default_motor_ms")]
    pub motor_down_ms: u64,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            motor_up_ms: default_motor_ms(),
            motor_down_ms: default_motor_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Rest,
    Up,
    Down,
}

impl Motion {
    fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Travel {
    motion: Motion,
    since: DateTime<Local>,
    start_position: i32,
    duration_ms: i64,
}

pub struct Screen {
    info: BlockInfo,
    down_channel: Channel,
    up_channel: Channel,
    settings: ScreenSettings,
    position: i32,
    travel: Option<Travel>,
    written: Option<Motion>,
}

impl Screen {
    pub fn new(
        info: BlockInfo,
        down_channel: Channel,
        up_channel: Channel,
        settings: ScreenSettings,
    ) -> Self {
        Self {
            info,
            down_channel,
            up_channel,
            settings,
            position: 0,
            travel: None,
            written: None,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn motion(&self) -> Motion {
        self.travel.map_or(Motion::Rest, |t| t.motion)
    }

    fn period_ms(&self, motion: Motion) -> i64 {
        match motion {
            Motion::Up => self.settings.motor_up_ms as i64,
            Motion::Down => self.settings.motor_down_ms as i64,
            Motion::Rest => 0,
        }
    }

    fn position_at(&self, travel: &Travel, now: DateTime<Local>) -> i32 {
        let period = self.period_ms(travel.motion);
        let elapsed = elapsed_ms(travel.since, now).clamp(0, travel.duration_ms);
        let moved = if period == 0 {
            i64::from(CLOSED)
        } else {
            i64::from(CLOSED) * elapsed / period
        };
        let position = match travel.motion {
            Motion::Up => i64::from(travel.start_position) - moved,
            Motion::Down => i64::from(travel.start_position) + moved,
            Motion::Rest => i64::from(travel.start_position),
        };
        position.clamp(0, i64::from(CLOSED)) as i32
    }

    fn settle(&mut self, now: DateTime<Local>) {
        if let Some(travel) = self.travel {
            self.position = self.position_at(&travel, now);
        }
    }

    /// Start moving; a screen already at the target end still runs a full
    /// period so the position estimate re-synchronizes with the hardware
    fn start(&mut self, motion: Motion, now: DateTime<Local>) {
        if self.motion() == motion {
            return;
        }
        self.settle(now);
        let period = self.period_ms(motion);
        let distance = match motion {
            Motion::Up => self.position,
            Motion::Down => CLOSED - self.position,
            Motion::Rest => 0,
        };
        let duration_ms = if distance == 0 {
            period
        } else {
            period * i64::from(distance) / i64::from(CLOSED)
        };
        self.travel = Some(Travel {
            motion,
            since: now,
            start_position: self.position,
            duration_ms,
        });
    }

    fn stop(&mut self, now: DateTime<Local>) {
        self.settle(now);
        self.travel = None;
    }

    fn toggle(&mut self, motion: Motion, now: DateTime<Local>) {
        if self.motion() == motion {
            self.stop(now);
        } else {
            self.start(motion, now);
        }
    }

    fn write_motors(&self, hw: &mut dyn HardwareIo, motion: Motion) -> BlockResult<()> {
        // never drive both motors at once: release first, then engage
        match motion {
            Motion::Up => {
                hw.write_digital_output(&self.down_channel, false)?;
                hw.write_digital_output(&self.up_channel, true)?;
            }
            Motion::Down => {
                hw.write_digital_output(&self.up_channel, false)?;
                hw.write_digital_output(&self.down_channel, true)?;
            }
            Motion::Rest => {
                hw.write_digital_output(&self.up_channel, false)?;
                hw.write_digital_output(&self.down_channel, false)?;
            }
        }
        Ok(())
    }
}

impl Tickable for Screen {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        let now = ctx.now();
        if let Some(travel) = self.travel {
            self.position = self.position_at(&travel, now);
            if elapsed_ms(travel.since, now) >= travel.duration_ms {
                debug!(block = %self.info.name, position = self.position, "Screen reached end");
                self.travel = None;
            }
        }
        let motion = self.motion();
        if self.written != Some(motion) {
            self.write_motors(ctx.hw(), motion)?;
            self.written = Some(motion);
        }
        Ok(())
    }
}

impl EventListener for Screen {
    fn on_event(&mut self, event: EventType, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        let now = ctx.now();
        match event {
            EventType::Up | EventType::Wind => self.start(Motion::Up, now),
            EventType::Down | EventType::Sun => self.start(Motion::Down, now),
            EventType::ToggleUp => self.toggle(Motion::Up, now),
            EventType::ToggleDown => self.toggle(Motion::Down, now),
            EventType::Stop => self.stop(now),
            other => {
                return Err(BlockError::UnsupportedEvent {
                    block: self.info.name.to_string(),
                    event: other,
                })
            }
        }
        debug!(block = %self.info.name, event = %event, motion = self.motion().as_str(), "Screen command");
        Ok(())
    }
}

impl Actuator for Screen {
    fn dump_output(&self) -> RememberedOutput {
        RememberedOutput::new(self.info.name.as_str(), vec![self.position])
    }

    fn initialize_output(
        &mut self,
        remembered: Option<&RememberedOutput>,
        hw: &mut dyn HardwareIo,
    ) -> BlockResult<()> {
        self.position = remembered
            .and_then(|r| r.value(0))
            .unwrap_or(0)
            .clamp(0, CLOSED);
        self.travel = None;
        self.write_motors(hw, Motion::Rest)?;
        self.written = Some(Motion::Rest);
        Ok(())
    }
}

impl UiExposable for Screen {
    fn ui_state(&self) -> UiState {
        UiState::new(
            self.info.name.as_str(),
            "screen",
            &self.info.description,
            self.motion().as_str(),
        )
        .with_attribute("position", self.position)
    }
}

impl Block for Screen {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Actuator
    }

    fn block_type(&self) -> &'static str {
        "screen"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, ms};
    use dom_core::BlockName;
    use dom_hardware::SimulatedHardware;

    fn screen() -> Screen {
        Screen::new(
            BlockInfo::new(BlockName::new("kitchen").unwrap(), "kitchen screen"),
            Channel::from("kitchenDown"),
            Channel::from("kitchenUp"),
            ScreenSettings {
                motor_up_ms: 1000,
                motor_down_ms: 2000,
            },
        )
    }

    #[test]
    fn test_down_runs_motor_until_closed() {
        let mut hw = SimulatedHardware::new();
        let observer = hw.clone();
        let mut s = screen();
        s.initialize_output(None, &mut hw).unwrap();
        let t0 = at(11, 0);

        let mut ctx = BlockContext::new(t0, 1, &mut hw);
        s.on_event(EventType::Sun, &mut ctx).unwrap();
        s.tick(&mut ctx).unwrap();
        hw.refresh_outputs().unwrap();
        assert_eq!(observer.digital_output("kitchenDown"), Some(true));
        assert_eq!(observer.digital_output("kitchenUp"), Some(false));

        let mut ctx = BlockContext::new(ms(t0, 1000), 2, &mut hw);
        s.tick(&mut ctx).unwrap();
        assert_eq!(s.position(), 500);

        let mut ctx = BlockContext::new(ms(t0, 2000), 3, &mut hw);
        s.tick(&mut ctx).unwrap();
        hw.refresh_outputs().unwrap();
        assert_eq!(s.position(), CLOSED);
        assert_eq!(s.motion(), Motion::Rest);
        assert_eq!(observer.digital_output("kitchenDown"), Some(false));
    }

    #[test]
    fn test_toggle_stops_moving_screen() {
        let mut hw = SimulatedHardware::new();
        let mut s = screen();
        let t0 = at(11, 0);

        let mut ctx = BlockContext::new(t0, 1, &mut hw);
        s.on_event(EventType::ToggleDown, &mut ctx).unwrap();
        assert_eq!(s.motion(), Motion::Down);

        let mut ctx = BlockContext::new(ms(t0, 500), 2, &mut hw);
        s.on_event(EventType::ToggleDown, &mut ctx).unwrap();
        assert_eq!(s.motion(), Motion::Rest);
        assert_eq!(s.position(), 250);
        assert_eq!(s.dump_output().values, vec![250]);
    }

    #[test]
    fn test_wind_retracts() {
        let mut hw = SimulatedHardware::new();
        let mut s = screen();
        s.initialize_output(Some(&RememberedOutput::new("kitchen", vec![CLOSED])), &mut hw)
            .unwrap();
        let t0 = at(11, 0);

        let mut ctx = BlockContext::new(t0, 1, &mut hw);
        s.on_event(EventType::Wind, &mut ctx).unwrap();
        let mut ctx = BlockContext::new(ms(t0, 1000), 2, &mut hw);
        s.tick(&mut ctx).unwrap();
        assert_eq!(s.position(), 0);
        assert_eq!(s.motion(), Motion::Rest);
    }
}
