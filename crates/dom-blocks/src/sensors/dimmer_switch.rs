//! Two-button dimmer switch
//!
//! Down and up buttons each act as a click (off / on) when released quickly,
//! as a ramp command (down / up, then stop on release) when held, and
//! together as "full".

use chrono::{DateTime, Local};
use dom_core::EventType;
use dom_hardware::Channel;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{elapsed_ms, Block, BlockCategory, BlockContext, BlockInfo, BlockResult, Tickable};

fn default_click_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimmerSwitchSettings {
    /// Hold time after which a press becomes a ramp command
    #[serde(default = "default_click_ms")]
    pub click_ms: u64,
}

impl Default for DimmerSwitchSettings {
    fn default() -> Self {
        Self {
            click_ms: default_click_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Down,
    Up,
}

impl Button {
    fn click_event(self) -> EventType {
        match self {
            Self::Down => EventType::Off,
            Self::Up => EventType::On,
        }
    }

    fn hold_event(self) -> EventType {
        match self {
            Self::Down => EventType::Down,
            Self::Up => EventType::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimmerPhase {
    Idle,
    Pressed { button: Button, since: DateTime<Local> },
    Holding { button: Button },
    /// Both buttons down
    Combo,
    WaitRelease,
}

/// Pure classifier over the two button levels
#[derive(Debug, Clone)]
pub struct DimmerClassifier {
    settings: DimmerSwitchSettings,
    phase: DimmerPhase,
}

impl DimmerClassifier {
    pub fn new(settings: DimmerSwitchSettings) -> Self {
        Self {
            settings,
            phase: DimmerPhase::Idle,
        }
    }

    pub fn phase(&self) -> DimmerPhase {
        self.phase
    }

    pub fn update(&mut self, down: bool, up: bool, now: DateTime<Local>) -> Option<EventType> {
        let level = |button| match button {
            Button::Down => down,
            Button::Up => up,
        };

        match self.phase {
            DimmerPhase::Idle => {
                self.phase = match (down, up) {
                    (true, true) => DimmerPhase::Combo,
                    (true, false) => DimmerPhase::Pressed {
                        button: Button::Down,
                        since: now,
                    },
                    (false, true) => DimmerPhase::Pressed {
                        button: Button::Up,
                        since: now,
                    },
                    (false, false) => DimmerPhase::Idle,
                };
                None
            }
            DimmerPhase::Pressed { .. } if down && up => {
                self.phase = DimmerPhase::Combo;
                None
            }
            DimmerPhase::Pressed { button, since } => {
                if !level(button) {
                    self.phase = DimmerPhase::Idle;
                    Some(button.click_event())
                } else if elapsed_ms(since, now) >= self.settings.click_ms as i64 {
                    self.phase = DimmerPhase::Holding { button };
                    Some(button.hold_event())
                } else {
                    None
                }
            }
            DimmerPhase::Holding { button } => {
                if level(button) {
                    return None;
                }
                self.phase = if down || up {
                    DimmerPhase::WaitRelease
                } else {
                    DimmerPhase::Idle
                };
                Some(EventType::Stop)
            }
            DimmerPhase::Combo => {
                if down && up {
                    return None;
                }
                self.phase = if down || up {
                    DimmerPhase::WaitRelease
                } else {
                    DimmerPhase::Idle
                };
                Some(EventType::Full)
            }
            DimmerPhase::WaitRelease => {
                if !down && !up {
                    self.phase = DimmerPhase::Idle;
                }
                None
            }
        }
    }
}

pub struct DimmerSwitch {
    info: BlockInfo,
    down_channel: Channel,
    up_channel: Channel,
    classifier: DimmerClassifier,
}

impl DimmerSwitch {
    pub fn new(
        info: BlockInfo,
        down_channel: Channel,
        up_channel: Channel,
        settings: DimmerSwitchSettings,
    ) -> Self {
        Self {
            info,
            down_channel,
            up_channel,
            classifier: DimmerClassifier::new(settings),
        }
    }
}

impl Tickable for DimmerSwitch {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        let down = ctx.read_digital_input(&self.down_channel)?;
        let up = ctx.read_digital_input(&self.up_channel)?;
        if let Some(event) = self.classifier.update(down, up, ctx.now()) {
            debug!(block = %self.info.name, event = %event, "Dimmer switch command");
            ctx.emit(event);
        }
        Ok(())
    }
}

impl Block for DimmerSwitch {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Sensor
    }

    fn block_type(&self) -> &'static str {
        "dimmer_switch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, ms};

    fn run(samples: &[(i64, bool, bool)]) -> Vec<EventType> {
        let t0 = at(19, 0);
        let mut c = DimmerClassifier::new(DimmerSwitchSettings { click_ms: 500 });
        samples
            .iter()
            .filter_map(|(offset, down, up)| c.update(*down, *up, ms(t0, *offset)))
            .collect()
    }

    #[test]
    fn test_short_presses_are_clicks() {
        assert_eq!(run(&[(0, false, true), (100, false, false)]), vec![EventType::On]);
        assert_eq!(run(&[(0, true, false), (100, false, false)]), vec![EventType::Off]);
    }

    #[test]
    fn test_hold_ramps_then_stops() {
        let events = run(&[
            (0, false, true),
            (501, false, true),
            (1500, false, true),
            (1600, false, false),
        ]);
        assert_eq!(events, vec![EventType::Up, EventType::Stop]);
    }

    #[test]
    fn test_both_buttons_mean_full() {
        let events = run(&[
            (0, true, false),
            (10, true, true),
            (20, true, false),
            (30, false, false),
        ]);
        assert_eq!(events, vec![EventType::Full]);
    }
}
