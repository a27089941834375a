//! Ventilation fan with delayed start and run-on
//!
//! Typically wired to a bathroom light: DELAY_ON starts the fan only if the
//! light stays on long enough, DELAY_OFF keeps it running for a while after
//! the light goes out.

use chrono::{DateTime, Duration, Local};
use dom_core::{EventType, RememberedOutput, UiState};
use dom_hardware::{Channel, HardwareIo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Actuator, Block, BlockCategory, BlockContext, BlockError, BlockInfo, BlockResult,
    EventListener, Tickable, UiExposable,
};

const ACCEPTED: &[EventType] = &[
    EventType::On,
    EventType::Off,
    EventType::Toggle,
    EventType::DelayOn,
    EventType::DelayOff,
];

fn default_delay_on_ms() -> u64 {
    120_000
}

fn default_run_on_ms() -> u64 {
    300_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanSettings {
    #[serde(default = "default_delay_on_ms")]
    pub delay_on_ms: u64,
    #[serde(default = "default_run_on_ms")]
    pub run_on_ms: u64,
}

impl Default for FanSettings {
    fn default() -> Self {
        Self {
            delay_on_ms: default_delay_on_ms(),
            run_on_ms: default_run_on_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    on: bool,
    at: DateTime<Local>,
}

pub struct Fan {
    info: BlockInfo,
    channel: Channel,
    settings: FanSettings,
    on: bool,
    pending: Option<Pending>,
    written: Option<bool>,
}

impl Fan {
    pub fn new(info: BlockInfo, channel: Channel, settings: FanSettings) -> Self {
        Self {
            info,
            channel,
            settings,
            on: false,
            pending: None,
            written: None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Scheduled switch, if any: `(target state, due time)`
    pub fn pending(&self) -> Option<(bool, DateTime<Local>)> {
        self.pending.map(|p| (p.on, p.at))
    }

    fn schedule(&mut self, on: bool, after_ms: u64, now: DateTime<Local>) {
        self.pending = Some(Pending {
            on,
            at: now + Duration::milliseconds(after_ms as i64),
        });
    }
}

impl Tickable for Fan {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        if let Some(pending) = self.pending {
            if ctx.now() >= pending.at {
                debug!(block = %self.info.name, on = pending.on, "Delayed fan switch");
                self.on = pending.on;
                self.pending = None;
            }
        }
        if self.written != Some(self.on) {
            ctx.write_digital_output(&self.channel, self.on)?;
            self.written = Some(self.on);
        }
        Ok(())
    }
}

impl EventListener for Fan {
    fn on_event(&mut self, event: EventType, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        let now = ctx.now();
        match event {
            EventType::On => {
                self.on = true;
                self.pending = None;
            }
            EventType::Off => {
                self.on = false;
                self.pending = None;
            }
            EventType::Toggle => {
                self.on = !self.on;
                self.pending = None;
            }
            EventType::DelayOn => match self.pending {
                // light back on during run-on: keep running
                Some(Pending { on: false, .. }) => self.pending = None,
                Some(Pending { on: true, .. }) => {}
                None if !self.on => self.schedule(true, self.settings.delay_on_ms, now),
                None => {}
            },
            EventType::DelayOff => match self.pending {
                // light off before the fan started
                Some(Pending { on: true, .. }) => self.pending = None,
                Some(Pending { on: false, .. }) => {}
                None if self.on => self.schedule(false, self.settings.run_on_ms, now),
                None => {}
            },
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

impl Actuator for Fan {
    fn dump_output(&self) -> RememberedOutput {
        RememberedOutput::new(self.info.name.as_str(), vec![i32::from(self.on)])
    }

    fn initialize_output(
        &mut self,
        remembered: Option<&RememberedOutput>,
        hw: &mut dyn HardwareIo,
    ) -> BlockResult<()> {
        self.on = remembered.and_then(|r| r.flag(0)).unwrap_or(false);
        self.pending = None;
        hw.write_digital_output(&self.channel, self.on)?;
        self.written = Some(self.on);
        Ok(())
    }
}

impl UiExposable for Fan {
    fn ui_state(&self) -> UiState {
        let state = UiState::new(
            self.info.name.as_str(),
            "fan",
            &self.info.description,
            if self.on { "on" } else { "off" },
        );
        match self.pending {
            Some(p) => state.with_attribute("pending", if p.on { "on" } else { "off" }),
            None => state,
        }
    }
}

impl Block for Fan {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Actuator
    }

    fn block_type(&self) -> &'static str {
        "fan"
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
