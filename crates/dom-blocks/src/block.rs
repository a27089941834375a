//! Block capabilities and the per-tick context handed to them

use chrono::{DateTime, Local};
use dom_core::{BlockName, EventType, RememberedOutput, UiState};
use dom_hardware::{Channel, ChannelResult, HardwareIo};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BlockResult;

/// Evaluation category, fixing the order in which blocks tick
///
/// Every tick runs all sensors, then all controllers, then all actuators,
/// each group in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Sensor,
    Controller,
    Actuator,
}

impl BlockCategory {
    pub const ORDER: [BlockCategory; 3] = [Self::Sensor, Self::Controller, Self::Actuator];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Controller => "controller",
            Self::Actuator => "actuator",
        }
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and description shared by every block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub name: BlockName,
    pub description: String,
}

impl BlockInfo {
    pub fn new(name: BlockName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
        }
    }
}

/// Everything a block may touch while it runs
///
/// Events emitted through [`emit`](Self::emit) are collected and dispatched by
/// the runtime once the emitting block returns, so a block never holds a
/// borrow on another block.
pub struct BlockContext<'a> {
    now: DateTime<Local>,
    sequence: u64,
    hw: &'a mut dyn HardwareIo,
    emitted: Vec<EventType>,
}

impl<'a> BlockContext<'a> {
    pub fn new(now: DateTime<Local>, sequence: u64, hw: &'a mut dyn HardwareIo) -> Self {
        Self {
            now,
            sequence,
            hw,
            emitted: Vec::new(),
        }
    }

    /// Wall-clock instant of the current tick
    pub fn now(&self) -> DateTime<Local> {
        self.now
    }

    /// Loop sequence number of the current tick
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn hw(&mut self) -> &mut (dyn HardwareIo + 'a) {
        &mut *self.hw
    }

    pub fn read_digital_input(&self, channel: &Channel) -> ChannelResult<bool> {
        self.hw.read_digital_input(channel)
    }

    pub fn read_analog_input(&self, channel: &Channel) -> ChannelResult<i32> {
        self.hw.read_analog_input(channel)
    }

    pub fn write_digital_output(&mut self, channel: &Channel, value: bool) -> ChannelResult<()> {
        self.hw.write_digital_output(channel, value)
    }

    pub fn write_analog_output(&mut self, channel: &Channel, value: i32) -> ChannelResult<()> {
        self.hw.write_analog_output(channel, value)
    }

    /// Queue an event for dispatch through the emitting block's connectors
    pub fn emit(&mut self, event: EventType) {
        self.emitted.push(event);
    }

    /// Drain the events emitted since the last call, in emission order
    pub fn take_emitted(&mut self) -> Vec<EventType> {
        std::mem::take(&mut self.emitted)
    }
}

/// Periodic evaluation, run once per tick
pub trait Tickable {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()>;
}

/// Reaction to events delivered through connectors
pub trait EventListener {
    /// Handle one event. Only events listed by
    /// [`Block::accepted_events`] are ever delivered.
    fn on_event(&mut self, event: EventType, ctx: &mut BlockContext<'_>) -> BlockResult<()>;
}

/// Hardware-driving block whose state survives restarts
pub trait Actuator {
    /// Capture the restorable state of the block
    fn dump_output(&self) -> RememberedOutput;

    /// Restore from a remembered state (or defaults when `None`) and write
    /// the resulting output to hardware
    fn initialize_output(
        &mut self,
        remembered: Option<&RememberedOutput>,
        hw: &mut dyn HardwareIo,
    ) -> BlockResult<()>;
}

/// Block with a state worth showing to UI clients
pub trait UiExposable {
    fn ui_state(&self) -> UiState;
}

/// A named unit of control logic
///
/// Capabilities beyond [`Tickable`] are discovered through the `as_*`
/// accessors; a block that does not override one simply lacks it.
pub trait Block: Tickable + Send {
    fn info(&self) -> &BlockInfo;

    fn category(&self) -> BlockCategory;

    /// Short kind name, e.g. `"lamp"`
    fn block_type(&self) -> &'static str;

    fn name(&self) -> &BlockName {
        &self.info().name
    }

    fn description(&self) -> &str {
        &self.info().description
    }

    /// Events this block reacts to; empty for blocks that are not listeners
    fn accepted_events(&self) -> &'static [EventType] {
        &[]
    }

    fn accepts(&self, event: EventType) -> bool {
        self.accepted_events().contains(&event)
    }

    fn as_listener(&mut self) -> Option<&mut dyn EventListener> {
        None
    }

    fn as_actuator(&self) -> Option<&dyn Actuator> {
        None
    }

    fn as_actuator_mut(&mut self) -> Option<&mut dyn Actuator> {
        None
    }

    fn as_ui(&self) -> Option<&dyn UiExposable> {
        None
    }
}
