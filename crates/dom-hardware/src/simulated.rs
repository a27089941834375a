//! In-memory hardware, for tests and simulation mode

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::{Channel, ChannelFault, ChannelResult, HardwareIo};

#[derive(Debug, Default)]
struct SimState {
    /// Values set by the outside world, visible after the next input refresh
    pending_inputs: HashMap<Channel, i32>,
    /// Values latched by the last input refresh
    inputs: HashMap<Channel, i32>,
    /// Values written by blocks, visible after the next output refresh
    pending_outputs: HashMap<Channel, i32>,
    /// Values committed by the last output refresh
    outputs: HashMap<Channel, i32>,
    link_broken: bool,
    initialize_count: u32,
    input_refresh_count: u64,
    output_refresh_count: u64,
    stop_count: u32,
}

/// Hardware simulator sharing its state between clones
///
/// One clone is handed to the runtime, the other stays with the test (or the
/// simulation console) to drive inputs and inspect outputs. Unknown input
/// channels read as `false` / `0`.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHardware {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHardware {
    /// Create a simulator with no channels set
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a digital input, latched at the next input refresh
    pub fn set_digital_input(&self, channel: impl Into<Channel>, value: bool) {
        self.lock()
            .pending_inputs
            .insert(channel.into(), i32::from(value));
    }

    /// Set an analog input, latched at the next input refresh
    pub fn set_analog_input(&self, channel: impl Into<Channel>, value: i32) {
        self.lock().pending_inputs.insert(channel.into(), value);
    }

    /// Committed digital output, if ever written
    pub fn digital_output(&self, channel: impl Into<Channel>) -> Option<bool> {
        self.lock().outputs.get(&channel.into()).map(|v| *v != 0)
    }

    /// Committed analog output, if ever written
    pub fn analog_output(&self, channel: impl Into<Channel>) -> Option<i32> {
        self.lock().outputs.get(&channel.into()).copied()
    }

    /// Make every batched call fail until repaired
    pub fn break_link(&self) {
        self.lock().link_broken = true;
    }

    /// Repair a link broken with [`break_link`](Self::break_link)
    pub fn repair_link(&self) {
        self.lock().link_broken = false;
    }

    /// Number of `initialize` calls
    pub fn initialize_count(&self) -> u32 {
        self.lock().initialize_count
    }

    /// Number of successful input refreshes
    pub fn input_refresh_count(&self) -> u64 {
        self.lock().input_refresh_count
    }

    /// Number of successful output refreshes
    pub fn output_refresh_count(&self) -> u64 {
        self.lock().output_refresh_count
    }

    /// Number of `stop` calls
    pub fn stop_count(&self) -> u32 {
        self.lock().stop_count
    }
}

fn check_link(state: &SimState, operation: &str) -> ChannelResult<()> {
    if state.link_broken {
        return Err(ChannelFault::Broken {
            reason: format!("simulated link is down during {operation}"),
        });
    }
    Ok(())
}

impl HardwareIo for SimulatedHardware {
    fn initialize(&mut self) -> ChannelResult<()> {
        let mut state = self.lock();
        check_link(&state, "initialize")?;
        state.initialize_count += 1;
        debug!(count = state.initialize_count, "Simulated hardware initialized");
        Ok(())
    }

    fn refresh_inputs(&mut self) -> ChannelResult<()> {
        let mut state = self.lock();
        check_link(&state, "input refresh")?;
        let pending = state.pending_inputs.clone();
        state.inputs.extend(pending);
        state.input_refresh_count += 1;
        Ok(())
    }

    fn refresh_outputs(&mut self) -> ChannelResult<()> {
        let mut state = self.lock();
        check_link(&state, "output refresh")?;
        let pending = std::mem::take(&mut state.pending_outputs);
        for (channel, value) in pending {
            trace!(channel = %channel, value, "Committing simulated output");
            state.outputs.insert(channel, value);
        }
        state.output_refresh_count += 1;
        Ok(())
    }

    fn discard_outputs(&mut self) {
        let mut state = self.lock();
        let dropped = state.pending_outputs.len();
        state.pending_outputs.clear();
        debug!(dropped, "Discarded buffered simulated outputs");
    }

    fn read_digital_input(&self, channel: &Channel) -> ChannelResult<bool> {
        Ok(self.lock().inputs.get(channel).is_some_and(|v| *v != 0))
    }

    fn read_analog_input(&self, channel: &Channel) -> ChannelResult<i32> {
        Ok(self.lock().inputs.get(channel).copied().unwrap_or(0))
    }

    fn write_digital_output(&mut self, channel: &Channel, value: bool) -> ChannelResult<()> {
        self.lock()
            .pending_outputs
            .insert(channel.clone(), i32::from(value));
        Ok(())
    }

    fn write_analog_output(&mut self, channel: &Channel, value: i32) -> ChannelResult<()> {
        if value < 0 {
            return Err(ChannelFault::OutOfRange {
                channel: channel.clone(),
                value,
            });
        }
        self.lock().pending_outputs.insert(channel.clone(), value);
        Ok(())
    }

    fn stop(&mut self) -> ChannelResult<()> {
        let mut state = self.lock();
        state.stop_count += 1;
        debug!("Simulated hardware stopped");
        Ok(())
    }
}
