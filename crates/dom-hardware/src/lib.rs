//! Hardware transport contract for the domotic runtime
//!
//! The runtime never talks bytes to the driver process itself. It depends on
//! the [`HardwareIo`] contract: batched refreshes of all inputs and all
//! outputs once per tick, with per-channel reads and writes against the
//! latched values in between.
//!
//! [`SimulatedHardware`] is an in-memory implementation used by tests and by
//! the server's simulation mode.

mod channel;
mod simulated;

pub use channel::Channel;
pub use simulated::SimulatedHardware;

use thiserror::Error;

/// Result type for hardware operations
pub type ChannelResult<T> = Result<T, ChannelFault>;

/// Failure of the link to the hardware driver
///
/// A channel fault is fatal to the current tick cycle. The supervisor reacts
/// by tearing down and restarting the driver; there is no local retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelFault {
    /// The driver cannot be reached
    #[error("hardware driver unreachable: {reason}")]
    Unreachable { reason: String },

    /// The link was established but broke down
    #[error("hardware link broken: {reason}")]
    Broken { reason: String },

    /// A block addressed a channel the transport does not know
    #[error("unknown hardware channel '{channel}'")]
    UnknownChannel { channel: Channel },

    /// A value outside the channel's range was written
    #[error("value {value} out of range for channel '{channel}'")]
    OutOfRange { channel: Channel, value: i32 },
}

/// Per-channel read/write plus batch refresh contract of the hardware link
///
/// Reads return the values latched by the last [`refresh_inputs`], writes are
/// buffered until the next [`refresh_outputs`].
///
/// [`refresh_inputs`]: HardwareIo::refresh_inputs
/// [`refresh_outputs`]: HardwareIo::refresh_outputs
pub trait HardwareIo: Send {
    /// Establish the link and bring boards to a known state
    fn initialize(&mut self) -> ChannelResult<()>;

    /// Fetch all inputs from the driver in one batch
    fn refresh_inputs(&mut self) -> ChannelResult<()>;

    /// Push all buffered outputs to the driver in one batch
    fn refresh_outputs(&mut self) -> ChannelResult<()>;

    /// Drop outputs buffered since the last
    /// [`refresh_outputs`](HardwareIo::refresh_outputs)
    fn discard_outputs(&mut self) {}

    /// Read a latched digital input
    fn read_digital_input(&self, channel: &Channel) -> ChannelResult<bool>;

    /// Read a latched analog input (light intensity, wind frequency, ...)
    fn read_analog_input(&self, channel: &Channel) -> ChannelResult<i32>;

    /// Buffer a digital output value
    fn write_digital_output(&mut self, channel: &Channel, value: bool) -> ChannelResult<()>;

    /// Buffer an analog output value
    fn write_analog_output(&mut self, channel: &Channel, value: i32) -> ChannelResult<()>;

    /// Send the shutdown command to the driver
    fn stop(&mut self) -> ChannelResult<()>;
}
