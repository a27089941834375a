//! Tick loop, event dispatch and scheduling for the domotic runtime
//!
//! A [`RuntimeBuilder`] collects blocks and connectors once. The resulting
//! [`Runtime`] owns the block arena and the hardware link and executes ticks:
//!
//! 1. increment the loop sequence
//! 2. apply queued UI actions, refresh all inputs
//! 3. tick sensors, then controllers, then actuators, dispatching every
//!    emitted event synchronously through its connectors
//! 4. refresh all outputs
//! 5. every Nth tick, publish a UI snapshot to subscribed listeners
//!
//! The [`Scheduler`] runs ticks on a dedicated thread at a fixed period.

mod builder;
mod error;
pub mod listeners;
mod runtime;
mod scheduler;
mod settings;

pub use builder::RuntimeBuilder;
pub use error::{RuntimeError, RuntimeResult};
pub use listeners::{
    ChannelListener, ListenerDeliveryError, ListenerId, StateChangedListener, UiSnapshot,
};
pub use runtime::Runtime;
pub use scheduler::{Scheduler, SchedulerState};
pub use settings::{RuntimeSettings, SchedulerSettings};
