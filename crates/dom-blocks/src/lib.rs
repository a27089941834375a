//! Control blocks for the domotic runtime
//!
//! A block is a named unit of control logic. Each block belongs to exactly one
//! evaluation category (sensor, controller or actuator) and composes the
//! capabilities it needs:
//!
//! - [`Tickable`]: every block runs once per tick
//! - [`EventListener`]: reacts to events delivered through connectors
//! - [`Actuator`]: drives hardware outputs and round-trips its state through a
//!   [`RememberedOutput`](dom_core::RememberedOutput)
//! - [`UiExposable`]: publishes a display state to UI clients
//!
//! The timing logic (click classification, hysteresis, daily schedules,
//! dimming ramps) lives in [`timing`] as pure state machines over
//! `(now, prior state)`, so it can be tested without a runtime.

pub mod actuators;
mod block;
pub mod controllers;
mod error;
pub mod sensors;
pub mod timing;

pub use block::{
    Actuator, Block, BlockCategory, BlockContext, BlockInfo, EventListener, Tickable, UiExposable,
};
pub use error::{BlockError, BlockResult};

/// Whole milliseconds elapsed between two instants, negative if `to` precedes `from`
pub(crate) fn elapsed_ms(
    from: chrono::DateTime<chrono::Local>,
    to: chrono::DateTime<chrono::Local>,
) -> i64 {
    (to - from).num_milliseconds()
}
