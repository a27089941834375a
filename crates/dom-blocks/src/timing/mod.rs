//! Pure timing state machines
//!
//! Each machine is a function of `(now, prior state, input)`; none of them
//! reads a clock or touches hardware.

pub mod click;
pub mod daily;
pub mod hysteresis;
pub mod ramp;

pub use click::{ClickClassifier, ClickPhase, ClickSettings};
pub use daily::{DailySchedule, DailyTimer, TimeOfDay};
pub use hysteresis::{HysteresisGate, HysteresisSettings, Level};
pub use ramp::{Ramp, RampDirection};
