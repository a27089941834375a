//! Controllers: blocks driven by time or by other blocks' events

mod sun_wind;
mod timer;

pub use sun_wind::{Protection, SunWindController};
pub use timer::Timer;
