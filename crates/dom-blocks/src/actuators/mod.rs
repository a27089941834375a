//! Actuators: blocks that drive hardware outputs and survive restarts

mod dimmed_lamp;
mod fan;
mod lamp;
mod screen;

pub use dimmed_lamp::{DimmedLamp, DimmedLampSettings};
pub use fan::{Fan, FanSettings};
pub use lamp::Lamp;
pub use screen::{Motion, Screen, ScreenSettings, CLOSED};
