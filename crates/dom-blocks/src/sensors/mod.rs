//! Sensors: blocks that sample inputs and emit events

mod dimmer_switch;
mod switch;
mod threshold;

pub use dimmer_switch::{
    Button, DimmerClassifier, DimmerPhase, DimmerSwitch, DimmerSwitchSettings,
};
pub use switch::Switch;
pub use threshold::{ThresholdKind, ThresholdSensor};
