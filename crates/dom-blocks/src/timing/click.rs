//! Click classification for push buttons
//!
//! Turns a sampled pressed/released level into at most one click event per
//! sample: single, double or long click.

use chrono::{DateTime, Duration, Local};
use dom_core::EventType;
use serde::{Deserialize, Serialize};

use crate::elapsed_ms;

fn default_true() -> bool {
    true
}

fn default_long_click_ms() -> u64 {
    1000
}

fn default_double_click_ms() -> u64 {
    400
}

/// Which click kinds a button reports, and their timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickSettings {
    #[serde(default = "default_true")]
    pub single_click: bool,
    #[serde(default)]
    pub long_click: bool,
    #[serde(default)]
    pub double_click: bool,
    /// Hold time after which a press counts as a long click
    #[serde(default = "default_long_click_ms")]
    pub long_click_ms: u64,
    /// Window after a release in which a second press counts as a double click
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,
}

impl Default for ClickSettings {
    fn default() -> Self {
        Self {
            single_click: true,
            long_click: false,
            double_click: false,
            long_click_ms: default_long_click_ms(),
            double_click_ms: default_double_click_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPhase {
    Idle,
    Pressed { since: DateTime<Local> },
    AwaitingDouble { deadline: DateTime<Local> },
    /// A click was already reported for this press; wait for the release
    WaitRelease,
}

#[derive(Debug, Clone)]
pub struct ClickClassifier {
    settings: ClickSettings,
    phase: ClickPhase,
}

impl ClickClassifier {
    pub fn new(settings: ClickSettings) -> Self {
        Self {
            settings,
            phase: ClickPhase::Idle,
        }
    }

    pub fn settings(&self) -> &ClickSettings {
        &self.settings
    }

    pub fn phase(&self) -> ClickPhase {
        self.phase
    }

    fn long_click_reached(&self, since: DateTime<Local>, now: DateTime<Local>) -> bool {
        self.settings.long_click && elapsed_ms(since, now) >= self.settings.long_click_ms as i64
    }

    /// Feed one sample of the button level; returns the click it completes
    ///
    /// A long click is reported as soon as the hold time is reached, even
    /// while the button is still down. A press inside the double-click window
    /// is consumed by the double click and never starts a new cycle.
    pub fn update(&mut self, pressed: bool, now: DateTime<Local>) -> Option<EventType> {
        match self.phase {
            ClickPhase::Idle => {
                if pressed {
                    self.phase = ClickPhase::Pressed { since: now };
                }
                None
            }
            ClickPhase::Pressed { since } if pressed => {
                if self.long_click_reached(since, now) {
                    self.phase = ClickPhase::WaitRelease;
                    Some(EventType::LongClick)
                } else {
                    None
                }
            }
            ClickPhase::Pressed { since } => {
                if self.long_click_reached(since, now) {
                    self.phase = ClickPhase::Idle;
                    Some(EventType::LongClick)
                } else if self.settings.double_click {
                    let window = Duration::milliseconds(self.settings.double_click_ms as i64);
                    self.phase = ClickPhase::AwaitingDouble {
                        deadline: now + window,
                    };
                    None
                } else {
                    self.phase = ClickPhase::Idle;
                    self.settings.single_click.then_some(EventType::SingleClick)
                }
            }
            ClickPhase::AwaitingDouble { deadline } => {
                if now >= deadline {
                    self.phase = if pressed {
                        ClickPhase::Pressed { since: now }
                    } else {
                        ClickPhase::Idle
                    };
                    self.settings.single_click.then_some(EventType::SingleClick)
                } else if pressed {
                    self.phase = ClickPhase::WaitRelease;
                    Some(EventType::DoubleClick)
                } else {
                    None
                }
            }
            ClickPhase::WaitRelease => {
                if !pressed {
                    self.phase = ClickPhase::Idle;
                }
                None
            }
        }
    }
}
