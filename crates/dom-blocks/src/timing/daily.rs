//! Daily on/off schedule with midnight wraparound

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid time of day '{0}', expected HH:MM")]
pub struct InvalidTimeOfDay(pub String);

/// Wall-clock time of day with minute resolution, written as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, InvalidTimeOfDay> {
        if hour >= 24 || minute >= 60 {
            return Err(InvalidTimeOfDay(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u32 {
        self.hour
    }

    pub fn minute(self) -> u32 {
        self.minute
    }

    pub fn minutes_since_midnight(self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn of(now: DateTime<Local>) -> Self {
        Self {
            hour: now.hour(),
            minute: now.minute(),
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTimeOfDay(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = InvalidTimeOfDay;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Daily on and off times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub on: TimeOfDay,
    pub off: TimeOfDay,
}

impl DailySchedule {
    pub fn new(on: TimeOfDay, off: TimeOfDay) -> Self {
        Self { on, off }
    }

    /// Whether the schedule asks for "on" at the given minute of the day
    ///
    /// With `on <= off` the schedule is on strictly between the two. When the
    /// off time precedes the on time the period spans midnight and the
    /// schedule is on everywhere except strictly between off and on.
    pub fn is_on_at(&self, minute_of_day: u32) -> bool {
        let minute = minute_of_day % MINUTES_PER_DAY;
        let on = self.on.minutes_since_midnight();
        let off = self.off.minutes_since_midnight();
        if on <= off {
            minute > on && minute < off
        } else {
            !(minute > off && minute < on)
        }
    }
}

/// Schedule plus the last reported state; starts off
#[derive(Debug, Clone)]
pub struct DailyTimer {
    schedule: DailySchedule,
    on: bool,
}

impl DailyTimer {
    pub fn new(schedule: DailySchedule) -> Self {
        Self {
            schedule,
            on: false,
        }
    }

    pub fn schedule(&self) -> &DailySchedule {
        &self.schedule
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Evaluate at `now`; returns the new state on a transition only
    pub fn update(&mut self, now: DateTime<Local>) -> Option<bool> {
        let wanted = self
            .schedule
            .is_on_at(TimeOfDay::of(now).minutes_since_midnight());
        if wanted == self.on {
            return None;
        }
        self.on = wanted;
        Some(wanted)
    }
}
