//! Semantic events exchanged between blocks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when an alias does not name any event type
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown event alias '{0}'")]
pub struct UnknownEventAlias(pub String);

/// Semantic event sent from one block to another through a connector
///
/// Each variant has a stable string alias used by external wiring
/// (configuration files, UI actions). Aliases are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventType {
    On,
    Off,
    Toggle,
    SingleClick,
    DoubleClick,
    LongClick,
    DelayOn,
    DelayOff,
    ToggleUp,
    ToggleDown,
    Sun,
    Wind,
    Up,
    Down,
    Stop,
    Full,
    LightHigh,
    LightLow,
    WindHigh,
    WindLow,
}

impl EventType {
    /// Every event type, in declaration order
    pub const ALL: [EventType; 20] = [
        EventType::On,
        EventType::Off,
        EventType::Toggle,
        EventType::SingleClick,
        EventType::DoubleClick,
        EventType::LongClick,
        EventType::DelayOn,
        EventType::DelayOff,
        EventType::ToggleUp,
        EventType::ToggleDown,
        EventType::Sun,
        EventType::Wind,
        EventType::Up,
        EventType::Down,
        EventType::Stop,
        EventType::Full,
        EventType::LightHigh,
        EventType::LightLow,
        EventType::WindHigh,
        EventType::WindLow,
    ];

    /// Stable external alias of this event type
    pub fn alias(self) -> &'static str {
        match self {
            EventType::On => "on",
            EventType::Off => "off",
            EventType::Toggle => "toggle",
            EventType::SingleClick => "SingleClick",
            EventType::DoubleClick => "DoubleClick",
            EventType::LongClick => "LongClick",
            EventType::DelayOn => "delayOn",
            EventType::DelayOff => "delayOff",
            EventType::ToggleUp => "toggleUp",
            EventType::ToggleDown => "toggleDown",
            EventType::Sun => "sun",
            EventType::Wind => "wind",
            EventType::Up => "up",
            EventType::Down => "down",
            EventType::Stop => "stop",
            EventType::Full => "full",
            EventType::LightHigh => "lightHigh",
            EventType::LightLow => "lightLow",
            EventType::WindHigh => "windHigh",
            EventType::WindLow => "windLow",
        }
    }

    /// Look up an event type by its alias (case-insensitive)
    pub fn from_alias(alias: &str) -> Result<Self, UnknownEventAlias> {
        let alias = alias.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.alias().eq_ignore_ascii_case(alias))
            .ok_or_else(|| UnknownEventAlias(alias.to_string()))
    }

    /// Whether this event is one of the switch click classifications
    pub fn is_click(self) -> bool {
        matches!(
            self,
            EventType::SingleClick | EventType::DoubleClick | EventType::LongClick
        )
    }
}

impl FromStr for EventType {
    type Err = UnknownEventAlias;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s)
    }
}

impl TryFrom<String> for EventType {
    type Error = UnknownEventAlias;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_alias(&s)
    }
}

impl From<EventType> for String {
    fn from(event: EventType) -> String {
        event.alias().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_alias_parses_back() {
        for event in EventType::ALL {
            assert_eq!(EventType::from_alias(event.alias()), Ok(event));
        }
    }

    #[test]
    fn test_alias_is_case_insensitive() {
        assert_eq!("singleclick".parse::<EventType>(), Ok(EventType::SingleClick));
        assert_eq!("ON".parse::<EventType>(), Ok(EventType::On));
        assert_eq!(" toggleUp ".parse::<EventType>(), Ok(EventType::ToggleUp));
    }

    #[test]
    fn test_unknown_alias() {
        assert_eq!(
            "explode".parse::<EventType>(),
            Err(UnknownEventAlias("explode".to_string()))
        );
    }

    #[test]
    fn test_serializes_as_alias() {
        let json = serde_json::to_string(&EventType::LongClick).unwrap();
        assert_eq!(json, "\"LongClick\"");
        let parsed: EventType = serde_json::from_str("\"delayoff\"").unwrap();
        assert_eq!(parsed, EventType::DelayOff);
    }
}
