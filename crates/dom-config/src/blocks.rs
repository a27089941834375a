//! Block definitions

use dom_blocks::actuators::{
    DimmedLamp, DimmedLampSettings, Fan, FanSettings, Lamp, Screen, ScreenSettings,
};
use dom_blocks::controllers::{SunWindController, Timer};
use dom_blocks::sensors::{DimmerSwitch, DimmerSwitchSettings, Switch, ThresholdSensor};
use dom_blocks::timing::{ClickSettings, DailySchedule, HysteresisSettings};
use dom_blocks::{Block, BlockInfo};
use dom_core::{BlockName, ConfigurationError};
use dom_hardware::Channel;
use serde::Deserialize;

use crate::error::ConfigResult;

/// Channel written either as a board number or a logical name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChannelRef {
    Number(u32),
    Name(String),
}

impl From<&ChannelRef> for Channel {
    fn from(value: &ChannelRef) -> Self {
        match value {
            ChannelRef::Number(n) => Channel::from(*n),
            ChannelRef::Name(name) => Channel::from(name.as_str()),
        }
    }
}

/// One entry of the `blocks:` list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Switch {
        channel: ChannelRef,
        #[serde(flatten)]
        click: ClickSettings,
    },
    DimmerSwitch {
        down_channel: ChannelRef,
        up_channel: ChannelRef,
        #[serde(flatten)]
        settings: DimmerSwitchSettings,
    },
    LightSensor {
        channel: ChannelRef,
        #[serde(flatten)]
        thresholds: HysteresisSettings,
    },
    WindSensor {
        channel: ChannelRef,
        #[serde(flatten)]
        thresholds: HysteresisSettings,
    },
    Timer {
        #[serde(flatten)]
        schedule: DailySchedule,
    },
    SunWind {},
    Lamp {
        channel: ChannelRef,
    },
    DimmedLamp {
        channel: ChannelRef,
        #[serde(flatten)]
        settings: DimmedLampSettings,
    },
    Screen {
        down_channel: ChannelRef,
        up_channel: ChannelRef,
        #[serde(flatten)]
        settings: ScreenSettings,
    },
    Fan {
        channel: ChannelRef,
        #[serde(flatten)]
        settings: FanSettings,
    },
}

impl BlockKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Switch { .. } => "switch",
            Self::DimmerSwitch { .. } => "dimmer_switch",
            Self::LightSensor { .. } => "light_sensor",
            Self::WindSensor { .. } => "wind_sensor",
            Self::Timer { .. } => "timer",
            Self::SunWind {} => "sun_wind",
            Self::Lamp { .. } => "lamp",
            Self::DimmedLamp { .. } => "dimmed_lamp",
            Self::Screen { .. } => "screen",
            Self::Fan { .. } => "fan",
        }
    }
}

impl BlockConfig {
    /// Instantiate the block this entry describes
    pub fn build(&self) -> ConfigResult<Box<dyn Block>> {
        let name =
            BlockName::new(self.name.as_str()).map_err(|source| ConfigurationError::InvalidName {
                name: self.name.clone(),
                source,
            })?;
        let info = BlockInfo::new(name, self.description.clone());

        let block: Box<dyn Block> = match &self.kind {
            BlockKind::Switch { channel, click } => {
                Box::new(Switch::new(info, channel.into(), *click))
            }
            BlockKind::DimmerSwitch {
                down_channel,
                up_channel,
                settings,
            } => Box::new(DimmerSwitch::new(
                info,
                down_channel.into(),
                up_channel.into(),
                *settings,
            )),
            BlockKind::LightSensor {
                channel,
                thresholds,
            } => Box::new(ThresholdSensor::light(info, channel.into(), *thresholds)?),
            BlockKind::WindSensor {
                channel,
                thresholds,
            } => Box::new(ThresholdSensor::wind(info, channel.into(), *thresholds)?),
            BlockKind::Timer { schedule } => Box::new(Timer::new(info, *schedule)),
            BlockKind::SunWind {} => Box::new(SunWindController::new(info)),
            BlockKind::Lamp { channel } => Box::new(Lamp::new(info, channel.into())),
            BlockKind::DimmedLamp { channel, settings } => {
                settings.validate(self.name.as_str())?;
                Box::new(DimmedLamp::new(info, channel.into(), *settings))
            }
            BlockKind::Screen {
                down_channel,
                up_channel,
                settings,
            } => Box::new(Screen::new(
                info,
                down_channel.into(),
                up_channel.into(),
                *settings,
            )),
            BlockKind::Fan { channel, settings } => {
                Box::new(Fan::new(info, channel.into(), *settings))
            }
        };
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_blocks::BlockCategory;

    fn parse(yaml: &str) -> BlockConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_switch_with_click_options() {
        let config = parse("type: switch\nname: sw1\nchannel: 0\nlong_click: true\nlong_click_ms: 800");
        let BlockKind::Switch { channel, click } = &config.kind else {
            panic!("expected a switch, got {:?}", config.kind);
        };
        assert_eq!(channel, &ChannelRef::Number(0));
        assert!(click.single_click);
        assert!(click.long_click);
        assert_eq!(click.long_click_ms, 800);
        assert_eq!(click.double_click_ms, 400);
    }

    #[test]
    fn test_named_channel_and_defaults() {
        let config = parse("type: screen\nname: kitchen\ndown_channel: kitchenDown\nup_channel: kitchenUp");
        assert_eq!(
            config.kind,
            BlockKind::Screen {
                down_channel: ChannelRef::Name("kitchenDown".to_string()),
                up_channel: ChannelRef::Name("kitchenUp".to_string()),
                settings: ScreenSettings::default(),
            }
        );
        assert_eq!(config.kind.type_name(), "screen");
    }

    #[test]
    fn test_build_reports_category_and_type() {
        let lamp = parse("type: dimmed_lamp\nname: dl1\ndescription: Living\nchannel: 20\nfull_scale: 255")
            .build()
            .unwrap();
        assert_eq!(lamp.name().as_str(), "dl1");
        assert_eq!(lamp.block_type(), "dimmed_lamp");
        assert_eq!(lamp.category(), BlockCategory::Actuator);

        let timer = parse("type: timer\nname: night\non: \"22:00\"\noff: \"06:30\"")
            .build()
            .unwrap();
        assert_eq!(timer.category(), BlockCategory::Controller);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = parse(
            "type: light_sensor\nname: lux\nchannel: 3\nlow_threshold: 900\nhigh_threshold: 100",
        );
        assert!(config.build().is_err());
    }

    #[test]
    fn test_negative_full_scale_rejected() {
        let config = parse("type: dimmed_lamp\nname: dl1\nchannel: 20\nfull_scale: -1");
        assert!(matches!(
            config.build(),
            Err(crate::ConfigError::Wiring(ConfigurationError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_bad_name_rejected() {
        let config = parse("type: sun_wind\nname: \"\"");
        assert!(matches!(
            config.build(),
            Err(crate::ConfigError::Wiring(ConfigurationError::InvalidName { .. }))
        ));
    }

    #[test]
    fn test_unknown_type_is_parse_error() {
        let result: Result<BlockConfig, _> = serde_yaml::from_str("type: toaster\nname: t1");
        assert!(result.is_err());
    }
}
