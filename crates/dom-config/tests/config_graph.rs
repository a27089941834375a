//! Configuration files turned into running block graphs

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, TimeZone};
use dom_config::{load_config, ConfigError, DomoticConfig};
use dom_core::ConfigurationError;
use dom_hardware::SimulatedHardware;
use tempfile::TempDir;

const HALL_CONFIG: &str = r#"
runtime:
  tick_period_ms: 25
  notify_every: 5
snapshot:
  path: states/hall.json
blocks:
  - type: switch
    name: hallSwitch
    description: Switch next to the front door
    channel: 0
  - type: lamp
    name: hall
    description: Hall ceiling
    channel: 10
  - type: dimmer_switch
    name: dimSwitch
    down_channel: 1
    up_channel: 2
  - type: dimmed_lamp
    name: living
    channel: 20
    full_dim_ms: 3000
wiring:
  - { src: hallSwitch, event: SingleClick, target: hall, action: toggle }
  - { src: dimSwitch, event: "on", target: living, action: "on", label: dimmer on }
  - { src: dimSwitch, event: "off", target: living, action: "off" }
"#;

fn after(millis: i64) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 4, 20, 0, 0)
        .single()
        .unwrap()
        + Duration::milliseconds(millis)
}

#[test]
fn test_load_and_run_hall_graph() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("domotic.yaml");
    std::fs::write(&path, HALL_CONFIG).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.blocks.len(), 4);
    assert_eq!(config.scheduler_settings().tick_period_ms, 25);
    assert_eq!(config.snapshot.path.to_str(), Some("states/hall.json"));

    let hw = SimulatedHardware::new();
    let runtime = config
        .runtime_builder()
        .unwrap()
        .build(Box::new(hw.clone()));
    assert_eq!(runtime.settings().notify_every, 5);
    assert_eq!(
        runtime.block_names().collect::<Vec<_>>(),
        vec!["hallSwitch", "hall", "dimSwitch", "living"]
    );

    runtime.initialize(&HashMap::new()).unwrap();
    hw.set_digital_input(0u32, true);
    runtime.tick(after(1)).unwrap();
    hw.set_digital_input(0u32, false);
    runtime.tick(after(60)).unwrap();

    assert_eq!(hw.digital_output(10u32), Some(true));
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let result = load_config(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let result = "blocks: [ { type: lamp".parse::<DomoticConfig>();
    assert!(matches!(result, Err(ConfigError::ParseYaml { .. })));
}

#[test]
fn test_wiring_to_unknown_block() {
    let config: DomoticConfig = r#"
blocks:
  - { type: switch, name: sw, channel: 0 }
wiring:
  - { src: sw, event: SingleClick, target: ghost, action: toggle }
"#
    .parse()
    .unwrap();

    match config.runtime_builder() {
        Err(ConfigError::Wiring(ConfigurationError::UnknownBlock { name, context })) => {
            assert_eq!(name, "ghost");
            assert_eq!(context, "connector target");
        }
        other => panic!("expected unknown block, got {:?}", other.err()),
    }
}

#[test]
fn test_duplicate_block_name() {
    let config: DomoticConfig = r#"
blocks:
  - { type: lamp, name: hall, channel: 10 }
  - { type: lamp, name: hall, channel: 11 }
"#
    .parse()
    .unwrap();

    assert!(matches!(
        config.runtime_builder(),
        Err(ConfigError::Wiring(ConfigurationError::DuplicateBlock { .. }))
    ));
}

#[test]
fn test_action_the_target_does_not_accept() {
    let config: DomoticConfig = r#"
blocks:
  - { type: switch, name: sw, channel: 0 }
  - { type: lamp, name: hall, channel: 10 }
wiring:
  - { src: sw, event: SingleClick, target: hall, action: full }
"#
    .parse()
    .unwrap();

    assert!(matches!(
        config.runtime_builder(),
        Err(ConfigError::Wiring(ConfigurationError::NotAListener { .. }))
    ));
}
