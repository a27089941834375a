//! End-to-end behavior of wired block graphs over simulated hardware

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, TimeZone};
use dom_blocks::actuators::{DimmedLamp, DimmedLampSettings, Lamp};
use dom_blocks::controllers::Timer;
use dom_blocks::sensors::{DimmerSwitch, DimmerSwitchSettings, Switch};
use dom_blocks::timing::{ClickSettings, DailySchedule};
use dom_blocks::{
    Block, BlockCategory, BlockContext, BlockError, BlockInfo, BlockResult, EventListener,
    Tickable,
};
use dom_core::{BlockName, ConfigurationError, EventType, RememberedOutput};
use dom_hardware::{Channel, SimulatedHardware};
use dom_runtime::{
    ChannelListener, Runtime, RuntimeBuilder, RuntimeError, RuntimeSettings, Scheduler,
    SchedulerSettings, SchedulerState,
};

const SWITCH: u32 = 0;
const LAMP: u32 = 10;
const DIM_DOWN: u32 = 1;
const DIM_UP: u32 = 2;
const DIMMER: u32 = 20;

fn info(name: &str) -> BlockInfo {
    BlockInfo::new(BlockName::new(name).unwrap(), format!("{name} under test"))
}

fn t0() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 4, 20, 0, 0)
        .single()
        .unwrap()
}

fn after(millis: i64) -> DateTime<Local> {
    t0() + Duration::milliseconds(millis)
}

fn switch(name: &str, settings: ClickSettings) -> Switch {
    Switch::new(info(name), Channel::from(SWITCH), settings)
}

fn lamp(name: &str) -> Lamp {
    Lamp::new(info(name), Channel::from(LAMP))
}

fn start(builder: RuntimeBuilder) -> (Runtime, SimulatedHardware) {
    let hw = SimulatedHardware::new();
    let runtime = builder.build(Box::new(hw.clone()));
    runtime.initialize(&HashMap::new()).unwrap();
    (runtime, hw)
}

fn dimmer_graph() -> RuntimeBuilder {
    let mut builder = RuntimeBuilder::new();
    builder
        .add(DimmerSwitch::new(
            info("dimSwitch"),
            Channel::from(DIM_DOWN),
            Channel::from(DIM_UP),
            DimmerSwitchSettings { click_ms: 500 },
        ))
        .unwrap();
    builder
        .add(DimmedLamp::new(
            info("dl1"),
            Channel::from(DIMMER),
            DimmedLampSettings::default(),
        ))
        .unwrap();
    for event in [
        EventType::On,
        EventType::Off,
        EventType::Up,
        EventType::Down,
        EventType::Stop,
        EventType::Full,
    ] {
        builder
            .connect("dimSwitch", event, "dl1", event, event.alias())
            .unwrap();
    }
    builder
}

#[test]
fn test_single_click_toggles_lamp() {
    let mut builder = RuntimeBuilder::new();
    builder.add(switch("sw", ClickSettings::default())).unwrap();
    builder.add(lamp("lamp")).unwrap();
    builder
        .connect("sw", EventType::SingleClick, "lamp", EventType::Toggle, "toggle")
        .unwrap();
    let (runtime, hw) = start(builder);

    hw.set_digital_input(SWITCH, true);
    runtime.tick(after(1)).unwrap();
    hw.set_digital_input(SWITCH, false);
    runtime.tick(after(60)).unwrap();

    assert_eq!(hw.digital_output(LAMP), Some(true));
}

fn long_click_all_off(release_after: i64) -> Option<bool> {
    let settings = ClickSettings {
        single_click: false,
        long_click: true,
        long_click_ms: 100,
        ..ClickSettings::default()
    };
    let mut builder = RuntimeBuilder::new();
    builder.add(switch("allOff", settings)).unwrap();
    builder.add(lamp("lamp")).unwrap();
    builder
        .connect("allOff", EventType::LongClick, "lamp", EventType::Off, "all off")
        .unwrap();
    let (runtime, hw) = start(builder);

    runtime.submit_ui_action("lamp", "on").unwrap();
    runtime.tick(t0()).unwrap();
    assert_eq!(hw.digital_output(LAMP), Some(true));

    hw.set_digital_input(SWITCH, true);
    runtime.tick(after(1)).unwrap();
    hw.set_digital_input(SWITCH, false);
    runtime.tick(after(1 + release_after)).unwrap();

    hw.digital_output(LAMP)
}

#[test]
fn test_long_click_turns_all_off() {
    assert_eq!(long_click_all_off(120), Some(false));
}

#[test]
fn test_short_press_is_not_a_long_click() {
    assert_eq!(long_click_all_off(99), Some(true));
}

#[test]
fn test_dimmer_initializes_to_half_scale() {
    let (_runtime, hw) = start(dimmer_graph());
    assert_eq!(hw.analog_output(DIMMER), Some(512));
}

#[test]
fn test_dimmer_switch_combo_sets_full() {
    let (runtime, hw) = start(dimmer_graph());

    hw.set_digital_input(DIM_DOWN, true);
    runtime.tick(after(1)).unwrap();
    hw.set_digital_input(DIM_UP, true);
    runtime.tick(after(2)).unwrap();
    hw.set_digital_input(DIM_UP, false);
    runtime.tick(after(3)).unwrap();

    assert_eq!(hw.analog_output(DIMMER), Some(1024));
}

#[test]
fn test_hold_up_dims_and_release_holds_level() {
    let (runtime, hw) = start(dimmer_graph());

    runtime.submit_ui_action("dl1", "off").unwrap();
    runtime.tick(t0()).unwrap();
    assert_eq!(hw.analog_output(DIMMER), Some(0));

    hw.set_digital_input(DIM_UP, true);
    runtime.tick(after(1)).unwrap();
    runtime.tick(after(502)).unwrap();
    runtime.tick(after(1502)).unwrap();
    let dimmed = hw.analog_output(DIMMER).unwrap();
    assert_eq!(dimmed, 341);

    hw.set_digital_input(DIM_UP, false);
    runtime.tick(after(1600)).unwrap();
    let released = hw.analog_output(DIMMER).unwrap();
    assert!(released >= dimmed);

    runtime.tick(after(3000)).unwrap();
    assert_eq!(hw.analog_output(DIMMER), Some(released));
}

fn fan_out(first: EventType, second: EventType) -> Option<bool> {
    let mut builder = RuntimeBuilder::new();
    builder.add(switch("sw", ClickSettings::default())).unwrap();
    builder.add(lamp("lamp")).unwrap();
    builder
        .connect("sw", EventType::SingleClick, "lamp", first, "X")
        .unwrap();
    builder
        .connect("sw", EventType::SingleClick, "lamp", second, "Y")
        .unwrap();
    let (runtime, hw) = start(builder);

    hw.set_digital_input(SWITCH, true);
    runtime.tick(after(1)).unwrap();
    hw.set_digital_input(SWITCH, false);
    runtime.tick(after(60)).unwrap();
    hw.digital_output(LAMP)
}

#[test]
fn test_fan_out_last_connector_wins() {
    assert_eq!(fan_out(EventType::On, EventType::Off), Some(false));
    assert_eq!(fan_out(EventType::Off, EventType::On), Some(true));
}

#[test]
fn test_loop_sequence_counts_ticks() {
    let mut builder = RuntimeBuilder::new();
    builder.add(lamp("lamp")).unwrap();
    let (runtime, _hw) = start(builder);
    assert_eq!(runtime.loop_sequence(), 0);

    for i in 1..=25u64 {
        assert_eq!(runtime.tick(after(i as i64 * 50)).unwrap(), i);
    }
    assert_eq!(runtime.loop_sequence(), 25);
}

#[test]
fn test_registration_errors() {
    let mut builder = RuntimeBuilder::new();
    builder.add(lamp("lamp")).unwrap();
    builder.add(switch("sw", ClickSettings::default())).unwrap();

    assert!(matches!(
        builder.add(lamp("lamp")),
        Err(ConfigurationError::DuplicateBlock { .. })
    ));
    assert!(matches!(
        builder.connect("sw", EventType::SingleClick, "ghost", EventType::On, ""),
        Err(ConfigurationError::UnknownBlock { .. })
    ));
    assert!(matches!(
        builder.connect("lamp", EventType::On, "sw", EventType::On, ""),
        Err(ConfigurationError::NotAListener { .. })
    ));
    assert!(matches!(
        builder.connect("sw", EventType::SingleClick, "lamp", EventType::Up, ""),
        Err(ConfigurationError::NotAListener { .. })
    ));
    assert_eq!(builder.len(), 2);
}

#[test]
fn test_outputs_survive_restart() {
    let (runtime, _hw) = start(dimmer_graph());
    runtime.submit_ui_action("dl1", "full").unwrap();
    runtime.tick(t0()).unwrap();
    runtime.submit_ui_action("dl1", "off").unwrap();
    runtime.tick(after(50)).unwrap();

    let saved: HashMap<String, RememberedOutput> = runtime
        .actuator_outputs()
        .unwrap()
        .into_iter()
        .map(|o| (o.block_name.clone(), o))
        .collect();
    assert_eq!(saved["dl1"].values, vec![0, 1024]);

    let hw = SimulatedHardware::new();
    let restarted = dimmer_graph().build(Box::new(hw.clone()));
    restarted.initialize(&saved).unwrap();
    assert_eq!(hw.analog_output(DIMMER), Some(0));
    assert_eq!(
        restarted.actuator_outputs().unwrap(),
        runtime.actuator_outputs().unwrap()
    );

    restarted.submit_ui_action("dl1", "toggle").unwrap();
    restarted.tick(after(100)).unwrap();
    assert_eq!(hw.analog_output(DIMMER), Some(1024));
}

#[test]
fn test_listeners_notified_every_nth_tick() {
    let mut builder = RuntimeBuilder::with_settings(RuntimeSettings {
        notify_every: 5,
        ..RuntimeSettings::default()
    });
    builder.add(lamp("lamp")).unwrap();
    let (runtime, _hw) = start(builder);

    let (listener, mut rx) = ChannelListener::new(8);
    runtime.subscribe(Arc::new(listener));

    runtime.submit_ui_action("lamp", "toggle").unwrap();
    for i in 1..=4 {
        runtime.tick(after(i * 50)).unwrap();
    }
    assert!(rx.try_recv().is_err());

    runtime.tick(after(250)).unwrap();
    let snapshot = rx.try_recv().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].name, "lamp");
    assert_eq!(snapshot[0].state, "on");
    assert_eq!(runtime.snapshot()[0].state, "on");

    drop(rx);
    for i in 6..=10 {
        runtime.tick(after(i * 50)).unwrap();
    }
    assert_eq!(runtime.listener_count(), 0);
}

#[test]
fn test_ui_action_validation() {
    let mut builder = RuntimeBuilder::new();
    builder.add(lamp("lamp")).unwrap();
    let (runtime, _hw) = start(builder);

    assert!(matches!(
        runtime.submit_ui_action("ghost", "on"),
        Err(RuntimeError::Configuration(ConfigurationError::UnknownBlock { .. }))
    ));
    assert!(matches!(
        runtime.submit_ui_action("lamp", "sideways"),
        Err(RuntimeError::Configuration(ConfigurationError::UnknownEvent(_)))
    ));
    assert!(matches!(
        runtime.submit_ui_action("lamp", "up"),
        Err(RuntimeError::UnsupportedAction { .. })
    ));
    assert!(runtime.submit_ui_action("lamp", "ON").is_ok());
}

#[test]
fn test_channel_fault_requests_restart() {
    let mut builder = RuntimeBuilder::new();
    builder.add(lamp("lamp")).unwrap();
    let (runtime, hw) = start(builder);

    hw.break_link();
    let err = runtime.tick(after(50)).unwrap_err();
    assert!(err.is_channel_fault());
    assert!(runtime.is_restart_requested());

    hw.repair_link();
    runtime.initialize(&HashMap::new()).unwrap();
    assert!(!runtime.is_restart_requested());
    assert_eq!(hw.initialize_count(), 2);
}

#[test]
fn test_timer_drives_lamp() {
    let mut builder = RuntimeBuilder::new();
    let schedule = DailySchedule::new("08:00".parse().unwrap(), "18:00".parse().unwrap());
    builder.add(Timer::new(info("dayTimer"), schedule)).unwrap();
    builder.add(lamp("porch")).unwrap();
    builder
        .connect("dayTimer", EventType::On, "porch", EventType::On, "day")
        .unwrap();
    builder
        .connect("dayTimer", EventType::Off, "porch", EventType::Off, "night")
        .unwrap();
    let (runtime, hw) = start(builder);

    let day = |h, m| {
        Local
            .with_ymd_and_hms(2024, 3, 4, h, m, 0)
            .single()
            .unwrap()
    };
    runtime.tick(day(7, 59)).unwrap();
    assert_eq!(hw.digital_output(LAMP), Some(false));
    runtime.tick(day(8, 1)).unwrap();
    assert_eq!(hw.digital_output(LAMP), Some(true));
    runtime.tick(day(18, 1)).unwrap();
    assert_eq!(hw.digital_output(LAMP), Some(false));
}

/// Listener that answers every event with another ON, for cycle detection
struct Echo {
    info: BlockInfo,
}

impl Tickable for Echo {
    fn tick(&mut self, _ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        Ok(())
    }
}

impl EventListener for Echo {
    fn on_event(&mut self, _event: EventType, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        ctx.emit(EventType::On);
        Ok(())
    }
}

impl Block for Echo {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Controller
    }

    fn block_type(&self) -> &'static str {
        "echo"
    }

    fn accepted_events(&self) -> &'static [EventType] {
        &[EventType::On]
    }

    fn as_listener(&mut self) -> Option<&mut dyn EventListener> {
        Some(self)
    }
}

#[test]
fn test_wiring_cycle_hits_depth_guard() {
    let mut builder = RuntimeBuilder::with_settings(RuntimeSettings {
        max_dispatch_depth: 8,
        ..RuntimeSettings::default()
    });
    builder.add(Echo { info: info("ping") }).unwrap();
    builder.add(Echo { info: info("pong") }).unwrap();
    builder
        .connect("ping", EventType::On, "pong", EventType::On, "")
        .unwrap();
    builder
        .connect("pong", EventType::On, "ping", EventType::On, "")
        .unwrap();
    let (runtime, _hw) = start(builder);

    runtime.submit_ui_action("ping", "on").unwrap();
    let err = runtime.tick(t0()).unwrap_err();
    assert!(matches!(err, RuntimeError::DispatchDepth { depth: 9, .. }));
    assert!(runtime.is_restart_requested());
}

/// Actuator-category block that fails every tick once it has seen an ON,
/// passing the ON on first
struct Jammed {
    info: BlockInfo,
    jammed: bool,
}

impl Tickable for Jammed {
    fn tick(&mut self, _ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        if self.jammed {
            return Err(BlockError::Logic {
                block: self.info.name.to_string(),
                reason: "motor jammed".to_string(),
            });
        }
        Ok(())
    }
}

impl EventListener for Jammed {
    fn on_event(&mut self, _event: EventType, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        self.jammed = true;
        ctx.emit(EventType::On);
        Ok(())
    }
}

impl Block for Jammed {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Actuator
    }

    fn block_type(&self) -> &'static str {
        "jammed"
    }

    fn accepted_events(&self) -> &'static [EventType] {
        &[EventType::On]
    }

    fn as_listener(&mut self) -> Option<&mut dyn EventListener> {
        Some(self)
    }
}

#[test]
fn test_block_failure_drops_buffered_outputs() {
    let mut builder = RuntimeBuilder::new();
    builder.add(lamp("hall")).unwrap();
    builder
        .add(Jammed {
            info: info("screen"),
            jammed: false,
        })
        .unwrap();
    builder
        .connect("screen", EventType::On, "hall", EventType::On, "")
        .unwrap();
    let (runtime, hw) = start(builder);
    runtime.tick(after(50)).unwrap();
    let committed = hw.output_refresh_count();

    // hall buffers its ON during its tick, then screen fails
    runtime.submit_ui_action("screen", "on").unwrap();
    let err = runtime.tick(after(100)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Block {
            source: BlockError::Logic { .. },
            ..
        }
    ));
    assert!(!err.is_channel_fault());
    assert!(runtime.is_restart_requested());
    assert_eq!(hw.output_refresh_count(), committed);

    assert!(runtime.tick(after(150)).is_err());
    assert_eq!(hw.digital_output(LAMP), Some(false));
}

#[test]
fn test_scheduler_halts_on_block_failure() {
    let mut builder = RuntimeBuilder::with_settings(RuntimeSettings {
        max_dispatch_depth: 8,
        ..RuntimeSettings::default()
    });
    builder.add(lamp("hall")).unwrap();
    builder.add(Echo { info: info("ping") }).unwrap();
    builder.add(Echo { info: info("pong") }).unwrap();
    builder
        .connect("ping", EventType::On, "hall", EventType::On, "")
        .unwrap();
    builder
        .connect("ping", EventType::On, "pong", EventType::On, "")
        .unwrap();
    builder
        .connect("pong", EventType::On, "ping", EventType::On, "")
        .unwrap();
    let (runtime, hw) = start(builder);

    let mut scheduler = Scheduler::new(
        runtime.clone(),
        SchedulerSettings {
            tick_period_ms: 5,
            join_timeout_ms: 1000,
        },
    );
    scheduler.start().unwrap();

    let deadline = std::time::Instant::now() + StdDuration::from_secs(5);
    while runtime.loop_sequence() < 3 && std::time::Instant::now() < deadline {
        std::thread::sleep(StdDuration::from_millis(5));
    }
    assert_eq!(scheduler.state(), SchedulerState::Running);

    runtime.submit_ui_action("ping", "on").unwrap();
    while scheduler.state() == SchedulerState::Running && std::time::Instant::now() < deadline {
        std::thread::sleep(StdDuration::from_millis(5));
    }
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(runtime.is_restart_requested());

    let halted_at = runtime.loop_sequence();
    std::thread::sleep(StdDuration::from_millis(50));
    assert_eq!(runtime.loop_sequence(), halted_at);
    assert_eq!(hw.digital_output(LAMP), Some(false));

    assert!(scheduler.stop());
}

#[test]
fn test_scheduler_ticks_until_stopped() {
    let mut builder = RuntimeBuilder::new();
    builder.add(lamp("lamp")).unwrap();
    let (runtime, _hw) = start(builder);

    let mut scheduler = Scheduler::new(
        runtime.clone(),
        SchedulerSettings {
            tick_period_ms: 5,
            join_timeout_ms: 1000,
        },
    );
    scheduler.start().unwrap();
    assert!(matches!(scheduler.start(), Err(RuntimeError::SchedulerRunning)));

    let deadline = std::time::Instant::now() + StdDuration::from_secs(5);
    while runtime.loop_sequence() < 3 && std::time::Instant::now() < deadline {
        std::thread::sleep(StdDuration::from_millis(5));
    }
    assert!(runtime.loop_sequence() >= 3);

    assert!(scheduler.stop());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    let stopped_at = runtime.loop_sequence();
    std::thread::sleep(StdDuration::from_millis(30));
    assert_eq!(runtime.loop_sequence(), stopped_at);
}
