//! Day/night timer emitting ON and OFF at scheduled times of day

use dom_core::{EventType, UiState};
use tracing::info;

use crate::timing::{DailySchedule, DailyTimer};
use crate::{Block, BlockCategory, BlockContext, BlockInfo, BlockResult, Tickable, UiExposable};

pub struct Timer {
    info: BlockInfo,
    timer: DailyTimer,
}

impl Timer {
    pub fn new(info: BlockInfo, schedule: DailySchedule) -> Self {
        Self {
            info,
            timer: DailyTimer::new(schedule),
        }
    }

    pub fn is_on(&self) -> bool {
        self.timer.is_on()
    }
}

impl Tickable for Timer {
    fn tick(&mut self, ctx: &mut BlockContext<'_>) -> BlockResult<()> {
        if let Some(on) = self.timer.update(ctx.now()) {
            let event = if on { EventType::On } else { EventType::Off };
            info!(block = %self.info.name, event = %event, "Timer switched");
            ctx.emit(event);
        }
        Ok(())
    }
}

impl UiExposable for Timer {
    fn ui_state(&self) -> UiState {
        let schedule = self.timer.schedule();
        UiState::new(
            self.info.name.as_str(),
            "timer",
            &self.info.description,
            if self.timer.is_on() { "on" } else { "off" },
        )
        .with_attribute("on_time", schedule.on.to_string())
        .with_attribute("off_time", schedule.off.to_string())
    }
}

impl Block for Timer {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Controller
    }

    fn block_type(&self) -> &'static str {
        "timer"
    }

    fn as_ui(&self) -> Option<&dyn UiExposable> {
        Some(self)
    }
}
