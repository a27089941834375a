//! Linear dimming ramp between zero and full scale

use chrono::{DateTime, Local};

use crate::elapsed_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampDirection {
    Idle,
    Up,
    Down,
}

/// Integer ramp: a full sweep from 0 to `full_scale` takes `full_dim_ms`
#[derive(Debug, Clone)]
pub struct Ramp {
    full_scale: i32,
    full_dim_ms: u64,
    value: i32,
    direction: RampDirection,
    start_value: i32,
    start_time: Option<DateTime<Local>>,
}

impl Ramp {
    /// A negative `full_scale` is treated as zero
    pub fn new(full_scale: i32, full_dim_ms: u64, value: i32) -> Self {
        let full_scale = full_scale.max(0);
        Self {
            full_scale,
            full_dim_ms,
            value: value.clamp(0, full_scale),
            direction: RampDirection::Idle,
            start_value: 0,
            start_time: None,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn full_scale(&self) -> i32 {
        self.full_scale
    }

    pub fn direction(&self) -> RampDirection {
        self.direction
    }

    pub fn is_moving(&self) -> bool {
        self.direction != RampDirection::Idle
    }

    /// Jump to a value, stopping any ramp in progress
    pub fn set(&mut self, value: i32) {
        self.stop();
        self.value = value.clamp(0, self.full_scale);
    }

    pub fn start(&mut self, direction: RampDirection, now: DateTime<Local>) {
        if direction == RampDirection::Idle {
            self.stop();
            return;
        }
        self.direction = direction;
        self.start_value = self.value;
        self.start_time = Some(now);
    }

    pub fn stop(&mut self) {
        self.direction = RampDirection::Idle;
        self.start_time = None;
    }

    /// Advance to `now`; returns the new value if it changed
    ///
    /// The ramp stops by itself once it reaches either bound.
    pub fn update(&mut self, now: DateTime<Local>) -> Option<i32> {
        let start_time = self.start_time?;
        let elapsed = elapsed_ms(start_time, now).max(0);

        let delta = if self.full_dim_ms == 0 {
            i64::from(self.full_scale)
        } else {
            i64::from(self.full_scale) * elapsed / self.full_dim_ms as i64
        };
        let target = match self.direction {
            RampDirection::Up => i64::from(self.start_value) + delta,
            RampDirection::Down => i64::from(self.start_value) - delta,
            RampDirection::Idle => return None,
        };
        let target = target.clamp(0, i64::from(self.full_scale)) as i32;

        let reached_end = match self.direction {
            RampDirection::Up => target == self.full_scale,
            RampDirection::Down => target == 0,
            RampDirection::Idle => true,
        };
        if reached_end {
            self.stop();
        }
        if target == self.value {
            return None;
        }
        self.value = target;
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, ms};

    #[test]
    fn test_ramp_up_is_linear() {
        let t0 = at(20, 0);
        let mut ramp = Ramp::new(1024, 3000, 0);
        ramp.start(RampDirection::Up, t0);

        assert_eq!(ramp.update(t0), None);
        assert!(ramp.is_moving());
        assert_eq!(ramp.update(ms(t0, 1000)), Some(341));
        assert_eq!(ramp.update(ms(t0, 1000)), None);
        assert!(ramp.is_moving());
    }

    #[test]
    fn test_ramp_stops_at_bounds() {
        let t0 = at(20, 0);
        let mut ramp = Ramp::new(1024, 3000, 900);
        ramp.start(RampDirection::Up, t0);

        assert_eq!(ramp.update(ms(t0, 5000)), Some(1024));
        assert_eq!(ramp.direction(), RampDirection::Idle);
        assert_eq!(ramp.update(ms(t0, 6000)), None);

        ramp.start(RampDirection::Down, ms(t0, 6000));
        assert_eq!(ramp.update(ms(t0, 9000)), Some(0));
        assert!(!ramp.is_moving());
    }

    #[test]
    fn test_set_clamps_and_stops() {
        let t0 = at(20, 0);
        let mut ramp = Ramp::new(1024, 3000, 0);
        ramp.start(RampDirection::Up, t0);
        ramp.set(5000);
        assert_eq!(ramp.value(), 1024);
        assert!(!ramp.is_moving());
        ramp.set(-3);
        assert_eq!(ramp.value(), 0);
    }
}
