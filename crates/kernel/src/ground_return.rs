use orbitwalk_common::{GroundPose, RigConfig};
use std::time::Duration;

/// Walks the ground back down to its resting height after a stride ends.
///
/// Runs as a timed task on the frame scheduler: each tick lowers the ground
/// by one step and asks to be re-armed after `interval`, until the ground is
/// no longer above its resting height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundReturn {
    resting_y: f32,
    step: f32,
    interval: Duration,
}

impl GroundReturn {
    pub fn new(config: &RigConfig) -> Self {
        Self {
            resting_y: config.ground.starting_y,
            step: config.ground_return.step,
            interval: config.ground_return_interval(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One tick. Returns `true` if the task should run again.
    pub fn tick(&self, ground: &mut GroundPose) -> bool {
        let y = &mut ground.position.y;
        if *y > self.resting_y {
            *y = (*y - self.step).max(self.resting_y);
            true
        } else {
            false
        }
    }

    /// Ticks that lower the ground when starting from `ground_y`.
    pub fn ticks_needed(&self, ground_y: f32) -> u32 {
        if ground_y <= self.resting_y {
            0
        } else {
            ((ground_y - self.resting_y) / self.step).ceil() as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(ret: &GroundReturn, ground: &mut GroundPose) -> u32 {
        let mut lowering = 0;
        while ret.tick(ground) {
            lowering += 1;
            assert!(lowering < 10_000);
        }
        lowering
    }

    #[test]
    fn nothing_to_do_at_rest() {
        let ret = GroundReturn::new(&RigConfig::default());
        let mut ground = GroundPose::at_height(-30.0);
        assert!(!ret.tick(&mut ground));
        assert_eq!(ground.position.y, -30.0);
        assert_eq!(ret.ticks_needed(-30.0), 0);
    }

    #[test]
    fn below_rest_is_left_alone() {
        let ret = GroundReturn::new(&RigConfig::default());
        let mut ground = GroundPose::at_height(-45.0);
        assert!(!ret.tick(&mut ground));
        assert_eq!(ground.position.y, -45.0);
    }

    #[test]
    fn lowers_one_unit_per_tick_to_rest() {
        let ret = GroundReturn::new(&RigConfig::default());
        let mut ground = GroundPose::at_height(-26.0);
        assert!(ret.tick(&mut ground));
        assert_eq!(ground.position.y, -27.0);
        assert_eq!(run(&ret, &mut ground), 3);
        assert_eq!(ground.position.y, -30.0);
    }

    #[test]
    fn fractional_drift_takes_ceiling_ticks() {
        let ret = GroundReturn::new(&RigConfig::default());
        let start = -30.0 + 4.3;
        let mut ground = GroundPose::at_height(start);
        assert_eq!(ret.ticks_needed(start), 5);
        assert_eq!(run(&ret, &mut ground), 5);
        assert_eq!(ground.position.y, -30.0);
    }

    #[test]
    fn interval_is_ten_ms() {
        let ret = GroundReturn::new(&RigConfig::default());
        assert_eq!(ret.interval(), Duration::from_millis(10));
    }
}
