use orbitwalk_common::RigConfig;
use serde::{Deserialize, Serialize};

/// Phase of the single jump arc.
///
/// The ground plane is displaced instead of the camera, so "rising" means the
/// ground moves down toward the peak threshold and "falling" means it moves
/// back up to its resting height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JumpPhase {
    #[default]
    Grounded,
    Ascending,
    Descending,
}

/// Jump state machine driving the ground height at a fixed rate per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jump {
    phase: JumpPhase,
    resting_y: f32,
    peak_y: f32,
    rate: f32,
}

impl Jump {
    /// Grounded jump whose band runs from the resting height down to the peak.
    pub fn new(config: &RigConfig) -> Self {
        Self {
            phase: JumpPhase::Grounded,
            resting_y: config.ground.starting_y,
            peak_y: config.jump_peak_y(),
            rate: config.jump.rate,
        }
    }

    /// Current phase of the arc.
    pub fn phase(&self) -> JumpPhase {
        self.phase
    }

    /// `true` when no jump is in flight; only then is a new jump accepted.
    pub fn is_grounded(&self) -> bool {
        self.phase == JumpPhase::Grounded
    }

    /// Ground height at the apex. Below the resting height.
    pub fn peak_y(&self) -> f32 {
        self.peak_y
    }

    /// Ground height the arc starts from and lands on.
    pub fn resting_y(&self) -> f32 {
        self.resting_y
    }

    /// Start a jump. Ignored (returns `false`) unless grounded.
    pub fn request(&mut self) -> bool {
        if !self.is_grounded() {
            tracing::trace!(phase = ?self.phase, "jump request ignored");
            return false;
        }
        self.phase = JumpPhase::Ascending;
        tracing::debug!("jump started");
        true
    }

    /// One frame of the arc. Returns the new phase when a transition happened.
    ///
    /// Movement is clamped to the peak and resting heights so the ground never
    /// leaves that band while airborne.
    pub fn update(&mut self, ground_y: &mut f32) -> Option<JumpPhase> {
        let next = match self.phase {
            JumpPhase::Grounded => return None,
            JumpPhase::Ascending => {
                if *ground_y > self.peak_y {
                    *ground_y = (*ground_y - self.rate).max(self.peak_y);
                    return None;
                }
                JumpPhase::Descending
            }
            JumpPhase::Descending => {
                if *ground_y < self.resting_y {
                    *ground_y = (*ground_y + self.rate).min(self.resting_y);
                    return None;
                }
                JumpPhase::Grounded
            }
        };
        tracing::debug!(from = ?self.phase, to = ?next, ground_y = *ground_y, "jump phase");
        self.phase = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump() -> (Jump, f32) {
        let config = RigConfig::default();
        (Jump::new(&config), config.ground.starting_y)
    }

    #[test]
    fn grounded_update_is_noop() {
        let (mut j, mut y) = jump();
        assert_eq!(j.update(&mut y), None);
        assert_eq!(y, -30.0);
    }

    #[test]
    fn full_arc_frame_by_frame() {
        let (mut j, mut y) = jump();
        assert!(j.request());
        assert_eq!(j.phase(), JumpPhase::Ascending);

        for frame in 1..=30 {
            assert_eq!(j.update(&mut y), None);
            assert_eq!(y, -30.0 - frame as f32);
        }
        assert_eq!(y, -60.0);
        assert_eq!(j.update(&mut y), Some(JumpPhase::Descending));
        assert_eq!(y, -60.0);

        for frame in 1..=30 {
            assert_eq!(j.update(&mut y), None);
            assert_eq!(y, -60.0 + frame as f32);
        }
        assert_eq!(j.update(&mut y), Some(JumpPhase::Grounded));
        assert_eq!(y, -30.0);
        assert!(j.is_grounded());
    }

    #[test]
    fn second_request_while_airborne_is_noop() {
        let (mut j, mut y) = jump();
        assert!(j.request());
        j.update(&mut y);
        assert!(!j.request());
        assert_eq!(j.phase(), JumpPhase::Ascending);

        while j.phase() == JumpPhase::Ascending {
            j.update(&mut y);
        }
        assert!(!j.request());
        assert_eq!(j.phase(), JumpPhase::Descending);
    }

    #[test]
    fn fractional_start_stays_in_band() {
        let (mut j, _) = jump();
        let mut y = -25.4;
        j.request();
        let mut frames = 0;
        while !(j.is_grounded() && frames > 0) {
            j.update(&mut y);
            assert!(y >= j.peak_y() - 1e-4, "y={y}");
            if j.phase() == JumpPhase::Descending {
                assert!(y <= j.resting_y() + 1e-4, "y={y}");
            }
            frames += 1;
            assert!(frames < 200);
        }
        assert_eq!(y, -30.0);
    }
}
