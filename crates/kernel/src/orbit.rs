use glam::Vec3;
use orbitwalk_common::OrbitConfig;
use orbitwalk_input::{Action, InputState};

/// Spherical orbit angles around the fixed look-at point, in degrees.
///
/// `theta` is the polar angle measured down from +Y and is clamped away from
/// the poles so the look-at basis never degenerates. `phi` is the azimuth
/// around +Y and is left unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    theta: f32,
    phi: f32,
    radius: f32,
    speed: f32,
    theta_min: f32,
    theta_max: f32,
}

impl Orbit {
    /// Start at the configured angles, with `initial_theta` pulled inside the limits.
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            theta: config
                .initial_theta
                .clamp(config.theta_min, config.theta_max),
            phi: config.initial_phi,
            radius: config.radius,
            speed: config.rotation_speed,
            theta_min: config.theta_min,
            theta_max: config.theta_max,
        }
    }

    /// Polar angle in degrees, within `[theta_min, theta_max]`.
    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Azimuth in degrees. Not wrapped.
    pub fn phi(&self) -> f32 {
        self.phi
    }

    /// Distance from the look-at point.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// [`Orbit::theta`] in radians.
    pub fn theta_radians(&self) -> f32 {
        self.theta.to_radians()
    }

    /// [`Orbit::phi`] in radians.
    pub fn phi_radians(&self) -> f32 {
        self.phi.to_radians()
    }

    /// Apply one frame of look input and clamp `theta`.
    pub fn apply(&mut self, input: &InputState) {
        if input.is_pressed(Action::LookUp) {
            self.theta += self.speed;
        }
        if input.is_pressed(Action::LookDown) {
            self.theta -= self.speed;
        }
        if input.is_pressed(Action::LookLeft) {
            self.phi += self.speed;
        }
        if input.is_pressed(Action::LookRight) {
            self.phi -= self.speed;
        }
        self.theta = self.theta.clamp(self.theta_min, self.theta_max);
    }

    /// Cartesian eye position on the orbit sphere, before any bobbing.
    pub fn eye(&self) -> Vec3 {
        let (sin_t, cos_t) = self.theta_radians().sin_cos();
        let (sin_p, cos_p) = self.phi_radians().sin_cos();
        Vec3::new(
            self.radius * sin_t * sin_p,
            self.radius * cos_t,
            self.radius * sin_t * cos_p,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(actions: &[Action]) -> InputState {
        let mut input = InputState::new();
        for &a in actions {
            input.set_action(a, true);
        }
        input
    }

    #[test]
    fn starts_looking_straight_ahead() {
        let orbit = Orbit::new(&OrbitConfig::default());
        assert_eq!(orbit.theta(), 90.0);
        assert_eq!(orbit.phi(), 0.0);
        let eye = orbit.eye();
        assert!(eye.x.abs() < 1e-5);
        assert!(eye.y.abs() < 1e-5);
        assert!((eye.z - 10.0).abs() < 1e-5);
    }

    #[test]
    fn look_actions_step_one_degree() {
        let mut orbit = Orbit::new(&OrbitConfig::default());
        orbit.apply(&held(&[Action::LookUp, Action::LookLeft]));
        assert_eq!(orbit.theta(), 91.0);
        assert_eq!(orbit.phi(), 1.0);
        orbit.apply(&held(&[Action::LookDown, Action::LookRight]));
        assert_eq!(orbit.theta(), 90.0);
        assert_eq!(orbit.phi(), 0.0);
    }

    #[test]
    fn theta_clamped_at_both_poles() {
        let mut orbit = Orbit::new(&OrbitConfig::default());
        let up = held(&[Action::LookUp]);
        for _ in 0..500 {
            orbit.apply(&up);
        }
        assert_eq!(orbit.theta(), 179.9);

        let down = held(&[Action::LookDown]);
        for _ in 0..500 {
            orbit.apply(&down);
        }
        assert_eq!(orbit.theta(), 0.1);
    }

    #[test]
    fn theta_bounded_for_mixed_sequences() {
        let mut orbit = Orbit::new(&OrbitConfig::default());
        let patterns = [
            held(&[Action::LookUp]),
            held(&[Action::LookDown, Action::LookLeft]),
            held(&[Action::LookUp, Action::LookDown]),
            held(&[Action::LookRight]),
        ];
        for i in 0..2_000 {
            // Long runs in one direction interleaved with short reversals.
            let p = &patterns[(i / 137 + i % 3) % patterns.len()];
            orbit.apply(p);
            assert!((0.1..=179.9).contains(&orbit.theta()), "theta={}", orbit.theta());
        }
    }

    #[test]
    fn phi_is_unbounded() {
        let mut orbit = Orbit::new(&OrbitConfig::default());
        let left = held(&[Action::LookLeft]);
        for _ in 0..720 {
            orbit.apply(&left);
        }
        assert_eq!(orbit.phi(), 720.0);
        // A full turn brings the eye back around.
        let eye = orbit.eye();
        assert!((eye.z - 10.0).abs() < 1e-3);
    }

    #[test]
    fn eye_stays_on_sphere() {
        let mut orbit = Orbit::new(&OrbitConfig::default());
        let input = held(&[Action::LookUp, Action::LookLeft]);
        for _ in 0..100 {
            orbit.apply(&input);
            assert!((orbit.eye().length() - 10.0).abs() < 1e-3);
        }
    }
}
