//! Rig configuration: every constant the integrator, scheduler and weapon mount use.
//!
//! Loadable from YAML (`.yaml`/`.yml`) or JSON (`.json`). Missing sections fall
//! back to the defaults, the standard rig tuning.

use glam::{Quat, Vec3};
use serde::{Deserialize, Deserializer, Serialize};
use std::f32::consts::{PI, TAU};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::Transform;

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Spherical orbit around the look-at point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub radius: f32,
    /// Degrees per frame while a look action is held.
    pub rotation_speed: f32,
    pub theta_min: f32,
    pub theta_max: f32,
    /// Starting polar angle in degrees; 90 looks straight ahead.
    pub initial_theta: f32,
    pub initial_phi: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            rotation_speed: 1.0,
            theta_min: 0.1,
            theta_max: 179.9,
            initial_theta: 90.0,
            initial_phi: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Ground displacement per frame per held movement action.
    pub move_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { move_speed: 2.0 }
    }
}

/// Sine oscillator parameters: phase step per sample (radians) and peak offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorConfig {
    pub step: f32,
    pub amplitude: f32,
}

impl OscillatorConfig {
    /// Slow idle sway applied every frame.
    pub fn breathing() -> Self {
        Self {
            step: 0.02,
            amplitude: 0.2,
        }
    }

    /// Stride bob applied while walking forward or back.
    pub fn footstep() -> Self {
        Self {
            step: 0.04,
            amplitude: 0.3,
        }
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if !(self.step > 0.0 && self.step < TAU) {
            return Err(ConfigError::Invalid(format!(
                "{section}.step must be in (0, 2pi), got {}",
                self.step
            )));
        }
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "{section}.amplitude must be finite and non-negative, got {}",
                self.amplitude
            )));
        }
        Ok(())
    }
}

/// Partial oscillator section; missing fields keep the oscillator's own defaults.
#[derive(Deserialize)]
struct OscillatorOverrides {
    step: Option<f32>,
    amplitude: Option<f32>,
}

impl OscillatorOverrides {
    fn over(self, base: OscillatorConfig) -> OscillatorConfig {
        OscillatorConfig {
            step: self.step.unwrap_or(base.step),
            amplitude: self.amplitude.unwrap_or(base.amplitude),
        }
    }
}

fn breathing_section<'de, D: Deserializer<'de>>(d: D) -> Result<OscillatorConfig, D::Error> {
    Ok(OscillatorOverrides::deserialize(d)?.over(OscillatorConfig::breathing()))
}

fn footstep_section<'de, D: Deserializer<'de>>(d: D) -> Result<OscillatorConfig, D::Error> {
    Ok(OscillatorOverrides::deserialize(d)?.over(OscillatorConfig::footstep()))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Resting height of the ground plane. Lower values put it further below the eye.
    pub starting_y: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self { starting_y: -30.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Distance the ground drops below its resting height at the apex.
    pub height: f32,
    /// Ground units moved per frame while airborne.
    pub rate: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            height: 30.0,
            rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundReturnConfig {
    /// Ground units removed per tick.
    pub step: f32,
    pub interval_ms: u64,
    /// Cancel an in-flight return when a jump starts. With `false` both the
    /// return task and the jump write ground Y until the return runs out.
    pub cancel_on_jump: bool,
}

impl Default for GroundReturnConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            interval_ms: 10,
            cancel_on_jump: true,
        }
    }
}

/// Lowest accepted frame rate.
pub const MIN_FRAME_RATE_HZ: f64 = 1.0;
/// Highest accepted frame rate; keeps the frame interval at 1 ms or more.
pub const MAX_FRAME_RATE_HZ: f64 = 1_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub frame_rate_hz: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60.0,
        }
    }
}

/// Where the held weapon sits relative to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponMount {
    pub scale: f32,
    /// Rotation about the camera-local X axis, radians.
    pub rotation_x: f32,
    pub offset: Vec3,
}

impl Default for WeaponMount {
    fn default() -> Self {
        Self {
            scale: 2.0,
            rotation_x: PI / (1.99 / 8.0),
            offset: Vec3::new(1.0, -1.2, -2.4),
        }
    }
}

impl WeaponMount {
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.offset,
            rotation: Quat::from_rotation_x(self.rotation_x),
            scale: Vec3::splat(self.scale),
        }
    }
}

/// Complete rig configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub orbit: OrbitConfig,
    pub movement: MovementConfig,
    #[serde(deserialize_with = "breathing_section")]
    pub breathing: OscillatorConfig,
    #[serde(deserialize_with = "footstep_section")]
    pub footstep: OscillatorConfig,
    pub ground: GroundConfig,
    pub jump: JumpConfig,
    pub ground_return: GroundReturnConfig,
    pub schedule: ScheduleConfig,
    pub weapon: WeaponMount,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            orbit: OrbitConfig::default(),
            movement: MovementConfig::default(),
            breathing: OscillatorConfig::breathing(),
            footstep: OscillatorConfig::footstep(),
            ground: GroundConfig::default(),
            jump: JumpConfig::default(),
            ground_return: GroundReturnConfig::default(),
            schedule: ScheduleConfig::default(),
            weapon: WeaponMount::default(),
        }
    }
}

impl RigConfig {
    /// Load and validate a config file. The format follows the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!("loaded rig config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let o = &self.orbit;
        if !(o.radius.is_finite() && o.radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "orbit.radius must be positive, got {}",
                o.radius
            )));
        }
        let limits_ok = 0.0 < o.theta_min && o.theta_min < o.theta_max && o.theta_max < 180.0;
        if !limits_ok {
            return Err(ConfigError::Invalid(format!(
                "orbit theta limits must satisfy 0 < min < max < 180, got [{}, {}]",
                o.theta_min, o.theta_max
            )));
        }
        if !o.rotation_speed.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "orbit.rotation_speed must be finite, got {}",
                o.rotation_speed
            )));
        }
        let speed = self.movement.move_speed;
        if !(speed.is_finite() && speed >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "movement.move_speed must be finite and non-negative, got {speed}"
            )));
        }
        self.breathing.validate("breathing")?;
        self.footstep.validate("footstep")?;
        let jump_ok = self.jump.height > 0.0 && self.jump.rate > 0.0;
        if !jump_ok {
            return Err(ConfigError::Invalid(
                "jump.height and jump.rate must be positive".into(),
            ));
        }
        let return_ok = self.ground_return.step > 0.0 && self.ground_return.interval_ms > 0;
        if !return_ok {
            return Err(ConfigError::Invalid(
                "ground_return.step and ground_return.interval_ms must be positive".into(),
            ));
        }
        let rate = self.schedule.frame_rate_hz;
        if !(MIN_FRAME_RATE_HZ..=MAX_FRAME_RATE_HZ).contains(&rate) {
            return Err(ConfigError::Invalid(format!(
                "schedule.frame_rate_hz must be within [{MIN_FRAME_RATE_HZ}, {MAX_FRAME_RATE_HZ}], got {rate}"
            )));
        }
        Ok(())
    }

    /// Ground height at the apex of a jump.
    pub fn jump_peak_y(&self) -> f32 {
        self.ground.starting_y - self.jump.height
    }

    /// Time between frames. Rates outside the accepted range are clamped into
    /// it, so this never returns zero.
    pub fn frame_interval(&self) -> Duration {
        // `max` picks the bound when the rate is NaN.
        let rate = self
            .schedule
            .frame_rate_hz
            .max(MIN_FRAME_RATE_HZ)
            .min(MAX_FRAME_RATE_HZ);
        Duration::from_secs_f64(1.0 / rate)
    }

    pub fn ground_return_interval(&self) -> Duration {
        Duration::from_millis(self.ground_return.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_standard_rig() {
        let c = RigConfig::default();
        assert_eq!(c.orbit.radius, 10.0);
        assert_eq!(c.orbit.rotation_speed, 1.0);
        assert_eq!(c.movement.move_speed, 2.0);
        assert_eq!(c.breathing, OscillatorConfig::breathing());
        assert_eq!(c.footstep.amplitude, 0.3);
        assert_eq!(c.jump_peak_y(), -60.0);
        assert_eq!(c.ground_return_interval(), Duration::from_millis(10));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn frame_interval_is_sixtieth_of_a_second() {
        let c = RigConfig::default();
        let micros = c.frame_interval().as_micros();
        assert!((16_666..=16_667).contains(&micros));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = RigConfig::from_yaml_str("jump:\n  height: 12.0\n").unwrap();
        assert_eq!(c.jump.height, 12.0);
        assert_eq!(c.jump.rate, 1.0);
        assert_eq!(c.orbit, OrbitConfig::default());
        assert_eq!(c.jump_peak_y(), -42.0);
    }

    #[test]
    fn json_roundtrip_preserves_weapon_mount() {
        let mut c = RigConfig::default();
        c.weapon.offset = Vec3::new(0.5, -1.0, -2.0);
        let text = c.to_json_string().unwrap();
        let back = RigConfig::from_json_str(&text).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn rejects_inverted_theta_limits() {
        let err = RigConfig::from_yaml_str("orbit:\n  theta_min: 100.0\n  theta_max: 10.0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_frame_rate() {
        let mut c = RigConfig::default();
        c.schedule.frame_rate_hz = 0.0;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_huge_frame_rate() {
        let err = RigConfig::from_yaml_str("schedule:\n  frame_rate_hz: 1.0e12\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_tiny_frame_rate() {
        let err = RigConfig::from_yaml_str("schedule:\n  frame_rate_hz: 1.0e-20\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn frame_interval_is_clamped_for_unvalidated_rates() {
        let mut c = RigConfig::default();
        c.schedule.frame_rate_hz = 1.0e12;
        assert!((c.frame_interval().as_secs_f64() - 0.001).abs() < 1e-9);
        c.schedule.frame_rate_hz = 1.0e-20;
        assert_eq!(c.frame_interval(), Duration::from_secs(1));
        c.schedule.frame_rate_hz = f64::NAN;
        assert_eq!(c.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_negative_oscillator_step() {
        let err = RigConfig::from_yaml_str("footstep:\n  step: -0.5\n  amplitude: 0.3\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.starts_with("footstep.step")));
    }

    #[test]
    fn rejects_full_turn_oscillator_step() {
        let mut c = RigConfig::default();
        c.breathing.step = TAU;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_bad_oscillator_amplitude() {
        let mut c = RigConfig::default();
        c.breathing.amplitude = f32::NAN;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
        c.breathing.amplitude = -0.2;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_negative_move_speed() {
        let err = RigConfig::from_yaml_str("movement:\n  move_speed: -2.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let mut c = RigConfig::default();
        c.movement.move_speed = f32::INFINITY;
        assert!(c.validate().is_err());
    }

    #[test]
    fn partial_oscillator_keeps_its_own_defaults() {
        let c = RigConfig::from_yaml_str("footstep:\n  step: 0.05\nbreathing:\n  amplitude: 0.1\n")
            .unwrap();
        assert_eq!(c.footstep.step, 0.05);
        assert_eq!(c.footstep.amplitude, 0.3);
        assert_eq!(c.breathing.step, 0.02);
        assert_eq!(c.breathing.amplitude, 0.1);
    }

    #[test]
    fn load_from_yaml_file() {
        let mut tmp = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(tmp, "movement:\n  move_speed: 3.5").unwrap();
        let c = RigConfig::load(tmp.path()).unwrap();
        assert_eq!(c.movement.move_speed, 3.5);
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let tmp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = RigConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn weapon_transform_uses_mount() {
        let t = WeaponMount::default().transform();
        assert_eq!(t.scale, Vec3::splat(2.0));
        assert_eq!(t.position, Vec3::new(1.0, -1.2, -2.4));
    }
}
