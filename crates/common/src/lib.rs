//! Shared types for the orbitwalk rig: scene poses and the rig configuration.
//!
//! # Invariants
//! - Every tunable constant of the rig lives in [`RigConfig`]; defaults reproduce
//!   the standard rig tuning.
//! - Pose types are plain data. Only the kernel's integrator writes them.

pub mod config;
pub mod types;

pub use config::{
    ConfigError, GroundConfig, GroundReturnConfig, JumpConfig, MovementConfig, OrbitConfig,
    MAX_FRAME_RATE_HZ, MIN_FRAME_RATE_HZ, OscillatorConfig, RigConfig, ScheduleConfig, WeaponMount,
};
pub use types::{CameraPose, GroundPose, Transform};
