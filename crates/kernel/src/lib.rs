//! Rig kernel: the per-frame movement integrator and the scheduler that drives it.
//!
//! # Invariants
//! - The integrator is the single writer of camera and ground poses.
//! - `theta` stays within the configured limits; oscillator phases stay in [0, 2π).
//! - At most one jump and one ground-return task are in flight.
//! - Stepping is deterministic: the same config and input timeline give the same poses.

pub mod ground_return;
pub mod integrator;
pub mod jump;
pub mod orbit;
pub mod oscillator;
pub mod scene;
pub mod scheduler;
pub mod simulation;

pub use ground_return::GroundReturn;
pub use integrator::{FrameReport, MovementIntegrator};
pub use jump::{Jump, JumpPhase};
pub use orbit::Orbit;
pub use oscillator::Oscillator;
pub use scene::{Scene, SceneBuilder, SceneError};
pub use scheduler::{Scheduler, Task, TaskId};
pub use simulation::{AdvanceSummary, RigSnapshot, Simulation, SimulationError};

pub fn crate_info() -> &'static str {
    concat!("orbitwalk-kernel v", env!("CARGO_PKG_VERSION"))
}
