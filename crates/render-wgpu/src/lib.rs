//! wgpu render backend for the orbit rig.
//!
//! Draws the ground grid and its landmarks at the ground pose, an origin
//! marker at the look-at point, and every camera attachment (the weapon)
//! in camera space.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - Rendering happens after the frame's integrator step, never inside it.

mod camera;
mod gpu;
mod instances;
mod shaders;

pub use camera::Lens;
pub use gpu::WgpuRenderer;
pub use instances::{Instance, InstanceKind, SceneInstances};
