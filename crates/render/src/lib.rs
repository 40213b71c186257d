//! Rendering Adapter: renderer-agnostic interface for the rig scene.
//!
//! # Invariants
//! - Renderers never mutate the scene; the integrator is its only writer.
//! - A frame is rendered after that frame's mutations, through the camera
//!   the integrator just placed.

mod renderer;

pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    concat!("orbitwalk-render v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
