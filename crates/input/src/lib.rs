//! Input: key identifiers mapped to rig actions, and the held-action state.
//!
//! # Invariants
//! - Key notifications only ever write [`InputState`]; scene state is written
//!   by the integrator alone.
//! - The full action set is registered at construction and never shrinks.

pub mod action;
pub mod state;

pub use action::{Action, UnknownAction};
pub use state::{InputEdges, InputState};

pub fn crate_info() -> &'static str {
    concat!("orbitwalk-input v", env!("CARGO_PKG_VERSION"))
}
