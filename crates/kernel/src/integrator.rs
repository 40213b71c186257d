use glam::Vec3;
use orbitwalk_common::{CameraPose, GroundPose, RigConfig};
use orbitwalk_input::{Action, InputEdges, InputState};

use crate::jump::{Jump, JumpPhase};
use crate::orbit::Orbit;
use crate::oscillator::Oscillator;

/// The point the camera orbits and always looks at.
pub const LOOK_AT: Vec3 = Vec3::ZERO;

/// What one integrator frame did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Zero-based index of the frame.
    pub frame: u64,
    pub jump_started: bool,
    pub jump_transition: Option<JumpPhase>,
    /// Forward or back was released: the footstep phase was reset and the
    /// ground should be walked back to rest.
    pub stride_released: bool,
    pub breathing_offset: f32,
    /// Footstep offset added to the ground, if the bob ran this frame.
    pub footstep_offset: Option<f32>,
    /// Planar ground displacement applied this frame.
    pub ground_delta: Vec3,
}

/// Converts held input into camera and ground motion, once per frame.
///
/// Owns the orbit angles, both oscillators and the jump state. Camera and
/// ground poses are passed in by the caller; the integrator is their only writer.
#[derive(Debug, Clone)]
pub struct MovementIntegrator {
    orbit: Orbit,
    breathing: Oscillator,
    footstep: Oscillator,
    jump: Jump,
    move_speed: f32,
    frames: u64,
}

impl MovementIntegrator {
    /// Fresh integrator: orbit at its initial angles, oscillators at phase
    /// zero, grounded, no frames stepped.
    pub fn new(config: &RigConfig) -> Self {
        Self {
            orbit: Orbit::new(&config.orbit),
            breathing: Oscillator::new(&config.breathing),
            footstep: Oscillator::new(&config.footstep),
            jump: Jump::new(config),
            move_speed: config.movement.move_speed,
            frames: 0,
        }
    }

    /// Current orbit angles.
    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    /// Idle sway added to the eye height every frame.
    pub fn breathing(&self) -> &Oscillator {
        &self.breathing
    }

    /// Stride bob added to the ground height while walking. Reset when
    /// forward or back is released.
    pub fn footstep(&self) -> &Oscillator {
        &self.footstep
    }

    /// Jump state.
    pub fn jump(&self) -> &Jump {
        &self.jump
    }

    /// Frames stepped so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance one frame.
    ///
    /// `edges` are the press/release transitions since the previous frame;
    /// `input` is the held state at the start of this frame.
    pub fn step(
        &mut self,
        input: &InputState,
        edges: &InputEdges,
        camera: &mut CameraPose,
        ground: &mut GroundPose,
    ) -> FrameReport {
        let mut report = FrameReport {
            frame: self.frames,
            ..FrameReport::default()
        };
        self.frames += 1;

        if edges.stride_released() {
            self.footstep.reset();
            report.stride_released = true;
        }
        if edges.was_pressed(Action::Jump) {
            report.jump_started = self.jump.request();
        }

        // Orbit and camera placement.
        self.orbit.apply(input);
        let mut eye = self.orbit.eye();
        report.breathing_offset = self.breathing.sample();
        eye.y += report.breathing_offset;
        camera.position = eye;
        camera.look_at(LOOK_AT);

        // Planar translation: the ground moves opposite to where the player walks.
        let (sin_phi, cos_phi) = self.orbit.phi_radians().sin_cos();
        let ahead = Vec3::new(sin_phi, 0.0, cos_phi) * self.move_speed;
        let side = Vec3::new(cos_phi, 0.0, -sin_phi) * self.move_speed;
        let mut delta = Vec3::ZERO;
        if input.is_pressed(Action::Forward) {
            delta += ahead;
        }
        if input.is_pressed(Action::Back) {
            delta -= ahead;
        }
        if input.is_pressed(Action::StrafeLeft) {
            delta += side;
        }
        if input.is_pressed(Action::StrafeRight) {
            delta -= side;
        }
        ground.position += delta;
        report.ground_delta = delta;

        // Footstep bob: exactly one of forward/back, feet on the ground.
        let striding = input.is_pressed(Action::Forward) != input.is_pressed(Action::Back);
        if striding && self.jump.is_grounded() {
            let offset = self.footstep.sample();
            ground.position.y += offset;
            report.footstep_offset = Some(offset);
        }

        report.jump_transition = self.jump.update(&mut ground.position.y);

        tracing::trace!(
            frame = report.frame,
            theta = self.orbit.theta(),
            phi = self.orbit.phi(),
            ground_y = ground.position.y,
            jump = ?self.jump.phase(),
            "integrator frame"
        );
        report
    }
}
