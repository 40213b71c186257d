use orbitwalk_common::{CameraPose, ConfigError, GroundPose, RigConfig};
use orbitwalk_input::{Action, InputState};
use serde::Serialize;
use std::time::Duration;

use crate::ground_return::GroundReturn;
use crate::integrator::{FrameReport, MovementIntegrator};
use crate::jump::JumpPhase;
use crate::scene::{Scene, SceneError};
use crate::scheduler::{Scheduler, Task, TaskId};

/// Errors raised while starting a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Work done by one call to [`Simulation::advance_to`] or [`Simulation::advance_frames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvanceSummary {
    pub frames: u64,
    pub ground_return_ticks: u64,
}

/// Serializable view of the rig for HUDs, logs and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigSnapshot {
    pub frames: u64,
    pub elapsed_ms: f64,
    pub theta: f32,
    pub phi: f32,
    pub breathing_phase: f32,
    pub footstep_phase: f32,
    pub jump: JumpPhase,
    pub camera: CameraPose,
    pub ground: GroundPose,
    pub ground_return_active: bool,
    /// Armed tasks, frame task included.
    pub pending_tasks: usize,
    pub held: Vec<Action>,
}

/// The running rig: input, integrator, scene anchors and the task queue.
///
/// One frame task re-arms itself every frame interval. Releasing forward or
/// back arms a ground-return task that ticks on its own interval until the
/// ground is back at rest. Both run on the same virtual clock; the host
/// advances it and renders in the per-frame callback.
#[derive(Debug)]
pub struct Simulation {
    config: RigConfig,
    input: InputState,
    integrator: MovementIntegrator,
    ground_return: GroundReturn,
    scene: Scene,
    scheduler: Scheduler,
    frame_interval: Duration,
    return_task: Option<TaskId>,
}

impl Simulation {
    /// Validate `config`, assemble the standard scene and arm the first frame
    /// at time zero.
    pub fn new(config: RigConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let scene = Scene::from_config(&config)?;
        Self::with_scene(config, scene)
    }

    /// Start from explicitly assembled scene anchors.
    pub fn with_scene(config: RigConfig, scene: Scene) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::ZERO, Task::Frame);
        tracing::debug!(frame_interval = ?config.frame_interval(), "simulation started");
        Ok(Self {
            integrator: MovementIntegrator::new(&config),
            ground_return: GroundReturn::new(&config),
            frame_interval: config.frame_interval(),
            input: InputState::new(),
            scene,
            scheduler,
            return_task: None,
            config,
        })
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn integrator(&self) -> &MovementIntegrator {
        &self.integrator
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Virtual time of the last task that ran.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// A ground-return tick is armed and not cancelled.
    pub fn ground_return_active(&self) -> bool {
        self.return_task
            .is_some_and(|id| self.scheduler.is_pending(id))
    }

    pub fn key_down(&mut self, key: &str) -> Option<Action> {
        self.input.key_down(key)
    }

    pub fn key_up(&mut self, key: &str) -> Option<Action> {
        self.input.key_up(key)
    }

    /// Teardown: stop listening to keys. Armed tasks keep running.
    pub fn detach_input(&mut self) {
        self.input.detach();
    }

    /// Run every task due up to `until`. `on_frame` is the render hook, called
    /// after each integrator frame and before the next frame is armed.
    pub fn advance_to<F>(&mut self, until: Duration, mut on_frame: F) -> AdvanceSummary
    where
        F: FnMut(&Scene, &FrameReport),
    {
        let mut summary = AdvanceSummary::default();
        while let Some((id, task)) = self.scheduler.pop_due(until) {
            self.dispatch(id, task, &mut on_frame, &mut summary);
        }
        self.scheduler.advance_clock(until);
        summary
    }

    /// Run tasks in order until `frames` integrator frames have run.
    /// Ground-return ticks due before the last of those frames run too.
    pub fn advance_frames<F>(&mut self, frames: u64, mut on_frame: F) -> AdvanceSummary
    where
        F: FnMut(&Scene, &FrameReport),
    {
        let mut summary = AdvanceSummary::default();
        while summary.frames < frames {
            let Some((id, task)) = self.scheduler.pop_due(Duration::MAX) else {
                break;
            };
            self.dispatch(id, task, &mut on_frame, &mut summary);
        }
        summary
    }

    fn dispatch<F>(&mut self, id: TaskId, task: Task, on_frame: &mut F, summary: &mut AdvanceSummary)
    where
        F: FnMut(&Scene, &FrameReport),
    {
        match task {
            Task::Frame => {
                let report = self.run_frame();
                on_frame(&self.scene, &report);
                self.scheduler.schedule(self.frame_interval, Task::Frame);
                summary.frames += 1;
            }
            Task::GroundReturn => {
                self.run_ground_return(id);
                summary.ground_return_ticks += 1;
            }
        }
    }

    fn run_frame(&mut self) -> FrameReport {
        let edges = self.input.take_edges();
        let report = self.integrator.step(
            &self.input,
            &edges,
            &mut self.scene.camera.pose,
            &mut self.scene.ground,
        );

        let cancel_on_jump = self.config.ground_return.cancel_on_jump;
        if report.jump_started && cancel_on_jump {
            if let Some(id) = self.return_task.take() {
                self.scheduler.cancel(id);
                tracing::debug!("ground return cancelled by jump");
            }
        }
        if report.stride_released {
            if cancel_on_jump && !self.integrator.jump().is_grounded() {
                tracing::debug!("ground return skipped while airborne");
            } else {
                self.arm_ground_return();
            }
        }
        report
    }

    fn arm_ground_return(&mut self) {
        if self.return_task.is_some() {
            tracing::trace!("ground return already in flight");
            return;
        }
        let id = self.scheduler.schedule(Duration::ZERO, Task::GroundReturn);
        self.return_task = Some(id);
        tracing::debug!(ground_y = self.scene.ground.position.y, "ground return armed");
    }

    fn run_ground_return(&mut self, id: TaskId) {
        if self.return_task != Some(id) {
            return;
        }
        if self.ground_return.tick(&mut self.scene.ground) {
            let interval = self.ground_return.interval();
            self.return_task = Some(self.scheduler.schedule(interval, Task::GroundReturn));
        } else {
            self.return_task = None;
            tracing::debug!(ground_y = self.scene.ground.position.y, "ground return finished");
        }
    }

    pub fn snapshot(&self) -> RigSnapshot {
        let orbit = self.integrator.orbit();
        RigSnapshot {
            frames: self.integrator.frames(),
            elapsed_ms: self.now().as_secs_f64() * 1_000.0,
            theta: orbit.theta(),
            phi: orbit.phi(),
            breathing_phase: self.integrator.breathing().phase(),
            footstep_phase: self.integrator.footstep().phase(),
            jump: self.integrator.jump().phase(),
            camera: self.scene.camera.pose,
            ground: self.scene.ground,
            ground_return_active: self.ground_return_active(),
            pending_tasks: self.scheduler.pending(),
            held: self.input.held().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_frame_runs_at_time_zero() {
        let mut sim = Simulation::new(RigConfig::default()).unwrap();
        let summary = sim.advance_to(Duration::ZERO, |_, _| {});
        assert_eq!(summary.frames, 1);
        assert_eq!(sim.integrator().frames(), 1);
    }

    #[test]
    fn sixty_frames_per_second() {
        let mut sim = Simulation::new(RigConfig::default()).unwrap();
        let summary = sim.advance_to(ms(999), |_, _| {});
        assert_eq!(summary.frames, 60);
        assert_eq!(sim.now(), ms(999));
    }

    #[test]
    fn render_hook_sees_written_scene() {
        let mut sim = Simulation::new(RigConfig::default()).unwrap();
        sim.key_down("w");
        let mut seen = Vec::new();
        sim.advance_frames(3, |scene, report| {
            seen.push((report.frame, scene.ground.position.z));
        });
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, 0);
        assert!((seen[2].1 - 6.0).abs() < 1e-5);
    }

    #[test]
    fn release_arms_ground_return_once() {
        let mut sim = Simulation::new(RigConfig::default()).unwrap();
        sim.key_down("w");
        sim.key_down("s");
        sim.advance_frames(1, |_, _| {});
        sim.key_up("w");
        sim.key_up("s");
        sim.advance_frames(1, |_, _| {});
        // Ground is at rest, so the single armed task finishes on its first tick.
        assert!(sim.ground_return_active());
        let summary = sim.advance_to(sim.now() + ms(1), |_, _| {});
        assert_eq!(summary.ground_return_ticks, 1);
        assert!(!sim.ground_return_active());
    }

    #[test]
    fn snapshot_reports_state() {
        let mut sim = Simulation::new(RigConfig::default()).unwrap();
        sim.key_down("ArrowUp");
        sim.advance_frames(5, |_, _| {});
        let snap = sim.snapshot();
        assert_eq!(snap.frames, 5);
        assert_eq!(snap.theta, 95.0);
        assert_eq!(snap.jump, JumpPhase::Grounded);
        assert_eq!(snap.held, vec![Action::LookUp]);
        assert!(!snap.ground_return_active);
        assert_eq!(snap.pending_tasks, 1);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = RigConfig::default();
        config.schedule.frame_rate_hz = 1.0e12;
        let err = Simulation::new(config).unwrap_err();
        assert!(matches!(err, SimulationError::Config(ConfigError::Invalid(_))));

        let mut config = RigConfig::default();
        config.schedule.frame_rate_hz = 1.0e-20;
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn with_scene_accepts_built_anchors() {
        let scene = Scene::builder()
            .camera(CameraPose::default())
            .ground(GroundPose::at_height(-5.0))
            .build()
            .unwrap();
        let mut sim = Simulation::with_scene(RigConfig::default(), scene).unwrap();
        assert!(sim.scene().camera.children().is_empty());
        sim.advance_frames(1, |scene, _| assert_eq!(scene.ground.position.y, -5.0));
    }

    #[test]
    fn jump_leaves_only_the_frame_task_armed() {
        let mut sim = Simulation::new(RigConfig::default()).unwrap();
        sim.key_down("w");
        sim.advance_frames(100, |_, _| {});
        sim.key_up("w");
        sim.advance_frames(1, |_, _| {});
        assert!(sim.ground_return_active());
        assert_eq!(sim.snapshot().pending_tasks, 2);

        sim.key_down(" ");
        sim.advance_frames(1, |_, report| assert!(report.jump_started));
        assert!(!sim.ground_return_active());
        assert_eq!(sim.snapshot().pending_tasks, 1);
    }

    #[test]
    fn detached_input_freezes_held_state() {
        let mut sim = Simulation::new(RigConfig::default()).unwrap();
        sim.key_down("ArrowLeft");
        sim.detach_input();
        assert_eq!(sim.key_up("ArrowLeft"), None);
        sim.advance_frames(10, |_, _| {});
        assert_eq!(sim.integrator().orbit().phi(), 10.0);
    }
}
