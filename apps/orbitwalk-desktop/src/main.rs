use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use orbitwalk_common::RigConfig;
use orbitwalk_input::Action;
use orbitwalk_kernel::{AdvanceSummary, Simulation};
use orbitwalk_render_wgpu::{Lens, WgpuRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "orbitwalk-desktop", about = "Orbit rig desktop application")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Rig config file (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Key identifier the input crate understands for a physical key.
fn key_name(key: KeyCode) -> Option<&'static str> {
    match key {
        KeyCode::ArrowUp => Some("ArrowUp"),
        KeyCode::ArrowDown => Some("ArrowDown"),
        KeyCode::ArrowLeft => Some("ArrowLeft"),
        KeyCode::ArrowRight => Some("ArrowRight"),
        KeyCode::KeyW => Some("w"),
        KeyCode::KeyS => Some("s"),
        KeyCode::KeyA => Some("a"),
        KeyCode::KeyD => Some("d"),
        KeyCode::Space => Some(" "),
        _ => None,
    }
}

/// Application state.
///
/// Presentation policy: the window shows the latest scene once per redraw.
/// When a redraw finds several frames due, all of them run but only the last
/// is drawn. A redraw that finds no frame due draws nothing.
struct AppState {
    sim: Simulation,
    lens: Lens,
    started: Instant,
    show_hud: bool,
}

impl AppState {
    fn new(config: RigConfig) -> Result<Self> {
        Ok(Self {
            sim: Simulation::new(config)?,
            lens: Lens::default(),
            started: Instant::now(),
            show_hud: true,
        })
    }

    /// Run every frame and ground-return tick due by `now`, measured from
    /// start-up. The scene is worth presenting when at least one frame ran.
    fn update(&mut self, now: Duration) -> AdvanceSummary {
        let summary = self.sim.advance_to(now, |_, report| {
            if report.jump_started {
                tracing::debug!(frame = report.frame, "jump");
            }
        });
        if summary.frames > 1 {
            tracing::debug!(skipped = summary.frames - 1, "frames run without a redraw");
        }
        summary
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(name) = key_name(key) {
            if pressed {
                self.sim.key_down(name);
            } else {
                self.sim.key_up(name);
            }
            return;
        }
        if pressed && key == KeyCode::F1 {
            self.show_hud = !self.show_hud;
        }
    }

    /// Losing focus swallows key-up events; treat every held action as released.
    fn release_all(&mut self) {
        let held: Vec<Action> = self.sim.input().held().collect();
        for action in held {
            self.sim.input_mut().set_action(action, false);
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }
        let snap = self.sim.snapshot();

        egui::Window::new("Rig")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Frame: {}  t={:.0} ms", snap.frames, snap.elapsed_ms));
                ui.label(format!("Theta: {:.1}  Phi: {:.1}", snap.theta, snap.phi));
                let g = snap.ground.position;
                ui.label(format!("Ground: ({:.2}, {:.2}, {:.2})", g.x, g.y, g.z));
                ui.label(format!("Jump: {:?}", snap.jump));
                ui.label(format!(
                    "Ground return: {}",
                    if snap.ground_return_active { "in flight" } else { "idle" }
                ));
                let held: Vec<&str> = snap.held.iter().map(|a| a.name()).collect();
                ui.label(format!("Held: {}", held.join(" ")));
                ui.separator();
                ui.small("Arrows: Look | WASD: Walk | Space: Jump | F1: HUD");
            });
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn draw_hud(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let (Some(window), Some(egui_winit), Some(egui_renderer), Some(config)) = (
            &self.window,
            &mut self.egui_winit,
            &mut self.egui_renderer,
            &self.config,
        ) else {
            return;
        };

        let raw_input = egui_winit.take_egui_input(window);
        let state = &self.state;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }
    }

    fn redraw(&mut self) {
        let summary = self.state.update(self.state.started.elapsed());
        if summary.frames == 0 {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            return;
        }

        let (Some(surface), Some(device), Some(queue)) =
            (self.surface.take(), self.device.take(), self.queue.take())
        else {
            return;
        };
        self.present(&surface, &device, &queue);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn present(
        &mut self,
        surface: &wgpu::Surface<'static>,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(config) = &self.config {
                    surface.configure(device, config);
                }
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(renderer) = &mut self.renderer {
            let scene = self.state.sim.scene();
            renderer.render(device, queue, &view, &self.state.lens, scene, &scene.camera.pose);
        }
        self.draw_hud(device, queue, &view);

        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Orbitwalk")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbitwalk_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.lens.resize(size.width, size.height);

        let renderer = WgpuRenderer::new(&device, surface_format, size.width, size.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state.lens.resize(new_size.width, new_size.height);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.state.release_all();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state.sim.detach_input();
        let snap = self.state.sim.snapshot();
        tracing::info!(
            frames = snap.frames,
            ground_y = snap.ground.position.y,
            "orbitwalk-desktop exiting"
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => RigConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RigConfig::default(),
    };

    tracing::info!("orbitwalk-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(config)?);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rig_keys_map_to_actions() {
        let cases = [
            (KeyCode::ArrowUp, Action::LookUp),
            (KeyCode::ArrowDown, Action::LookDown),
            (KeyCode::ArrowLeft, Action::LookLeft),
            (KeyCode::ArrowRight, Action::LookRight),
            (KeyCode::KeyW, Action::Forward),
            (KeyCode::KeyS, Action::Back),
            (KeyCode::KeyA, Action::StrafeLeft),
            (KeyCode::KeyD, Action::StrafeRight),
            (KeyCode::Space, Action::Jump),
        ];
        for (key, action) in cases {
            assert_eq!(key_name(key).and_then(Action::from_key), Some(action));
        }
        assert_eq!(key_name(KeyCode::KeyQ), None);
    }

    #[test]
    fn focus_loss_releases_held_keys() {
        let mut state = AppState::new(RigConfig::default()).unwrap();
        state.handle_key(KeyCode::KeyW, true);
        state.handle_key(KeyCode::ArrowLeft, true);
        state.release_all();
        assert_eq!(state.sim.input().held().count(), 0);
    }

    #[test]
    fn update_runs_catch_up_frames_once() {
        let mut state = AppState::new(RigConfig::default()).unwrap();
        let summary = state.update(Duration::from_millis(40));
        assert_eq!(summary.frames, 3);
        assert_eq!(state.sim.snapshot().frames, 3);
        // Nothing new is due, so the redraw would present nothing.
        assert_eq!(state.update(Duration::from_millis(40)).frames, 0);
    }

    #[test]
    fn rejects_unusable_frame_rate() {
        let mut config = RigConfig::default();
        config.schedule.frame_rate_hz = 1.0e12;
        assert!(AppState::new(config).is_err());
    }
}
