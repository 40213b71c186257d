use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use orbitwalk_common::RigConfig;
use orbitwalk_input::Action;
use orbitwalk_kernel::{JumpPhase, RigSnapshot, Simulation};
use orbitwalk_render::{DebugTextRenderer, Renderer};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbitwalk-cli", about = "Headless driver for the orbit rig")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Rig config file (.yaml, .yml or .json); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective config
    Info,
    /// Run the rig headless for a number of frames
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Key held from the first frame (repeatable)
        #[arg(long = "hold", value_name = "KEY")]
        hold: Vec<Action>,
        /// Press a key before a frame, e.g. `space@30` (repeatable)
        #[arg(long = "press", value_name = "KEY@FRAME")]
        press: Vec<KeyAt>,
        /// Release a key before a frame, e.g. `w@100` (repeatable)
        #[arg(long = "release", value_name = "KEY@FRAME")]
        release: Vec<KeyAt>,
        /// Print the scene after every frame
        #[arg(long)]
        trace: bool,
    },
    /// Print the ground height over one full jump
    Jump,
    /// Dump the effective config
    Config {
        #[arg(long, value_enum, default_value = "yaml")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

/// A key event scheduled before a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyAt {
    action: Action,
    frame: u64,
}

impl FromStr for KeyAt {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, frame) = s
            .rsplit_once('@')
            .with_context(|| format!("expected KEY@FRAME, got `{s}`"))?;
        Ok(Self {
            action: key.parse()?,
            frame: frame
                .parse()
                .with_context(|| format!("bad frame number in `{s}`"))?,
        })
    }
}

/// Scripted input for a headless run.
#[derive(Debug, Default)]
struct Script {
    hold: Vec<Action>,
    press: Vec<KeyAt>,
    release: Vec<KeyAt>,
}

/// Run `frames` frames under `script`. Returns the final state and, when
/// `trace` is set, one rendered line block per frame.
fn simulate(
    config: RigConfig,
    script: &Script,
    frames: u64,
    trace: bool,
) -> anyhow::Result<(RigSnapshot, Vec<String>)> {
    let mut sim = Simulation::new(config)?;
    let renderer = DebugTextRenderer::new();
    let mut lines = Vec::new();

    for &action in &script.hold {
        sim.input_mut().set_action(action, true);
    }
    for frame in 0..frames {
        for event in script.press.iter().filter(|e| e.frame == frame) {
            sim.input_mut().set_action(event.action, true);
        }
        for event in script.release.iter().filter(|e| e.frame == frame) {
            sim.input_mut().set_action(event.action, false);
        }
        sim.advance_frames(1, |scene, report| {
            if trace {
                let mut block = format!(
                    "frame {} jump_started={} stride_released={}\n",
                    report.frame, report.jump_started, report.stride_released
                );
                block.push_str(&renderer.render(scene, &scene.camera.pose));
                lines.push(block);
            }
        });
    }
    Ok((sim.snapshot(), lines))
}

/// Ground height after every frame of one jump, from the press to landing.
fn jump_trajectory(config: RigConfig) -> anyhow::Result<Vec<f32>> {
    // Far more frames than any valid config needs.
    const MAX_FRAMES: usize = 100_000;

    let mut sim = Simulation::new(config)?;
    sim.input_mut().set_action(Action::Jump, true);
    let mut heights = Vec::new();
    let mut landed = false;
    while !landed {
        if heights.len() >= MAX_FRAMES {
            bail!("jump did not land within {MAX_FRAMES} frames");
        }
        sim.advance_frames(1, |scene, report| {
            heights.push(scene.ground.position.y);
            landed = report.jump_transition == Some(JumpPhase::Grounded);
        });
    }
    Ok(heights)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RigConfig> {
    match path {
        Some(path) => RigConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(RigConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("orbitwalk-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", orbitwalk_kernel::crate_info());
            println!("input: {}", orbitwalk_input::crate_info());
            println!("render: {}", orbitwalk_render::crate_info());
            println!(
                "frame interval: {:?}, ground return interval: {:?}, jump peak: {}",
                config.frame_interval(),
                config.ground_return_interval(),
                config.jump_peak_y()
            );
            print!("{}", config.to_yaml_string()?);
        }
        Commands::Simulate {
            frames,
            hold,
            press,
            release,
            trace,
        } => {
            tracing::info!(frames, "simulating");
            let script = Script {
                hold,
                press,
                release,
            };
            let (snapshot, lines) = simulate(config, &script, frames, trace)?;
            for block in lines {
                print!("{block}");
            }
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Jump => {
            let heights = jump_trajectory(config)?;
            for (frame, y) in heights.iter().enumerate() {
                println!("{frame:>4} {y:.2}");
            }
            println!("jump took {} frames", heights.len());
        }
        Commands::Config { format } => {
            let text = match format {
                Format::Yaml => config.to_yaml_string()?,
                Format::Json => config.to_json_string()?,
            };
            println!("{text}");
        }
    }

    Ok(())
}
