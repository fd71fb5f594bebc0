//! Headless frame driver for the particle box.
//!
//! Usage:
//! ```
//!  RUST_LOG=debug cargo run -- --particles 200 --frames 600 --seed 7
//!  cargo run -- --config box.toml --resize-at 300:1920x1080
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context as _;
use gravbox::core::{FrameStats, Simulation, SimulationConfig};
use log::{info, warn};

/// A framebuffer resize applied when the simulation reaches `frame`, before
/// that frame is stepped. Frame 0 resizes ahead of the first step.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeAt {
    frame: u64,
    width: u32,
    height: u32,
}

impl FromStr for ResizeAt {
    type Err = String;

    /// Parses `FRAME:WIDTHxHEIGHT`, e.g. `120:1920x1080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (frame, size) = s
            .split_once(':')
            .ok_or_else(|| format!("expected FRAME:WIDTHxHEIGHT, got {s:?}"))?;
        let (width, height) = size
            .split_once('x')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {size:?}"))?;
        Ok(Self {
            frame: frame.parse().map_err(|e| format!("bad frame {frame:?}: {e}"))?,
            width: width.parse().map_err(|e| format!("bad width {width:?}: {e}"))?,
            height: height.parse().map_err(|e| format!("bad height {height:?}: {e}"))?,
        })
    }
}

#[derive(Debug, clap::Parser)]
#[clap(author, version, about)]
struct Args {
    /// TOML config file; flags below override its values.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[clap(long, default_value = "600")]
    frames: u64,

    /// Log a summary every N frames (0 disables).
    #[clap(long, default_value = "60")]
    report_every: u64,

    #[clap(long)]
    particles: Option<usize>,

    #[clap(long)]
    seed: Option<u64>,

    #[clap(long)]
    aspect_ratio: Option<f64>,

    #[clap(long)]
    dt: Option<f64>,

    #[clap(long, allow_hyphen_values = true)]
    gravity: Option<f64>,

    #[clap(long)]
    damping: Option<f64>,

    #[clap(long)]
    restitution: Option<f64>,

    /// Simulate a window resize, e.g. `300:1920x1080`. May be repeated.
    #[clap(long)]
    resize_at: Vec<ResizeAt>,
}

impl Args {
    fn to_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut cfg = match &self.config {
            Some(path) => SimulationConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        if let Some(n) = self.particles {
            cfg.num_particles = n;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(ar) = self.aspect_ratio {
            cfg.aspect_ratio = ar;
        }
        if let Some(dt) = self.dt {
            cfg.dt = dt;
        }
        if let Some(g) = self.gravity {
            cfg.physics.gravity = g;
        }
        if let Some(d) = self.damping {
            cfg.physics.damping = d;
        }
        if let Some(e) = self.restitution {
            cfg.physics.restitution = e;
        }
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}

/// Apply every scheduled resize due at the current frame; returns how many fired.
fn apply_resizes(sim: &mut Simulation, schedule: &[ResizeAt]) -> anyhow::Result<usize> {
    let now = sim.frame();
    let mut applied = 0;
    for r in schedule.iter().filter(|r| r.frame == now) {
        let ar = sim
            .resize(r.width, r.height)
            .with_context(|| format!("resize at frame {now}"))?;
        info!("frame {now}: resized to {}x{}, aspect ratio {ar:.4}", r.width, r.height);
        applied += 1;
    }
    Ok(applied)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let cfg = args.to_config()?;
    let mut sim = Simulation::new(&cfg)?;
    info!(
        "{} particles, aspect ratio {}, dt {}, {} frames",
        sim.num_particles(),
        sim.aspect_ratio(),
        sim.dt(),
        args.frames
    );

    let e0 = sim.kinetic_energy();
    let mut window = FrameStats::default();
    let mut total = FrameStats::default();

    while sim.frame() < args.frames {
        apply_resizes(&mut sim, &args.resize_at)?;
        let stats = sim.step();
        window += stats;
        total += stats;

        if args.report_every > 0 && sim.frame() % args.report_every == 0 {
            info!(
                "frame {:>6} t={:.3}s KE={:.6} contacts={} impulses={} wall_hits={}",
                sim.frame(),
                sim.time(),
                sim.kinetic_energy(),
                window.contacts,
                window.impulses,
                window.wall_hits
            );
            window = FrameStats::default();
        }
    }

    let escaped = sim
        .particles()
        .iter()
        .filter(|p| !p.within_viewport(sim.physics()))
        .count();
    if escaped > 0 {
        warn!("{escaped} particles outside the viewport after the last frame");
    }

    let p = sim.momentum();
    println!(
        "frames={} t={:.3}s KE0={:.6} KE={:.6} momentum=({:.6}, {:.6}) contacts={} impulses={} wall_hits={}",
        sim.frame(),
        sim.time(),
        e0,
        sim.kinetic_energy(),
        p[0],
        p[1],
        total.contacts,
        total.impulses,
        total.wall_hits
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    use clap::Parser as _;
    let args = Args::parse();
    run(&args)
}
