use crate::core::config::{check_aspect_ratio, check_dt, PhysicsConfig, SimulationConfig};
use crate::core::particle::{CollisionOutcome, DIM};
use crate::core::{Color, Particle};
use crate::error::{Error, Result};
use log::{debug, info, trace};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::ops::AddAssign;

/// Per-frame counters from [`Simulation::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Overlapping pairs found in the collision pass.
    pub contacts: usize,
    /// Pairs that were approaching and received an impulse.
    pub impulses: usize,
    /// Particles that touched a wall during integration.
    pub wall_hits: usize,
}

impl AddAssign for FrameStats {
    fn add_assign(&mut self, rhs: Self) {
        self.contacts += rhs.contacts;
        self.impulses += rhs.impulses;
        self.wall_hits += rhs.wall_hits;
    }
}

/// A fixed population of particles in a box under gravity.
///
/// Every frame runs a collision pass over all unordered pairs on
/// pre-integration positions, then an integration pass that moves each
/// particle and reflects it off the walls.
#[derive(Debug)]
pub struct Simulation {
    time_now: f64,
    frame: u64,
    dt: f64,
    aspect_ratio: f64,
    physics: PhysicsConfig,
    particles: Vec<Particle>,
}

impl Simulation {
    /// Spawn `config.num_particles` random particles.
    ///
    /// Positions, velocities and colors come from an RNG seeded with
    /// `config.seed`, or from entropy when no seed is given.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let ranges = config.spawn_ranges()?;

        let mut rng: StdRng = match config.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        let particles: Vec<Particle> = (0..config.num_particles)
            .map(|_| Particle::random(&mut rng, &ranges, config.aspect_ratio))
            .collect();

        debug!(
            "spawned {} particles (aspect_ratio={}, dt={}, seed={:?})",
            particles.len(),
            config.aspect_ratio,
            config.dt,
            config.seed
        );

        Ok(Self {
            time_now: 0.0,
            frame: 0,
            dt: config.dt,
            aspect_ratio: config.aspect_ratio,
            physics: config.physics,
            particles,
        })
    }

    /// Build from explicit particles. Every particle takes on `aspect_ratio`.
    pub fn from_particles(
        mut particles: Vec<Particle>,
        aspect_ratio: f64,
        dt: f64,
        physics: PhysicsConfig,
    ) -> Result<Self> {
        check_aspect_ratio(aspect_ratio)?;
        check_dt(dt)?;
        physics.validate()?;
        for p in &mut particles {
            p.update_aspect_ratio(aspect_ratio);
        }
        Ok(Self {
            time_now: 0.0,
            frame: 0,
            dt,
            aspect_ratio,
            physics,
            particles,
        })
    }

    /// Returns current simulation time (frames × dt).
    pub fn time(&self) -> f64 {
        self.time_now
    }

    /// Number of frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to particle state. The population itself is fixed.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Positions as a Vec of fixed-size arrays.
    pub fn positions(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.r).collect()
    }

    /// Velocities as a Vec of fixed-size arrays.
    pub fn velocities(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.v).collect()
    }

    pub fn colors(&self) -> Vec<Color> {
        self.particles.iter().map(|p| p.color).collect()
    }

    /// What a renderer needs per particle: center and fill color.
    pub fn renderables(&self) -> impl Iterator<Item = ([f64; DIM], Color)> + '_ {
        self.particles.iter().map(|p| (p.r, p.color))
    }

    /// Compute total kinetic energy (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Total linear momentum (diagnostic).
    pub fn momentum(&self) -> [f64; DIM] {
        self.particles.iter().fold([0.0; DIM], |mut acc, p| {
            let m = p.momentum();
            acc[0] += m[0];
            acc[1] += m[1];
            acc
        })
    }

    /// Push a new viewport aspect ratio to every particle.
    ///
    /// Nobody is repositioned here; particles left outside the narrower
    /// viewport are clamped by the next integration pass.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) -> Result<()> {
        check_aspect_ratio(aspect_ratio)?;
        info!(
            "aspect ratio {} -> {} ({} particles)",
            self.aspect_ratio,
            aspect_ratio,
            self.particles.len()
        );
        self.aspect_ratio = aspect_ratio;
        for p in &mut self.particles {
            p.update_aspect_ratio(aspect_ratio);
        }
        Ok(())
    }

    /// Framebuffer resize notification. Returns the new aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<f64> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidParam(format!(
                "framebuffer must be non-empty, got {width}x{height}"
            )));
        }
        let aspect_ratio = f64::from(width) / f64::from(height);
        self.set_aspect_ratio(aspect_ratio)?;
        Ok(aspect_ratio)
    }

    /// Advance one frame: collision pass, then integration pass.
    pub fn step(&mut self) -> FrameStats {
        let mut stats = FrameStats::default();
        self.collision_pass(&mut stats);
        self.integration_pass(&mut stats);
        self.frame += 1;
        self.time_now += self.dt;
        trace!(
            "frame {}: contacts={} impulses={} wall_hits={}",
            self.frame,
            stats.contacts,
            stats.impulses,
            stats.wall_hits
        );
        stats
    }

    /// Advance `frames` frames and return the summed counters.
    pub fn advance(&mut self, frames: u64) -> FrameStats {
        let mut total = FrameStats::default();
        for _ in 0..frames {
            total += self.step();
        }
        total
    }

    /// Run frames until `should_close` returns true.
    ///
    /// The signal is polled once per frame boundary, before each frame.
    /// Returns the number of frames run.
    pub fn run_until<F>(&mut self, mut should_close: F) -> u64
    where
        F: FnMut(&Simulation) -> bool,
    {
        let mut frames = 0u64;
        while !should_close(self) {
            self.step();
            frames += 1;
        }
        debug!("frame loop closed after {} frames (t={})", frames, self.time_now);
        frames
    }

    // ============ Internal helpers ============

    /// Resolve each unordered pair (i, j), i < j, exactly once, in row order.
    fn collision_pass(&mut self, stats: &mut FrameStats) {
        let physics = &self.physics;
        for i in 0..self.particles.len() {
            let (head, tail) = self.particles.split_at_mut(i + 1);
            let pi = &mut head[i];
            for pj in tail.iter_mut() {
                match pi.resolve_collision(pj, physics) {
                    CollisionOutcome::Apart => {}
                    CollisionOutcome::Separated => stats.contacts += 1,
                    CollisionOutcome::Resolved => {
                        stats.contacts += 1;
                        stats.impulses += 1;
                    }
                }
            }
        }
    }

    fn integration_pass(&mut self, stats: &mut FrameStats) {
        let (dt, physics) = (self.dt, &self.physics);
        for p in &mut self.particles {
            if p.update(dt, physics) {
                stats.wall_hits += 1;
            }
        }
    }
}
