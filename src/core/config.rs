//! Simulation parameters.
//!
//! `PhysicsConfig` is passed explicitly into every per-particle routine so the
//! physics can be parameterised and tested in isolation. `SimulationConfig`
//! bundles everything a run needs and can be loaded from TOML.

use crate::core::particle::DIM;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default fixed timestep (about 60 frames per second).
pub const DEFAULT_DT: f64 = 0.016;

/// Default spawn speed bound per axis when no spawn ranges are configured.
pub const DEFAULT_SPAWN_SPEED: f64 = 0.05;

/// Default population size.
pub const DEFAULT_NUM_PARTICLES: usize = 500;

/// Shared physical constants for every particle in the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Vertical acceleration in simulation units/s^2 (negative is downward).
    pub gravity: f64,
    /// Per-step velocity multiplier in (0, 1]. 1.0 disables damping.
    pub damping: f64,
    /// Particle radius in vertical simulation units. Scaled by the aspect
    /// ratio on the horizontal axis when testing walls.
    pub radius: f64,
    /// Coefficient of restitution in [0, 1] for pair and wall contacts.
    pub restitution: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -1.0,
            damping: 1.0,
            radius: 0.05,
            restitution: 1.0,
        }
    }
}

impl PhysicsConfig {
    /// Contact distance between two centers (sum of radii).
    #[inline]
    pub fn contact_distance(&self) -> f64 {
        2.0 * self.radius
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(Error::InvalidParam("gravity must be finite".into()));
        }
        if !self.damping.is_finite() || self.damping <= 0.0 || self.damping > 1.0 {
            return Err(Error::InvalidParam("damping must lie in (0, 1]".into()));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 || self.radius >= 1.0 {
            return Err(Error::InvalidParam("radius must lie in (0, 1)".into()));
        }
        if !self.restitution.is_finite() || !(0.0..=1.0).contains(&self.restitution) {
            return Err(Error::InvalidParam("restitution must lie in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Closed per-axis intervals that random particles are drawn from.
///
/// Only constructible through [`SpawnRanges::new`] (or deserialization, which
/// goes through it), so every instance has finite bounds with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpawnBounds", into = "SpawnBounds")]
pub struct SpawnRanges {
    min_position: [f64; DIM],
    max_position: [f64; DIM],
    min_velocity: [f64; DIM],
    max_velocity: [f64; DIM],
}

/// Unchecked TOML shape of a `[spawn]` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnBounds {
    min_position: [f64; DIM],
    max_position: [f64; DIM],
    min_velocity: [f64; DIM],
    max_velocity: [f64; DIM],
}

impl TryFrom<SpawnBounds> for SpawnRanges {
    type Error = Error;

    fn try_from(b: SpawnBounds) -> Result<Self> {
        Self::new(b.min_position, b.max_position, b.min_velocity, b.max_velocity)
    }
}

impl From<SpawnRanges> for SpawnBounds {
    fn from(s: SpawnRanges) -> Self {
        Self {
            min_position: s.min_position,
            max_position: s.max_position,
            min_velocity: s.min_velocity,
            max_velocity: s.max_velocity,
        }
    }
}

impl SpawnRanges {
    /// Build spawn ranges after checking every bound is finite and `min <= max`.
    pub fn new(
        min_position: [f64; DIM],
        max_position: [f64; DIM],
        min_velocity: [f64; DIM],
        max_velocity: [f64; DIM],
    ) -> Result<Self> {
        check_interval("position", &min_position, &max_position)?;
        check_interval("velocity", &min_velocity, &max_velocity)?;
        Ok(Self {
            min_position,
            max_position,
            min_velocity,
            max_velocity,
        })
    }

    /// The whole viewport `[-ar, ar] x [-1, 1]` with velocities in
    /// `[-max_speed, max_speed]` on both axes.
    pub fn viewport(aspect_ratio: f64, max_speed: f64) -> Result<Self> {
        Self::new(
            [-aspect_ratio, -1.0],
            [aspect_ratio, 1.0],
            [-max_speed, -max_speed],
            [max_speed, max_speed],
        )
    }

    pub fn min_position(&self) -> [f64; DIM] {
        self.min_position
    }

    pub fn max_position(&self) -> [f64; DIM] {
        self.max_position
    }

    pub fn min_velocity(&self) -> [f64; DIM] {
        self.min_velocity
    }

    pub fn max_velocity(&self) -> [f64; DIM] {
        self.max_velocity
    }
}

fn check_interval(what: &str, lo: &[f64; DIM], hi: &[f64; DIM]) -> Result<()> {
    for (k, (&a, &b)) in lo.iter().zip(hi).enumerate() {
        if !a.is_finite() || !b.is_finite() {
            return Err(Error::InvalidParam(format!(
                "{what} bounds on axis {k} must be finite"
            )));
        }
        if a > b {
            return Err(Error::InvalidParam(format!(
                "{what} bounds on axis {k} are inverted ({a} > {b})"
            )));
        }
    }
    Ok(())
}

/// Everything needed to start a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub num_particles: usize,
    /// Initial viewport width / height.
    pub aspect_ratio: f64,
    /// Fixed timestep in seconds.
    pub dt: f64,
    /// RNG seed for reproducible populations; `None` draws from entropy.
    pub seed: Option<u64>,
    pub physics: PhysicsConfig,
    /// Randomisation ranges; `None` spawns across the whole initial viewport.
    pub spawn: Option<SpawnRanges>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_particles: DEFAULT_NUM_PARTICLES,
            aspect_ratio: 1.0,
            dt: DEFAULT_DT,
            seed: None,
            physics: PhysicsConfig::default(),
            spawn: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(Error::InvalidParam("num_particles must be > 0".into()));
        }
        check_aspect_ratio(self.aspect_ratio)?;
        check_dt(self.dt)?;
        self.physics.validate()
    }

    /// Spawn ranges in effect: the configured ones, or the full viewport.
    pub fn spawn_ranges(&self) -> Result<SpawnRanges> {
        match self.spawn {
            Some(s) => Ok(s),
            None => SpawnRanges::viewport(self.aspect_ratio, DEFAULT_SPAWN_SPEED),
        }
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

pub(crate) fn check_aspect_ratio(aspect_ratio: f64) -> Result<()> {
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(Error::InvalidParam(
            "aspect_ratio must be finite and > 0".into(),
        ));
    }
    Ok(())
}

pub(crate) fn check_dt(dt: f64) -> Result<()> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(Error::InvalidParam("dt must be finite and > 0".into()));
    }
    Ok(())
}
