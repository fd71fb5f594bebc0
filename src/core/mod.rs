//! Core data structures and the fixed-timestep physics loop.
//!
//! Leaves first: [`color`] and [`config`] feed [`particle`], which the
//! [`sim`] loop drives once per frame.

pub mod color;
pub mod config;
pub mod particle;
pub mod sim;

pub use color::Color;
pub use config::{PhysicsConfig, SimulationConfig, SpawnRanges};
pub use particle::{CollisionOutcome, Particle};
pub use sim::{FrameStats, Simulation};
