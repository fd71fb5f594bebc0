//! Circular particles falling under gravity in a 2D viewport, with elastic
//! pair collisions and wall reflection, stepped at a fixed timestep.
//!
//! The crate is the physics core only. A host (window loop, renderer, the
//! bundled headless runner or the optional Python module) supplies the
//! timestep and resize notifications and reads back positions and colors.
//!
//! ```
//! use gravbox::core::{Simulation, SimulationConfig};
//!
//! let cfg = SimulationConfig { num_particles: 50, seed: Some(7), ..Default::default() };
//! let mut sim = Simulation::new(&cfg)?;
//! sim.advance(60);
//! for (pos, color) in sim.renderables() {
//!     let _ = (pos, color.to_array());
//! }
//! # Ok::<(), gravbox::error::Error>(())
//! ```

pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use crate::core::{
    CollisionOutcome, Color, FrameStats, Particle, PhysicsConfig, Simulation, SimulationConfig,
    SpawnRanges,
};
pub use crate::error::{Error, Result};
