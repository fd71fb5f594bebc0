use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::particle::DIM;
use crate::core::{PhysicsConfig, Simulation, SimulationConfig};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_array2<T: Copy + numpy::Element + Default, const W: usize>(
    rows: impl ExactSizeIterator<Item = [T; W]>,
) -> Array2<T> {
    let mut arr = Array2::<T>::default((rows.len(), W));
    for (i, row) in rows.enumerate() {
        for (k, x) in row.into_iter().enumerate() {
            arr[[i, k]] = x;
        }
    }
    arr
}

fn read_rows(arr: &PyReadonlyArray2<'_, f64>, n: usize, what: &str) -> PyResult<Vec<[f64; DIM]>> {
    let view = arr.as_array();
    if view.shape() != [n, DIM] {
        return Err(py_err(format!(
            "{what} must have shape ({n}, {DIM}), got {:?}",
            view.shape()
        )));
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let row = [view[[i, 0]], view[[i, 1]]];
        if !row.iter().all(|x| x.is_finite()) {
            return Err(py_err(format!("{what} values must be finite")));
        }
        out.push(row);
    }
    Ok(out)
}

/// Python-facing wrapper around the particle box.
///
/// The host drives it once per displayed frame with `step()`, forwards
/// framebuffer resizes with `resize(w, h)`, and draws from `get_positions()`
/// and `get_colors()`.
#[pyclass]
pub struct ParticleSim {
    sim: Simulation,
}

#[pymethods]
impl ParticleSim {
    /// Spawn a random population across the whole initial viewport.
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (
        num_particles=500,
        aspect_ratio=1.0,
        dt=0.016,
        gravity=-1.0,
        radius=0.05,
        damping=1.0,
        restitution=1.0,
        seed=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_particles: usize,
        aspect_ratio: f64,
        dt: f64,
        gravity: f64,
        radius: f64,
        damping: f64,
        restitution: f64,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let cfg = SimulationConfig {
            num_particles,
            aspect_ratio,
            dt,
            seed,
            physics: PhysicsConfig {
                gravity,
                damping,
                radius,
                restitution,
            },
            spawn: None,
        };
        let sim = Simulation::new(&cfg).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Load a TOML config file and spawn from it.
    #[staticmethod]
    fn from_config(path: std::path::PathBuf) -> PyResult<Self> {
        let cfg = SimulationConfig::load(path).map_err(py_err)?;
        let sim = Simulation::new(&cfg).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Advance `frames` frames (releases the GIL during computation).
    ///
    /// Returns (contacts, impulses, wall_hits) summed over the frames.
    #[pyo3(signature = (frames=1))]
    fn step(&mut self, py: Python<'_>, frames: u64) -> (usize, usize, usize) {
        let stats = py.detach(|| self.sim.advance(frames));
        (stats.contacts, stats.impulses, stats.wall_hits)
    }

    /// Push a new aspect ratio to every particle.
    fn set_aspect_ratio(&mut self, aspect_ratio: f64) -> PyResult<()> {
        self.sim.set_aspect_ratio(aspect_ratio).map_err(py_err)
    }

    /// Framebuffer resize; returns the new aspect ratio.
    fn resize(&mut self, width: u32, height: u32) -> PyResult<f64> {
        self.sim.resize(width, height).map_err(py_err)
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions(&self, py: Python<'_>) -> Py<PyArray2<f64>> {
        let rows = self.sim.particles().iter().map(|p| p.r);
        to_array2(rows).into_pyarray(py).unbind()
    }

    /// Return velocities as a NumPy array of shape (N, 2), dtype=float64.
    fn get_velocities(&self, py: Python<'_>) -> Py<PyArray2<f64>> {
        let rows = self.sim.particles().iter().map(|p| p.v);
        to_array2(rows).into_pyarray(py).unbind()
    }

    /// Return colors as a NumPy array of shape (N, 3), dtype=float32.
    fn get_colors(&self, py: Python<'_>) -> Py<PyArray2<f32>> {
        let rows = self.sim.particles().iter().map(|p| p.color.to_array());
        to_array2(rows).into_pyarray(py).unbind()
    }

    /// Overwrite all positions from an (N, 2) float64 array.
    fn set_positions(&mut self, positions: PyReadonlyArray2<'_, f64>) -> PyResult<()> {
        let rows = read_rows(&positions, self.sim.num_particles(), "positions")?;
        for (p, r) in self.sim.particles_mut().iter_mut().zip(rows) {
            p.set_position(r).map_err(py_err)?;
        }
        Ok(())
    }

    /// Overwrite all velocities from an (N, 2) float64 array.
    fn set_velocities(&mut self, velocities: PyReadonlyArray2<'_, f64>) -> PyResult<()> {
        let rows = read_rows(&velocities, self.sim.num_particles(), "velocities")?;
        for (p, v) in self.sim.particles_mut().iter_mut().zip(rows) {
            p.set_velocity(v).map_err(py_err)?;
        }
        Ok(())
    }

    fn kinetic_energy(&self) -> f64 {
        self.sim.kinetic_energy()
    }

    fn time(&self) -> f64 {
        self.sim.time()
    }

    fn frame(&self) -> u64 {
        self.sim.frame()
    }

    fn aspect_ratio(&self) -> f64 {
        self.sim.aspect_ratio()
    }

    fn __len__(&self) -> usize {
        self.sim.num_particles()
    }
}

/// The gravbox Python module entry point.
#[pymodule]
fn gravbox(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ParticleSim>()?;
    Ok(())
}
