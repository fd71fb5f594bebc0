use crate::core::color::Color;
use crate::core::config::{PhysicsConfig, SpawnRanges};
use crate::error::{Error, Result};
use rand::Rng;

/// Fixed spatial dimension (2D).
pub const DIM: usize = 2;

/// Mass given to randomly spawned particles.
pub const DEFAULT_MASS: f64 = 1.0;

/// Center distances below this are treated as coincident.
pub const EPS_DISTANCE: f64 = 1e-9;

/// Contact normal used when two centers coincide. Pointing along +x means the
/// first particle of the pair (lower index in the simulation) moves left.
pub const FALLBACK_NORMAL: [f64; DIM] = [1.0, 0.0];

/// Result of testing one pair for contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// Centers are at least one contact distance apart; nothing changed.
    Apart,
    /// Overlapping but already moving apart along the normal; only the
    /// positions were pushed apart.
    Separated,
    /// Overlapping and approaching; impulse applied and positions pushed apart.
    Resolved,
}

/// A circular particle in the viewport.
///
/// Simulation space spans `[-1, 1]` vertically and `[-aspect_ratio, aspect_ratio]`
/// horizontally. The radius is shared by every particle and comes from
/// [`PhysicsConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    /// Mass (> 0).
    pub mass: f64,
    /// Render color; never black or white when randomly drawn.
    pub color: Color,
    aspect_ratio: f64,
}

impl Particle {
    /// Create a particle from explicit state after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `mass` or `aspect_ratio` is non-positive or
    ///   any component is NaN/inf.
    pub fn new(
        r: [f64; DIM],
        v: [f64; DIM],
        mass: f64,
        color: Color,
        aspect_ratio: f64,
    ) -> Result<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(Error::InvalidParam(
                "aspect_ratio must be finite and > 0".into(),
            ));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            r,
            v,
            mass,
            color,
            aspect_ratio,
        })
    }

    /// Draw a particle uniformly from `ranges`, with a random vivid color.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, ranges: &SpawnRanges, aspect_ratio: f64) -> Self {
        let (r_lo, r_hi) = (ranges.min_position(), ranges.max_position());
        let (v_lo, v_hi) = (ranges.min_velocity(), ranges.max_velocity());
        let mut r = [0.0_f64; DIM];
        let mut v = [0.0_f64; DIM];
        for k in 0..DIM {
            r[k] = rng.random_range(r_lo[k]..=r_hi[k]);
        }
        for k in 0..DIM {
            v[k] = rng.random_range(v_lo[k]..=v_hi[k]);
        }
        Self {
            r,
            v,
            mass: DEFAULT_MASS,
            color: Color::random_vivid(rng),
            aspect_ratio,
        }
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Record a new viewport aspect ratio. Position is left alone; the next
    /// boundary check pulls the particle back inside if needed.
    #[inline]
    pub fn update_aspect_ratio(&mut self, aspect_ratio: f64) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Advance by one timestep: gravity, damping, semi-implicit Euler, walls.
    ///
    /// Returns `true` if the particle touched a wall this step.
    pub fn update(&mut self, dt: f64, cfg: &PhysicsConfig) -> bool {
        self.v[1] += cfg.gravity * dt;
        for vk in &mut self.v {
            *vk *= cfg.damping;
        }
        for (rk, &vk) in self.r.iter_mut().zip(self.v.iter()) {
            *rk += vk * dt;
        }
        self.handle_boundary_collision(cfg)
    }

    /// Legal range of the center on each axis: `[lo, hi]` per axis.
    pub fn center_limits(&self, cfg: &PhysicsConfig) -> [(f64, f64); DIM] {
        let half_w = self.aspect_ratio - cfg.radius * self.aspect_ratio;
        let half_h = 1.0 - cfg.radius;
        [(-half_w, half_w), (-half_h, half_h)]
    }

    /// Clamp the center to the viewport and turn the velocity component
    /// inward on every wall the particle crossed.
    ///
    /// Returns `true` if any wall was hit.
    pub fn handle_boundary_collision(&mut self, cfg: &PhysicsConfig) -> bool {
        let limits = self.center_limits(cfg);
        let mut hit = false;
        for (k, (lo, hi)) in limits.into_iter().enumerate() {
            if self.r[k] < lo {
                self.r[k] = lo;
                self.v[k] = self.v[k].abs() * cfg.restitution;
                hit = true;
            } else if self.r[k] > hi {
                self.r[k] = hi;
                self.v[k] = -self.v[k].abs() * cfg.restitution;
                hit = true;
            }
        }
        hit
    }

    /// Whether the center currently lies inside the legal viewport region.
    pub fn within_viewport(&self, cfg: &PhysicsConfig) -> bool {
        self.center_limits(cfg)
            .iter()
            .zip(self.r.iter())
            .all(|(&(lo, hi), &x)| lo <= x && x <= hi)
    }

    /// Detect and resolve contact with `other`.
    ///
    /// Overlapping pairs are always pushed apart to exactly one contact
    /// distance along the normal. The impulse is applied only while the pair
    /// is approaching. Call at most once per unordered pair per frame.
    pub fn resolve_collision(&mut self, other: &mut Particle, cfg: &PhysicsConfig) -> CollisionOutcome {
        let mut d = [0.0_f64; DIM];
        for ((dk, &ro), &rs) in d.iter_mut().zip(other.r.iter()).zip(self.r.iter()) {
            *dk = ro - rs;
        }
        let contact = cfg.contact_distance();
        let mut distance = dot(&d, &d).sqrt();
        if distance >= contact {
            return CollisionOutcome::Apart;
        }

        let n = if distance < EPS_DISTANCE {
            distance = 0.0;
            FALLBACK_NORMAL
        } else {
            [d[0] / distance, d[1] / distance]
        };

        let mut u = [0.0_f64; DIM];
        for ((uk, &vo), &vs) in u.iter_mut().zip(other.v.iter()).zip(self.v.iter()) {
            *uk = vo - vs;
        }
        let u_n = dot(&u, &n);

        let outcome = if u_n > 0.0 {
            CollisionOutcome::Separated
        } else {
            let (ms, mo) = (self.mass, other.mass);
            let impulse = (1.0 + cfg.restitution) * u_n / (ms + mo);
            for (k, &nk) in n.iter().enumerate() {
                self.v[k] += impulse * mo * nk;
                other.v[k] -= impulse * ms * nk;
            }
            CollisionOutcome::Resolved
        };

        let half_overlap = 0.5 * (contact - distance);
        for (k, &nk) in n.iter().enumerate() {
            self.r[k] -= half_overlap * nk;
            other.r[k] += half_overlap * nk;
        }
        outcome
    }

    /// Returns the particle's kinetic energy: 1/2 m |v|^2.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * dot(&self.v, &self.v)
    }

    /// Linear momentum m v.
    #[inline]
    pub fn momentum(&self) -> [f64; DIM] {
        [self.mass * self.v[0], self.mass * self.v[1]]
    }

    /// Set position (validated as finite).
    pub fn set_position(&mut self, r: [f64; DIM]) -> Result<()> {
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        self.r = r;
        Ok(())
    }

    /// Set velocity (validated as finite).
    pub fn set_velocity(&mut self, v: [f64; DIM]) -> Result<()> {
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        self.v = v;
        Ok(())
    }
}

#[inline]
pub(crate) fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn at(r: [f64; DIM], v: [f64; DIM]) -> Result<Particle> {
        Particle::new(r, v, 1.0, Color::RED, 1.0)
    }

    #[test]
    fn new_particle_ok() -> Result<()> {
        let p = Particle::new([0.1, -0.2], [2.0, -3.0], 2.0, Color::RED, 1.5)?;
        assert_eq!(p.r, [0.1, -0.2]);
        assert_eq!(p.v, [2.0, -3.0]);
        assert_eq!(p.mass, 2.0);
        assert_eq!(p.aspect_ratio(), 1.5);
        Ok(())
    }

    #[test]
    fn invalid_mass_rejected() {
        let err = Particle::new([0.0; 2], [0.0; 2], 0.0, Color::RED, 1.0).unwrap_err();
        assert!(err.to_string().contains("mass"));
    }

    #[test]
    fn non_finite_state_rejected() {
        assert!(Particle::new([f64::NAN, 0.0], [0.0; 2], 1.0, Color::RED, 1.0).is_err());
        assert!(Particle::new([0.0; 2], [0.0, f64::INFINITY], 1.0, Color::RED, 1.0).is_err());
        assert!(Particle::new([0.0; 2], [0.0; 2], 1.0, Color::RED, -1.0).is_err());
    }

    #[test]
    fn random_particle_respects_ranges() -> Result<()> {
        let ranges = SpawnRanges::new([-0.5, 0.0], [0.5, 0.25], [0.0, -0.1], [0.2, 0.1])?;
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let p = Particle::random(&mut rng, &ranges, 1.0);
            assert!((-0.5..=0.5).contains(&p.r[0]));
            assert!((0.0..=0.25).contains(&p.r[1]));
            assert!((0.0..=0.2).contains(&p.v[0]));
            assert!((-0.1..=0.1).contains(&p.v[1]));
            assert_eq!(p.mass, DEFAULT_MASS);
            assert!(!p.color.is_black() && !p.color.is_white());
        }
        Ok(())
    }

    #[test]
    fn degenerate_ranges_pin_the_draw() -> Result<()> {
        let ranges = SpawnRanges::new([0.3, -0.4], [0.3, -0.4], [0.0; 2], [0.0; 2])?;
        let p = Particle::random(&mut StdRng::seed_from_u64(1), &ranges, 1.0);
        assert_eq!(p.r, [0.3, -0.4]);
        assert_eq!(p.v, [0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn update_applies_gravity_before_position() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut p = at([0.0, 0.0], [0.5, 0.0])?;
        p.update(0.1, &cfg);
        assert!((p.v[1] - (-0.1)).abs() < 1e-15);
        // Semi-implicit: position uses the already-updated velocity.
        assert!((p.r[1] - (-0.01)).abs() < 1e-15);
        assert!((p.r[0] - 0.05).abs() < 1e-15);
        Ok(())
    }

    #[test]
    fn damping_scales_velocity_each_step() -> Result<()> {
        let cfg = PhysicsConfig {
            gravity: 0.0,
            damping: 0.5,
            ..Default::default()
        };
        let mut p = at([0.0, 0.0], [0.4, -0.2])?;
        p.update(0.01, &cfg);
        assert_eq!(p.v, [0.2, -0.1]);
        Ok(())
    }

    #[test]
    fn left_and_bottom_walls_clamp_and_reflect() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut p = Particle::new([-3.0, -3.0], [-0.7, -0.2], 1.0, Color::RED, 2.0)?;
        assert!(p.handle_boundary_collision(&cfg));
        assert_eq!(p.r, [-2.0 + 0.05 * 2.0, -1.0 + 0.05]);
        assert_eq!(p.v, [0.7, 0.2]);
        Ok(())
    }

    #[test]
    fn right_and_top_walls_clamp_and_reflect() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut p = at([1.2, 0.99], [0.3, 0.4])?;
        assert!(p.handle_boundary_collision(&cfg));
        assert_eq!(p.r, [1.0 - cfg.radius * 1.0, 1.0 - cfg.radius]);
        assert_eq!(p.v, [-0.3, -0.4]);
        Ok(())
    }

    #[test]
    fn wall_forces_inward_sign_even_if_already_inward() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut p = at([-0.99, 0.0], [0.3, 0.0])?;
        p.handle_boundary_collision(&cfg);
        assert_eq!(p.v[0], 0.3);
        Ok(())
    }

    #[test]
    fn restitution_damps_wall_bounce() -> Result<()> {
        let cfg = PhysicsConfig {
            restitution: 0.5,
            ..Default::default()
        };
        let mut p = at([0.0, -2.0], [0.0, -1.0])?;
        p.handle_boundary_collision(&cfg);
        assert_eq!(p.v[1], 0.5);
        Ok(())
    }

    #[test]
    fn inside_particle_untouched_by_walls() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut p = at([0.2, 0.3], [-0.1, 0.1])?;
        let before = p.clone();
        assert!(!p.handle_boundary_collision(&cfg));
        assert_eq!(p, before);
        assert!(p.within_viewport(&cfg));
        Ok(())
    }

    #[test]
    fn distant_pair_is_untouched() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut a = at([0.0, 0.0], [0.1, 0.0])?;
        let mut b = at([0.1, 0.0], [0.1, 0.0])?;
        let (a0, b0) = (a.clone(), b.clone());
        assert_eq!(a.resolve_collision(&mut b, &cfg), CollisionOutcome::Apart);
        assert_eq!((a, b), (a0, b0));
        Ok(())
    }

    #[test]
    fn head_on_equal_masses_exchange_velocities() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut a = at([-0.04, 0.0], [0.1, 0.0])?;
        let mut b = at([0.04, 0.0], [-0.1, 0.0])?;
        assert_eq!(a.resolve_collision(&mut b, &cfg), CollisionOutcome::Resolved);
        assert!((a.v[0] + 0.1).abs() < 1e-15);
        assert!((b.v[0] - 0.1).abs() < 1e-15);
        assert!(((b.r[0] - a.r[0]) - 0.1).abs() < 1e-15);
        Ok(())
    }

    #[test]
    fn separating_overlap_is_pushed_apart_without_impulse() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut a = at([0.0, 0.0], [-0.2, 0.0])?;
        let mut b = at([0.06, 0.0], [0.2, 0.0])?;
        assert_eq!(a.resolve_collision(&mut b, &cfg), CollisionOutcome::Separated);
        assert_eq!(a.v, [-0.2, 0.0]);
        assert_eq!(b.v, [0.2, 0.0]);
        assert!(((b.r[0] - a.r[0]) - 0.1).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn coincident_centers_use_fallback_normal() -> Result<()> {
        let cfg = PhysicsConfig::default();
        let mut a = at([0.2, 0.2], [0.0, 0.0])?;
        let mut b = at([0.2, 0.2], [0.0, 0.0])?;
        assert_eq!(a.resolve_collision(&mut b, &cfg), CollisionOutcome::Resolved);
        for x in a.r.iter().chain(b.r.iter()).chain(a.v.iter()).chain(b.v.iter()) {
            assert!(x.is_finite());
        }
        assert!((a.r[0] - 0.15).abs() < 1e-15);
        assert!((b.r[0] - 0.25).abs() < 1e-15);
        assert_eq!(a.r[1], 0.2);
        assert_eq!(b.r[1], 0.2);
        Ok(())
    }

    #[test]
    fn kinetic_energy_and_momentum() -> Result<()> {
        let p = Particle::new([0.0; 2], [3.0, 4.0], 2.0, Color::RED, 1.0)?;
        assert!((p.kinetic_energy() - 25.0).abs() < 1e-12);
        assert_eq!(p.momentum(), [6.0, 8.0]);
        Ok(())
    }

    #[test]
    fn setters_validate() -> Result<()> {
        let mut p = at([0.0; 2], [0.0; 2])?;
        assert!(p.set_position([f64::NAN, 0.0]).is_err());
        assert!(p.set_velocity([0.0, f64::NEG_INFINITY]).is_err());
        p.set_position([0.1, 0.2])?;
        p.set_velocity([0.3, 0.4])?;
        assert_eq!((p.r, p.v), ([0.1, 0.2], [0.3, 0.4]));
        Ok(())
    }
}
