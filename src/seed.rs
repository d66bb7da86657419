//! Seed context for particle initialization.
//!
//! All randomness in the swarm flows through an RNG owned by the
//! [`TrailStore`](crate::TrailStore). Seeder functions borrow it through a
//! [`SeedContext`], so a store built from `StdRng::seed_from_u64(n)` is fully
//! reproducible.
//!
//! ```
//! use attractor_swarm::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let store = TrailStore::initialize(100, 64, StdRng::seed_from_u64(7), |ctx| {
//!     // Spread particles along a line instead of the default box.
//!     DVec3::new(ctx.progress() * 2.0 - 1.0, 0.0, ctx.random_range(0.5, 1.5))
//! })
//! .unwrap();
//! assert_eq!(store.particle_count(), 100);
//! ```

use glam::DVec3;
use rand::Rng;

/// Context passed to seeder functions with helpers for common seed patterns.
pub struct SeedContext<'a, R: Rng> {
    /// Index of the particle being seeded (0 to count-1).
    pub index: usize,
    /// Total number of particles being seeded.
    pub count: usize,
    rng: &'a mut R,
}

impl<'a, R: Rng> SeedContext<'a, R> {
    pub(crate) fn new(index: usize, count: usize, rng: &'a mut R) -> Self {
        Self { index, count, rng }
    }

    /// Normalized progress through the seeding (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.index as f64 / self.count as f64
        }
    }

    /// Random f64 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Random f64 in `[min, max)`.
    ///
    /// # Panics
    ///
    /// Panics if `min >= max`.
    #[inline]
    pub fn random_range(&mut self, min: f64, max: f64) -> f64 {
        self.rng.gen_range(min..max)
    }

    /// Random point inside the axis-aligned box `[min, max)`.
    ///
    /// # Panics
    ///
    /// Panics if `min` is not strictly below `max` on every axis.
    pub fn random_in_box(&mut self, min: DVec3, max: DVec3) -> DVec3 {
        DVec3::new(
            self.rng.gen_range(min.x..max.x),
            self.rng.gen_range(min.y..max.y),
            self.rng.gen_range(min.z..max.z),
        )
    }

    /// Random point in the unit cube `[0, 1)³`.
    pub fn random_in_unit_cube(&mut self) -> DVec3 {
        unit_cube(&mut *self.rng)
    }

    /// Direct access to the underlying RNG.
    pub fn rng(&mut self) -> &mut R {
        &mut *self.rng
    }
}

/// Default seed: `x, y ∈ [-1, 1)`, `z ∈ [0.5, 1.5)`.
///
/// Places particles just above the attractor's core so the first few hundred
/// steps spiral outward onto the torus.
pub fn reference_seed<R: Rng>(ctx: &mut SeedContext<'_, R>) -> DVec3 {
    ctx.random_in_box(DVec3::new(-1.0, -1.0, 0.5), DVec3::new(1.0, 1.0, 1.5))
}

/// Uniform point in `[0, 1)³`, drawn x then y then z.
#[inline]
pub(crate) fn unit_cube<R: Rng>(rng: &mut R) -> DVec3 {
    let x = rng.gen::<f64>();
    let y = rng.gen::<f64>();
    let z = rng.gen::<f64>();
    DVec3::new(x, y, z)
}
