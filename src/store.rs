//! Particle trail store: integration, circular history and reseeding.
//!
//! The store owns every particle's [`TrailBuffer`] and advances all of them
//! by one explicit-Euler step per [`tick`](TrailStore::tick). All buffers
//! share a single `counter`, so after any tick every particle's newest sample
//! lives in the same slot.
//!
//! # Reseeding
//!
//! A step whose displacement is below [`STAGNATION_EPSILON`] is discarded and
//! the particle jumps to a uniform point in `[0, 1)³`. This keeps particles
//! from piling up on fixed points of the field. Steps that produce NaN or
//! infinite coordinates are reseeded the same way, so a swarm never gets
//! stuck on non-finite values no matter how long it runs.
//!
//! # Example
//!
//! ```
//! use attractor_swarm::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut store = TrailStore::initialize(500, 1000, StdRng::seed_from_u64(1), reference_seed).unwrap();
//!
//! // Host loop, once per frame:
//! store.tick();
//! for i in store.dirty_particles().collect::<Vec<_>>() {
//!     let coords = store.buffer(i).unwrap();
//!     assert_eq!(coords.len(), 3 * 1000);
//!     store.clear_dirty(i).unwrap();
//! }
//! assert_eq!(store.counter(), 1);
//! ```

use glam::DVec3;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, trace};

use crate::error::StoreError;
use crate::field::AttractorField;
use crate::seed::{unit_cube, SeedContext};
use crate::trail::TrailBuffer;

/// Step size before per-particle convergence scaling.
pub const BASE_STEP: f64 = 0.01;

/// Displacements shorter than this trigger a reseed.
pub const STAGNATION_EPSILON: f64 = 1e-4;

/// Why a particle was reseeded instead of integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReseedCause {
    /// The step moved the particle less than [`STAGNATION_EPSILON`].
    Stagnation,
    /// The step produced a non-finite coordinate.
    Divergence,
}

/// Outcome of integrating a single particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// The integrated point is usable.
    Advanced(DVec3),
    /// The integrated point was rejected.
    Reseed(ReseedCause),
}

/// Integrate one explicit-Euler step from `p` with step `h` and classify it.
#[inline]
pub fn integrate(field: &AttractorField, p: DVec3, h: f64) -> Step {
    let next = p + field.derivative(p) * h;

    if !next.is_finite() {
        Step::Reseed(ReseedCause::Divergence)
    } else if next.distance(p) < STAGNATION_EPSILON {
        Step::Reseed(ReseedCause::Stagnation)
    } else {
        Step::Advanced(next)
    }
}

/// Running reseed counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReseedStats {
    /// Total stagnation reseeds since construction.
    pub stagnation: u64,
    /// Total divergence reseeds since construction.
    pub divergence: u64,
    /// Reseeds of either kind during the most recent tick.
    pub last_tick: usize,
}

impl ReseedStats {
    fn record(&mut self, cause: ReseedCause) {
        match cause {
            ReseedCause::Stagnation => self.stagnation += 1,
            ReseedCause::Divergence => self.divergence += 1,
        }
        self.last_tick += 1;
    }

    /// Total reseeds of either kind.
    pub fn total(&self) -> u64 {
        self.stagnation + self.divergence
    }
}

struct Particle {
    trail: TrailBuffer,
    convergence: f64,
    dirty: bool,
}

/// Owns N trail buffers of length M and advances them in lockstep.
///
/// `R` is the RNG used for reseeding. Pass a seeded RNG to get bit-identical
/// runs.
pub struct TrailStore<R: Rng = StdRng> {
    field: AttractorField,
    particles: Vec<Particle>,
    trail_length: usize,
    /// Slot of the newest sample, before reduction mod `trail_length`.
    counter: u64,
    rng: R,
    stats: ReseedStats,
}

impl<R: Rng> TrailStore<R> {
    /// Build a store of `particle_count` trails of `trail_length` samples.
    ///
    /// `seeder` is called once per particle, in index order, to produce the
    /// point written into slot 0. It draws randomness from `rng` through the
    /// [`SeedContext`], the same RNG later used for reseeds.
    pub fn initialize<F>(
        particle_count: usize,
        trail_length: usize,
        rng: R,
        seeder: F,
    ) -> Result<Self, StoreError>
    where
        F: FnMut(&mut SeedContext<'_, R>) -> DVec3,
    {
        Self::initialize_with_field(AttractorField::default(), particle_count, trail_length, rng, seeder)
    }

    /// Like [`initialize`](Self::initialize), integrating against `field`
    /// instead of the reference constants. The field is fixed for the
    /// lifetime of the store.
    pub fn initialize_with_field<F>(
        field: AttractorField,
        particle_count: usize,
        trail_length: usize,
        mut rng: R,
        mut seeder: F,
    ) -> Result<Self, StoreError>
    where
        F: FnMut(&mut SeedContext<'_, R>) -> DVec3,
    {
        if trail_length < 1 {
            return Err(StoreError::EmptyTrail);
        }

        let particles = (0..particle_count)
            .map(|i| {
                let mut ctx = SeedContext::new(i, particle_count, &mut rng);
                let seed = seeder(&mut ctx);
                Particle {
                    trail: TrailBuffer::new(trail_length, seed),
                    convergence: 1.0,
                    dirty: true,
                }
            })
            .collect();

        debug!(particle_count, trail_length, "initialized trail store");

        Ok(Self {
            field,
            particles,
            trail_length,
            counter: 0,
            rng,
            stats: ReseedStats::default(),
        })
    }

    /// Advance every particle by one step.
    ///
    /// Reads each particle's newest sample, integrates it, writes the result
    /// into the following slot and marks the particle dirty. The counter is
    /// incremented once after all particles have been written.
    pub fn tick(&mut self) {
        let prev_slot = self.counter;
        let next_slot = self.counter.wrapping_add(1);
        self.stats.last_tick = 0;

        for (i, particle) in self.particles.iter_mut().enumerate() {
            let p = particle.trail.get(prev_slot);
            let h = BASE_STEP * particle.convergence;

            let next = match integrate(&self.field, p, h) {
                Step::Advanced(next) => next,
                Step::Reseed(cause) => {
                    self.stats.record(cause);
                    let fresh = unit_cube(&mut self.rng);
                    trace!(particle = i, ?cause, ?p, ?fresh, "reseeded particle");
                    fresh
                }
            };

            particle.trail.set(next_slot, next);
            particle.dirty = true;
        }

        self.counter = next_slot;
    }

    /// Logical tick count. The newest sample lives at `counter() mod trail_length()`.
    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Number of particles.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Samples per trail.
    #[inline]
    pub fn trail_length(&self) -> usize {
        self.trail_length
    }

    /// Number of leading slots that hold real samples.
    ///
    /// Grows by one per tick until the buffers have wrapped, after which every
    /// slot is valid. Slots at or beyond this index are still zero.
    #[inline]
    pub fn valid_len(&self) -> usize {
        self.counter
            .saturating_add(1)
            .min(self.trail_length as u64) as usize
    }

    /// The field particles are integrated against.
    #[inline]
    pub fn field(&self) -> &AttractorField {
        &self.field
    }

    /// Reseed counters.
    #[inline]
    pub fn stats(&self) -> ReseedStats {
        self.stats
    }

    /// The trail of particle `index`.
    pub fn trail(&self, index: usize) -> Result<&TrailBuffer, StoreError> {
        Ok(&self.particle(index)?.trail)
    }

    /// Newest sample of particle `index`.
    pub fn latest(&self, index: usize) -> Result<DVec3, StoreError> {
        Ok(self.particle(index)?.trail.get(self.counter))
    }

    /// Flat `3 * trail_length()` coordinates of particle `index`.
    pub fn buffer(&self, index: usize) -> Result<&[f64], StoreError> {
        Ok(self.particle(index)?.trail.as_flat())
    }

    /// Mutable flat coordinates of particle `index`.
    ///
    /// The particle is marked dirty, since the caller may write through the slice.
    pub fn buffer_mut(&mut self, index: usize) -> Result<&mut [f64], StoreError> {
        let particle = self.particle_mut(index)?;
        particle.dirty = true;
        Ok(particle.trail.as_flat_mut())
    }

    /// Step-size multiplier of particle `index`.
    pub fn convergence(&self, index: usize) -> Result<f64, StoreError> {
        Ok(self.particle(index)?.convergence)
    }

    /// Set the step-size multiplier of particle `index`. The value is not validated.
    pub fn set_convergence(&mut self, index: usize, value: f64) -> Result<(), StoreError> {
        self.particle_mut(index)?.convergence = value;
        Ok(())
    }

    /// Set the step-size multiplier of every particle.
    pub fn set_all_convergence(&mut self, value: f64) {
        for particle in &mut self.particles {
            particle.convergence = value;
        }
    }

    /// Whether particle `index` changed since its flag was last cleared.
    pub fn is_dirty(&self, index: usize) -> Result<bool, StoreError> {
        Ok(self.particle(index)?.dirty)
    }

    /// Clear the dirty flag of particle `index` after upload.
    pub fn clear_dirty(&mut self, index: usize) -> Result<(), StoreError> {
        self.particle_mut(index)?.dirty = false;
        Ok(())
    }

    /// Clear every dirty flag.
    pub fn clear_all_dirty(&mut self) {
        for particle in &mut self.particles {
            particle.dirty = false;
        }
    }

    /// Indices of dirty particles, in ascending order.
    pub fn dirty_particles(&self) -> impl Iterator<Item = usize> + '_ {
        self.particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.dirty)
            .map(|(i, _)| i)
    }

    fn particle(&self, index: usize) -> Result<&Particle, StoreError> {
        let count = self.particles.len();
        self.particles
            .get(index)
            .ok_or(StoreError::ParticleOutOfRange { index, count })
    }

    fn particle_mut(&mut self, index: usize) -> Result<&mut Particle, StoreError> {
        let count = self.particles.len();
        self.particles
            .get_mut(index)
            .ok_or(StoreError::ParticleOutOfRange { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::AttractorParams;
    use crate::seed::reference_seed;
    use rand::SeedableRng;

    fn fixed_store(n: usize, m: usize, seed: DVec3) -> TrailStore {
        TrailStore::initialize(n, m, StdRng::seed_from_u64(0), move |_| seed).unwrap()
    }

    /// All constants zero; the derivative vanishes at the origin.
    fn zero_field() -> AttractorField {
        AttractorField::new(AttractorParams {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        })
    }

    #[test]
    fn test_rejects_empty_trail() {
        let result = TrailStore::initialize(3, 0, StdRng::seed_from_u64(0), reference_seed);
        assert_eq!(result.err(), Some(StoreError::EmptyTrail));
    }

    #[test]
    fn test_zero_particles_is_valid() {
        let mut store = fixed_store(0, 8, DVec3::ONE);
        store.tick();
        assert_eq!(store.counter(), 1);
        assert_eq!(store.dirty_particles().count(), 0);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut store = fixed_store(2, 4, DVec3::ONE);
        let expected = StoreError::ParticleOutOfRange { index: 2, count: 2 };
        assert_eq!(store.buffer(2).err(), Some(expected));
        assert_eq!(store.set_convergence(2, 1.0).err(), Some(expected));
        assert_eq!(store.is_dirty(2).err(), Some(expected));
        assert_eq!(store.clear_dirty(2).err(), Some(expected));
    }

    #[test]
    fn test_integrate_classifies_stagnation() {
        assert_eq!(zero_field().derivative(DVec3::ZERO), DVec3::ZERO);
        let step = integrate(&zero_field(), DVec3::ZERO, BASE_STEP);
        assert_eq!(step, Step::Reseed(ReseedCause::Stagnation));
    }

    #[test]
    fn test_integrate_classifies_divergence() {
        let field = AttractorField::default();
        let step = integrate(&field, DVec3::new(f64::INFINITY, 0.0, 1.0), BASE_STEP);
        assert_eq!(step, Step::Reseed(ReseedCause::Divergence));
    }

    #[test]
    fn test_zero_convergence_always_reseeds() {
        let mut store = fixed_store(1, 4, DVec3::new(0.1, 0.1, 1.0));
        store.set_convergence(0, 0.0).unwrap();
        store.tick();
        let p = store.latest(0).unwrap();
        assert_eq!(store.stats().stagnation, 1);
        assert!(p.x >= 0.0 && p.x < 1.0);
    }

    #[test]
    fn test_valid_len_grows_then_saturates() {
        let mut store = fixed_store(1, 3, DVec3::new(0.1, 0.1, 1.0));
        assert_eq!(store.valid_len(), 1);
        store.tick();
        assert_eq!(store.valid_len(), 2);
        store.tick();
        store.tick();
        store.tick();
        assert_eq!(store.valid_len(), 3);
    }

    #[test]
    fn test_buffer_mut_marks_dirty() {
        let mut store = fixed_store(1, 2, DVec3::ONE);
        store.clear_all_dirty();
        store.buffer_mut(0).unwrap()[0] = 5.0;
        assert!(store.is_dirty(0).unwrap());
        assert_eq!(store.latest(0).unwrap().x, 5.0);
    }

    #[test]
    fn test_integrate_advances_reference_field() {
        let field = AttractorField::default();
        let p = DVec3::new(0.1, 0.1, 1.0);
        match integrate(&field, p, BASE_STEP) {
            Step::Advanced(next) => assert!(next.distance(p) > STAGNATION_EPSILON),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_field_fixed_at_construction() {
        let store = fixed_store(1, 2, DVec3::ONE);
        assert_eq!(store.field().params(), &AttractorParams::REFERENCE);

        let store =
            TrailStore::initialize_with_field(zero_field(), 1, 2, StdRng::seed_from_u64(0), |_| DVec3::ZERO)
                .unwrap();
        assert_eq!(store.field().params().d, 0.0);
    }

    #[test]
    fn test_stats_reset_each_tick() {
        let mut store = fixed_store(3, 4, DVec3::ONE);
        store.set_all_convergence(0.0);
        store.tick();
        assert_eq!(store.stats().last_tick, 3);
        store.tick();
        assert_eq!(store.stats().last_tick, 3);
        assert_eq!(store.stats().total(), 6);
        assert_eq!(store.stats().divergence, 0);

        store.set_all_convergence(1.0);
        store.set_convergence(0, 0.0).unwrap();
        store.tick();
        assert_eq!(store.stats().last_tick, 1);
    }
}
