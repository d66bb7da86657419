//! Fixed-capacity circular history of particle positions.
//!
//! A [`TrailBuffer`] never grows or shrinks after construction. The store
//! writes one sample per tick at `counter mod len` and the oldest sample is
//! overwritten once the buffer has wrapped.

use glam::DVec3;

/// Circular buffer of `len` 3D samples.
///
/// Storage is a contiguous `Vec<DVec3>`, so the whole buffer can be viewed as
/// a flat `[x0, y0, z0, x1, y1, z1, ...]` slice for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailBuffer {
    samples: Vec<DVec3>,
}

impl TrailBuffer {
    /// Create a buffer of `len` samples with `seed` in slot 0 and zeros elsewhere.
    ///
    /// `len` must be at least 1; the store checks this before calling.
    pub(crate) fn new(len: usize, seed: DVec3) -> Self {
        let mut samples = vec![DVec3::ZERO; len];
        samples[0] = seed;
        Self { samples }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a trail holds at least one slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `slot mod len`.
    #[inline]
    pub fn get(&self, slot: u64) -> DVec3 {
        self.samples[self.wrap(slot)]
    }

    #[inline]
    pub(crate) fn set(&mut self, slot: u64, value: DVec3) {
        let idx = self.wrap(slot);
        self.samples[idx] = value;
    }

    /// All slots in storage order (not chronological once wrapped).
    #[inline]
    pub fn samples(&self) -> &[DVec3] {
        &self.samples
    }

    /// The buffer as `3 * len` interleaved coordinates.
    #[inline]
    pub fn as_flat(&self) -> &[f64] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Mutable flat view. The slice length is fixed.
    #[inline]
    pub fn as_flat_mut(&mut self) -> &mut [f64] {
        bytemuck::cast_slice_mut(&mut self.samples)
    }

    #[inline]
    fn wrap(&self, slot: u64) -> usize {
        (slot % self.samples.len() as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_slot_zero() {
        let trail = TrailBuffer::new(4, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(trail.len(), 4);
        assert_eq!(trail.get(0), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(trail.get(1), DVec3::ZERO);
    }

    #[test]
    fn test_slot_wraps() {
        let mut trail = TrailBuffer::new(3, DVec3::ZERO);
        trail.set(4, DVec3::ONE);
        assert_eq!(trail.get(1), DVec3::ONE);
        assert_eq!(trail.get(7), DVec3::ONE);
    }

    #[test]
    fn test_flat_layout() {
        let mut trail = TrailBuffer::new(2, DVec3::new(1.0, 2.0, 3.0));
        trail.set(1, DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(trail.as_flat(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        trail.as_flat_mut()[4] = -5.0;
        assert_eq!(trail.get(1), DVec3::new(4.0, -5.0, 6.0));
    }

    #[test]
    fn test_single_slot_buffer() {
        let mut trail = TrailBuffer::new(1, DVec3::ONE);
        trail.set(10, DVec3::NEG_ONE);
        assert_eq!(trail.get(0), DVec3::NEG_ONE);
        assert_eq!(trail.as_flat().len(), 3);
    }
}
