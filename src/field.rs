//! The quasi-periodic attractor vector field.
//!
//! Particles follow the flow of a fixed three-dimensional system:
//!
//! ```text
//! dx/dt = (z - b)x - dy
//! dy/dt = dx + (z - b)y
//! dz/dt = c + az - z³/3 - (x² + y²)(1 + ez) + fzx³
//! ```
//!
//! The `x`/`y` pair rotates around the `z` axis at angular rate `d` while
//! growing or shrinking with `z - b`, and the cubic `z` equation folds the
//! trajectory back onto a torus-like surface.
//!
//! # Example
//!
//! ```
//! use attractor_swarm::field::AttractorField;
//! use glam::DVec3;
//!
//! let field = AttractorField::default();
//! let d = field.derivative(DVec3::new(0.1, 0.1, 1.0));
//! assert!(d.length() > 0.0);
//! ```

use glam::DVec3;

/// The six constants that define the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttractorParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AttractorParams {
    /// Constants used by the swarm.
    pub const REFERENCE: Self = Self {
        a: 0.95,
        b: 0.7,
        c: 0.6,
        d: 3.5,
        e: 0.25,
        f: 0.1,
    };
}

impl Default for AttractorParams {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Stateless evaluator for the attractor equations.
///
/// Parameters are fixed at construction; there is no way to change them on
/// a live field. Inputs are not sanitised, so non-finite coordinates produce
/// non-finite derivatives and it is up to the integrator to deal with them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttractorField {
    params: AttractorParams,
}

impl AttractorField {
    /// Create a field with the given constants.
    pub const fn new(params: AttractorParams) -> Self {
        Self { params }
    }

    /// The constants this field evaluates.
    #[inline]
    pub fn params(&self) -> &AttractorParams {
        &self.params
    }

    /// Instantaneous derivative at `p`.
    #[inline]
    pub fn derivative(&self, p: DVec3) -> DVec3 {
        let AttractorParams { a, b, c, d, e, f } = self.params;
        let DVec3 { x, y, z } = p;

        let dx = (z - b) * x - d * y;
        let dy = d * x + (z - b) * y;
        let dz = c + a * z - (z * z * z) / 3.0 - (x * x + y * y) * (1.0 + e * z) + f * z * x * x * x;

        DVec3::new(dx, dy, dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_at_origin() {
        let field = AttractorField::default();
        let d = field.derivative(DVec3::ZERO);
        // Only the constant term survives.
        assert_eq!(d, DVec3::new(0.0, 0.0, 0.6));
    }

    #[test]
    fn test_derivative_matches_hand_evaluation() {
        let field = AttractorField::default();
        let d = field.derivative(DVec3::new(0.1, 0.1, 1.0));

        let expected_dx = (1.0 - 0.7) * 0.1 - 3.5 * 0.1;
        let expected_dy = 3.5 * 0.1 + (1.0 - 0.7) * 0.1;
        let expected_dz = 0.6 + 0.95 - 1.0 / 3.0 - 0.02 * 1.25 + 0.1 * 0.001;

        assert!((d.x - expected_dx).abs() < 1e-12);
        assert!((d.y - expected_dy).abs() < 1e-12);
        assert!((d.z - expected_dz).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_is_antisymmetric_in_xy() {
        // At z == b the planar part is a pure rotation by d.
        let field = AttractorField::default();
        let d = field.derivative(DVec3::new(1.0, 0.0, 0.7));
        assert!(d.x.abs() < 1e-12);
        assert!((d.y - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_custom_params() {
        let field = AttractorField::new(AttractorParams {
            f: 0.0,
            ..AttractorParams::REFERENCE
        });
        assert_eq!(field.params().f, 0.0);
        assert_eq!(field.params().a, 0.95);
    }

    #[test]
    fn test_non_finite_input_propagates() {
        let field = AttractorField::default();
        let d = field.derivative(DVec3::new(f64::NAN, 0.0, 0.0));
        assert!(!d.is_finite());
    }
}
