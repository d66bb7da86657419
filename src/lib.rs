//! # attractor-swarm
//!
//! A swarm of particles tracing a quasi-periodic attractor, each one keeping
//! a circular buffer of its recent positions for rendering as a point cloud.
//!
//! ## Quick Start
//!
//! ```
//! use attractor_swarm::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut store = TrailStore::initialize(500, 1000, StdRng::seed_from_u64(0), reference_seed).unwrap();
//!
//! for _ in 0..60 {
//!     store.tick();
//! }
//!
//! let coords: &[f64] = store.buffer(0).unwrap();
//! assert_eq!(coords.len(), 3 * 1000);
//! assert_eq!(store.valid_len(), 61);
//! ```
//!
//! ## Core Concepts
//!
//! ### Field
//!
//! [`AttractorField`] evaluates the fixed vector field. It is pure and
//! never fails, even for non-finite input.
//!
//! ### Store
//!
//! [`TrailStore`] owns N trail buffers of M samples. Each
//! [`tick`](TrailStore::tick) takes one Euler step of size
//! `0.01 * convergence` per particle, reseeding particles that stall or
//! diverge, and marks every particle dirty.
//!
//! ### Rendering contract
//!
//! The store never shares its storage. A renderer reads
//! [`buffer`](TrailStore::buffer) for each index in
//! [`dirty_particles`](TrailStore::dirty_particles) after the frame's tick,
//! then calls [`clear_dirty`](TrailStore::clear_dirty). Only the first
//! [`valid_len`](TrailStore::valid_len) slots hold real samples.
//!
//! ## Viewer
//!
//! With the default `viewer` feature, [`viewer::run`] opens a window and
//! drives the store from a winit event loop with a wgpu point renderer.

pub mod clock;
pub mod config;
pub mod error;
pub mod field;
pub mod seed;
pub mod store;
pub mod trail;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use config::{CameraConfig, SwarmConfig, VisualsConfig};
pub use error::{ConfigError, StoreError};
#[cfg(feature = "viewer")]
pub use error::ViewerError;
pub use field::{AttractorField, AttractorParams};
pub use glam::DVec3;
pub use seed::{reference_seed, SeedContext};
pub use store::{ReseedCause, ReseedStats, Step, TrailStore, BASE_STEP, STAGNATION_EPSILON};
pub use trail::TrailBuffer;

/// Convenient re-exports for common usage.
///
/// ```
/// use attractor_swarm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::FrameClock;
    pub use crate::config::SwarmConfig;
    pub use crate::error::StoreError;
    pub use crate::field::{AttractorField, AttractorParams};
    pub use crate::seed::{reference_seed, SeedContext};
    pub use crate::store::{ReseedCause, TrailStore};
    pub use crate::trail::TrailBuffer;
    pub use crate::DVec3;
}
