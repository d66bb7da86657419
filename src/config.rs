//! Swarm configuration.
//!
//! A [`SwarmConfig`] can be serialized to JSON and loaded by the viewer.
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "particle_count": 2000, "visuals": { "opacity": 0.05 } }
//! ```

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StoreError};
use crate::seed::reference_seed;
use crate::store::TrailStore;

/// Complete swarm configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    /// Number of particles.
    pub particle_count: usize,
    /// Samples kept per particle trail.
    pub trail_length: usize,
    /// RNG seed. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Initial step-size multiplier for every particle.
    pub convergence: f64,
    /// Log FPS every this many frames (0 disables).
    pub fps_report_interval: u64,
    pub visuals: VisualsConfig,
    pub camera: CameraConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            particle_count: 500,
            trail_length: 1000,
            seed: None,
            convergence: 1.0,
            fps_report_interval: 10,
            visuals: VisualsConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

/// How the point cloud is drawn.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualsConfig {
    /// Point colour, linear RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// Per-point alpha. Dense regions build up by overdraw.
    pub opacity: f32,
    /// Point size in pixels, independent of distance.
    pub point_size: f32,
    /// Clear colour.
    pub background: [f32; 3],
    /// World-space translation applied to the whole cloud.
    pub offset: [f32; 3],
}

impl Default for VisualsConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 0.02,
            point_size: 2.0,
            background: [0.0, 0.0, 0.0],
            offset: [0.0, 0.0, -0.7],
        }
    }
}

/// Initial orbit camera placement.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position; the camera looks at the origin.
    pub position: [f32; 3],
    /// Fraction of orbit velocity removed per frame.
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [-0.989, 0.347, -2.342],
            damping: 0.05,
        }
    }
}

impl SwarmConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// RNG for the store, seeded from `seed` when set.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Build a store with reference seeding and the configured convergence.
    pub fn build_store(&self) -> Result<TrailStore<StdRng>, StoreError> {
        let mut store =
            TrailStore::initialize(self.particle_count, self.trail_length, self.rng(), reference_seed)?;
        store.set_all_convergence(self.convergence);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SwarmConfig::from_json(r#"{ "particle_count": 12, "visuals": { "opacity": 0.5 } }"#).unwrap();
        assert_eq!(config.particle_count, 12);
        assert_eq!(config.trail_length, 1000);
        assert_eq!(config.visuals.opacity, 0.5);
        assert_eq!(config.visuals.point_size, 2.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SwarmConfig {
            seed: Some(99),
            convergence: 0.5,
            ..Default::default()
        };
        let parsed = SwarmConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_json() {
        let err = SwarmConfig::from_json("{ particle_count: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SwarmConfig::load("/nonexistent/attractor-swarm.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_build_store_applies_settings() {
        let config = SwarmConfig {
            particle_count: 4,
            trail_length: 16,
            seed: Some(5),
            convergence: 2.0,
            ..Default::default()
        };
        let store = config.build_store().unwrap();
        assert_eq!(store.particle_count(), 4);
        assert_eq!(store.trail_length(), 16);
        assert_eq!(store.convergence(3).unwrap(), 2.0);

        let again = config.build_store().unwrap();
        assert_eq!(store.buffer(0).unwrap(), again.buffer(0).unwrap());
    }

    #[test]
    fn test_build_store_rejects_empty_trail() {
        let config = SwarmConfig {
            trail_length: 0,
            ..Default::default()
        };
        assert_eq!(config.build_store().err(), Some(StoreError::EmptyTrail));
    }
}
