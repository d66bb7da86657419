//! Error types for attractor-swarm.
//!
//! The simulation itself cannot fail once constructed. These errors cover
//! precondition breaches at the store boundary, configuration loading, and
//! viewer start-up.

use thiserror::Error;

/// Invalid arguments passed to a [`TrailStore`](crate::TrailStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Particle index outside `[0, count)`.
    #[error("particle index {index} out of range for {count} particles")]
    ParticleOutOfRange { index: usize, count: usize },
    /// Trail buffers must hold at least one sample.
    #[error("trail length must be at least 1")]
    EmptyTrail,
}

/// Errors that can occur while loading or saving a [`SwarmConfig`](crate::SwarmConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid config JSON.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while starting the viewer.
#[cfg(feature = "viewer")]
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a WebGPU/Vulkan/Metal/DX12 capable GPU is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// `particles * trail_length` does not fit the GPU instance range.
    #[error("{particles} particles x {trail_length} samples exceeds the GPU instance range")]
    SampleCountOverflow { particles: usize, trail_length: usize },
    /// The trail storage buffer is larger than the device allows.
    #[error("trail buffer needs {bytes} bytes but the GPU allows at most {limit}; reduce particles or trail length")]
    TrailBufferTooLarge { bytes: u64, limit: u64 },
    /// The store could not be built from the config.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::ParticleOutOfRange { index: 7, count: 3 };
        assert_eq!(err.to_string(), "particle index 7 out of range for 3 particles");
        assert_eq!(StoreError::EmptyTrail.to_string(), "trail length must be at least 1");
    }

    #[test]
    fn test_config_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("invalid config JSON"));
    }
}
