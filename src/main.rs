use std::path::PathBuf;

use anyhow::{Context, Result};
use attractor_swarm::SwarmConfig;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Quasi-periodic attractor particle swarm.
#[derive(Parser)]
#[command(name = "attractor-swarm", version, about)]
struct Cli {
    /// JSON config file; missing fields use defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Number of particles
    #[arg(long)]
    particles: Option<usize>,

    /// Samples per particle trail
    #[arg(long)]
    trail_length: Option<usize>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Step-size multiplier applied to every particle
    #[arg(long)]
    convergence: Option<f64>,

    /// Run this many ticks without a window and report statistics
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    /// Write the effective config to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<SwarmConfig> {
        let mut config = match &self.config {
            Some(path) => SwarmConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => SwarmConfig::default(),
        };

        if let Some(particles) = self.particles {
            config.particle_count = particles;
        }
        if let Some(trail_length) = self.trail_length {
            config.trail_length = trail_length;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(convergence) = self.convergence {
            config.convergence = convergence;
        }
        Ok(config)
    }
}

fn run_headless(config: &SwarmConfig, frames: u64) -> Result<()> {
    let mut store = config.build_store()?;

    for _ in 0..frames {
        store.tick();
        store.clear_all_dirty();
    }

    let stats = store.stats();
    info!(
        frames,
        particles = store.particle_count(),
        stagnation_reseeds = stats.stagnation,
        divergence_reseeds = stats.divergence,
        "headless run finished"
    );
    if store.particle_count() > 0 {
        let p = store.latest(0)?;
        info!(x = p.x, y = p.y, z = p.z, "particle 0 position");
    }
    Ok(())
}

/// Filter from `RUST_LOG`, or `info` when it is unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if let Some(path) = &cli.write_config {
        config
            .save(path)
            .with_context(|| format!("writing config to {}", path.display()))?;
        info!(path = %path.display(), "wrote config");
        return Ok(());
    }

    match cli.headless {
        Some(frames) => run_headless(&config, frames),
        None => attractor_swarm::viewer::run(config).context("viewer failed"),
    }
}
