//! Headless simulation runner: builds a universe from CLI arguments and an
//! optional JSON configuration file, steps it for a fixed number of frames,
//! and logs periodic progress summaries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use swarmverse_core::{Universe, UniverseConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "swarmverse", about = "Headless particle-life simulation runner")]
struct Args {
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 1_000)]
    frames: u64,

    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f32,

    /// Path to a JSON configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed override for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Frames between progress reports; 0 silences them.
    #[arg(long, default_value_t = 100)]
    report_interval: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> Result<UniverseConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading configuration from {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing configuration from {}", path.display()))?
        }
        None => UniverseConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = Some(seed);
    }
    Ok(config)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args)?;
    let mut universe = Universe::new(config).context("building the universe")?;

    info!(
        particles = universe.particle_count(),
        frames = args.frames,
        frame_ms = args.frame_ms,
        "simulation start"
    );

    for _ in 0..args.frames {
        let frame = universe.step(args.frame_ms);
        if args.report_interval > 0 && frame.summary.frame % args.report_interval == 0 {
            info!(
                frame = frame.summary.frame,
                particles = frame.summary.particle_count,
                max_velocity = frame.summary.max_velocity,
                dilation = frame.summary.dilation,
                drifted = frame.summary.drifted,
                "progress"
            );
        }
    }

    info!(
        frames = universe.frame_count(),
        elapsed_ms = universe.elapsed_ms(),
        "simulation complete"
    );
    Ok(())
}
