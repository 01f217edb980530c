//! Pixel World - Entry Point
//!
//! Headless runs execute a fixed number of ticks and print a summary;
//! otherwise an interactive terminal view drives the simulation in real time.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pixel_world::core::config::SimulationConfig;
use pixel_world::core::error::Result;
use pixel_world::simulation::{Simulation, SimulationEvent};
use pixel_world::ui::DeferredStderr;

/// Grid-world NPC simulation
#[derive(Parser, Debug)]
#[command(name = "pixel-world")]
#[command(about = "Grid-world NPC simulation with rule-based and learned agents")]
struct Args {
    /// Run this many ticks without a UI, then print a summary
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,

    /// TOML config file; flags below override its values
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of agents to spawn
    #[arg(long)]
    agents: Option<usize>,

    /// Fraction of agents with a learned brain (0.0 - 1.0)
    #[arg(long)]
    learned_ratio: Option<f32>,

    /// Directory for learned-brain state documents
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// JSON weights for the linear action scorer
    #[arg(long, value_name = "JSON")]
    scorer: Option<PathBuf>,

    /// Write every decision and world event as JSON lines
    #[arg(long, value_name = "JSONL")]
    log: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_toml_file(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(agents) = self.agents {
            config.agent_count = agents;
        }
        if let Some(ratio) = self.learned_ratio {
            config.learned_ratio = ratio;
        }
        if self.state_dir.is_some() {
            config.state_dir = self.state_dir;
        }
        if self.scorer.is_some() {
            config.scorer_path = self.scorer;
        }
        config.validate()?;
        Ok(config)
    }
}

/// JSON-lines sink for simulation events
struct EventLog {
    writer: BufWriter<File>,
    failed: bool,
}

impl EventLog {
    fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            failed: false,
        })
    }

    fn write(&mut self, event: &SimulationEvent) {
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            tracing::warn!(error = %e, "event log write failed, logging disabled");
            self.failed = true;
        }
    }

    fn finish(mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(error = %e, "failed to flush event log");
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The terminal view owns the screen, so its log lines wait until it is restored
    let interactive = args.headless.is_none();
    let (default_filter, log_writer) = if interactive {
        ("pixel_world=warn", DeferredStderr::holding())
    } else {
        ("pixel_world=info", DeferredStderr::passthrough())
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(log_writer.clone())
        .init();

    let result = run(args, &log_writer);
    if let Err(e) = log_writer.release() {
        eprintln!("failed to flush held log output: {e}");
    }
    result
}

fn run(args: Args, log_writer: &DeferredStderr) -> Result<()> {
    let headless = args.headless;
    let log_path = args.log.clone();
    let config = args.into_config()?;
    let mut event_log = log_path.as_deref().map(EventLog::create).transpose()?;

    let mut sim = Simulation::new(config)?;

    match headless {
        Some(ticks) => {
            tracing::info!(ticks, "running headless");
            let summary = sim.run_headless_with(ticks, |event| {
                if let Some(log) = event_log.as_mut() {
                    log.write(event);
                }
            });
            println!("=== PIXEL WORLD ===");
            println!("{summary}");
        }
        None => {
            let session = pixel_world::ui::run(&mut sim, |event| {
                if let Some(log) = event_log.as_mut() {
                    log.write(event);
                }
            });
            // Terminal is restored by now
            log_writer.release()?;
            session?;
            println!("{}", sim.summary());
        }
    }

    sim.shutdown();
    if let Some(log) = event_log {
        log.finish();
    }
    Ok(())
}
