//! glofscan CLI - glacial lake feature extraction

mod sources;
mod table;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use glofscan_algorithms::imagery::WaterIndex;
use glofscan_algorithms::lake::snapshot;
use glofscan_algorithms::pipeline::{LakePipeline, LakeRequest, PipelineConfig};
use glofscan_algorithms::vector::Selection;
use glofscan_core::model::{LakePoint, SnapshotMode};

use crate::sources::{build_sources, SourceArgs};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "glofscan")]
#[command(author, version, about = "Feature extraction for glacial lakes", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the feature table for a list of lakes
    Extract {
        /// Lake list (CSV with longitude, latitude, year and optional mode)
        input: PathBuf,
        /// Feature table (CSV)
        output: PathBuf,
        /// Write failed lakes and their errors to this CSV
        #[arg(long)]
        failures: Option<PathBuf>,
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Delineate a single lake and print the snapshot as JSON
    Snapshot {
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Target year
        #[arg(long)]
        year: i32,
        /// Imagery window: baseline, pre-event
        #[arg(short, long, default_value = "baseline")]
        mode: String,
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Print the pipeline configuration as JSON
    Config {
        #[command(flatten)]
        tuning: Tuning,
    },
}

/// Configuration file plus per-flag overrides
#[derive(Args, Debug, Clone, Default)]
struct Tuning {
    /// Pipeline configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Water index threshold
    #[arg(short, long, allow_hyphen_values = true)]
    threshold: Option<f64>,
    /// Water index: ndwi, mndwi
    #[arg(long)]
    index: Option<String>,
    /// Polygon selection: largest, nearest
    #[arg(long)]
    selection: Option<String>,
    /// Smallest water body kept, in hectares
    #[arg(long)]
    min_area: Option<f64>,
    /// Analysis radius around each lake point, in meters
    #[arg(short, long)]
    buffer: Option<f64>,
    /// Glacier search buffer around each lake, in meters
    #[arg(long)]
    glacier_buffer: Option<f64>,
    /// Lakes processed at once (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,
}

impl Tuning {
    fn load(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(t) = self.threshold {
            config.snapshot.water.threshold = t;
        }
        if let Some(index) = &self.index {
            config.snapshot.water.index = parse_index(index)?;
        }
        if let Some(selection) = &self.selection {
            config.snapshot.vectorize.selection = parse_selection(selection)?;
        }
        if let Some(ha) = self.min_area {
            config.snapshot.vectorize.min_area_ha = ha;
        }
        if let Some(r) = self.buffer {
            config.snapshot.composite.radius_m = r;
        }
        if let Some(b) = self.glacier_buffer {
            config.proximity.buffer_m = b;
        }
        if let Some(n) = self.threads {
            config.max_concurrency = n;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn read_config(path: &Path) -> Result<PipelineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn parse_index(s: &str) -> Result<WaterIndex> {
    match s.to_lowercase().as_str() {
        "ndwi" => Ok(WaterIndex::Ndwi),
        "mndwi" => Ok(WaterIndex::Mndwi),
        _ => bail!("Unknown water index: {}. Use: ndwi, mndwi", s),
    }
}

fn parse_selection(s: &str) -> Result<Selection> {
    match s.to_lowercase().as_str() {
        "largest" => Ok(Selection::Largest),
        "nearest" | "nearest-to-point" => Ok(Selection::NearestToPoint),
        _ => bail!("Unknown selection: {}. Use: largest, nearest", s),
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn lake_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lakes ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

fn done(name: &str, path: &Path, elapsed: Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Extract {
            input,
            output,
            failures,
            sources,
            tuning,
        } => {
            let config = tuning.load()?;
            let lakes = table::read_lakes(&input)?;
            info!("Read {} lakes from {}", lakes.len(), input.display());

            let pb = spinner("Opening data sources...");
            let sources = build_sources(&sources, &config)?;
            pb.finish_and_clear();

            let pipeline = LakePipeline::new(sources, config).context("Failed to start pipeline")?;

            let start = Instant::now();
            let pb = lake_bar(lakes.len());
            let report = pipeline.run_batch(&lakes, |_: &LakeRequest| pb.inc(1))?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            table::write_features(&output, &report.records)?;
            println!(
                "Lakes: {} complete, {} partial, {} failed",
                report.complete(),
                report.partial(),
                report.failed()
            );
            if let Some(path) = failures {
                table::write_failures(&path, &report.failures)?;
                println!("Failures saved to: {}", path.display());
            }
            done("Feature table", &output, elapsed);
        }

        Commands::Snapshot {
            lon,
            lat,
            year,
            mode,
            sources,
            tuning,
        } => {
            let mode: SnapshotMode = mode.parse()?;
            let config = tuning.load()?;
            let sources = build_sources(&sources, &config)?;

            let pb = spinner("Building composite...");
            let start = Instant::now();
            let result = snapshot(&sources, LakePoint::new(lon, lat), year, mode, &config.snapshot)
                .context("Failed to delineate lake");
            pb.finish_and_clear();
            let result = result?;
            info!("Snapshot took {:.2?}", start.elapsed());

            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Config { tuning } => {
            let config = tuning.load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
