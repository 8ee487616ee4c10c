use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use readtime_heatmap::canvas::Canvas;
use readtime_heatmap::config::Config;
use readtime_heatmap::error::HeatmapError;
use readtime_heatmap::heatmap;
use readtime_heatmap::source::{FileSource, ReadTimeSource, ReadTimes, WeReadClient};

/// Renders WeRead reading time as a calendar heatmap SVG.
#[derive(Parser)]
#[command(name = "readtime-heatmap", about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Logging verbosity level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Read samples from a reading summary JSON file instead of the API.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output SVG path (overrides the configured one).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail when there is no reading activity at all.
    #[arg(long)]
    require_data: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print version information and exit.
    Version,
}

/// Build-time version info.
mod version {
    /// Release version string (set at build time).
    pub const RELEASE: &str = env!("CARGO_PKG_VERSION");

    /// Git commit hash (set at build time via env, or "unknown").
    pub fn git_commit() -> &'static str {
        option_env!("GIT_COMMIT").unwrap_or("unknown")
    }

    /// Full version string with platform info.
    pub fn full() -> String {
        format!(
            "{} (commit: {}, {}/{})",
            RELEASE,
            git_commit(),
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Version) = &cli.command {
        println!("readtime-heatmap {}", version::full());
        return Ok(());
    }

    let filter = EnvFilter::try_new(&cli.log_level)
        .with_context(|| format!("invalid log level: {}", cli.log_level))?;

    fmt().with_env_filter(filter).with_target(true).init();

    let mut cfg = Config::resolve(cli.config.as_deref(), |key| std::env::var(key).ok())
        .context("loading configuration")?;
    if let Some(output) = cli.output.clone() {
        cfg.output = output;
    }
    if cli.require_data {
        cfg.require_data = true;
    }

    tracing::info!(
        version = version::RELEASE,
        commit = version::git_commit(),
        start_year = cfg.start_year,
        end_year = cfg.end_year,
        "starting readtime-heatmap",
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let read_times = rt
        .block_on(fetch(&cli, &cfg))
        .map_err(HeatmapError::from_fetch)?;

    tracing::info!(samples = read_times.len(), "read times fetched");

    let heatmap = heatmap::build(&cfg, &read_times)?;
    heatmap.canvas.save(&cfg.output)?;

    Ok(())
}

async fn fetch(cli: &Cli, cfg: &Config) -> Result<ReadTimes> {
    match &cli.input {
        Some(path) => FileSource::new(path).fetch().await,
        None => WeReadClient::new(&cfg.source)?.fetch().await,
    }
}
