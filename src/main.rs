//! CLI Entry Point for transient_capture
//!
//! Provides command-line interface for:
//! - Recording every configured capture cycle on the simulated front end
//! - Checking a configuration file
//! - Showing the storage volume status (next file index per class, ledger rows)
//! - Reading one bounded line back from the volume
//!
//! # Usage
//!
//! ```bash
//! transient_capture --config config/capture.toml run
//! transient_capture check
//! transient_capture status
//! transient_capture read-line /datasets.csv --offset 11
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::info;
use transient_capture::acquisition::{MonotonicClock, Rig};
use transient_capture::config::{RunConfig, DEFAULT_CONFIG_PATH};
use transient_capture::data::read::{read_line_at, DEFAULT_MAX_LINE};
use transient_capture::data::{BlockStorage, FsStorage, OpenMode, StorageLayout};
use transient_capture::hardware::{LoggingIndicator, SimulatedFrontEnd, SimulatedSwitch};
use transient_capture::logging::{self, OutputFormat, TracingConfig};
use transient_capture::sequencer::Sequencer;

#[derive(Parser)]
#[command(name = "transient_capture")]
#[command(about = "Triggered multi-channel transient-capture logger", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for OutputFormat {
    fn from(value: LogFormat) -> Self {
        match value {
            LogFormat::Pretty => OutputFormat::Pretty,
            LogFormat::Compact => OutputFormat::Compact,
            LogFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record every configured cycle on the simulated front end
    Run {
        /// Give up on a cycle after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and print it as JSON
    Check,

    /// Show the next file index of every class and the ledger size
    Status,

    /// Read one line from a file on the storage volume
    ReadLine {
        /// Volume path, e.g. /datasets.csv
        path: String,

        /// Byte offset the line starts at
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Maximum line length including the terminator
        #[arg(long, default_value_t = DEFAULT_MAX_LINE)]
        max_len: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RunConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate().context("invalid configuration")?;

    let tracing_config = TracingConfig::from_run_config(&config)
        .map_err(anyhow::Error::msg)?
        .with_format(cli.log_format.into())
        .with_ansi(io::stdout().is_terminal());
    logging::init(tracing_config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Run { max_ticks, json } => run(&config, max_ticks, json),
        Commands::Check => check(&config),
        Commands::Status => status(&config),
        Commands::ReadLine {
            path,
            offset,
            max_len,
        } => read_line(&config, &path, offset, max_len),
    }
}

fn mount(config: &RunConfig) -> Result<FsStorage> {
    FsStorage::mount(&config.storage.root).context("storage unavailable, halting")
}

fn run(config: &RunConfig, max_ticks: Option<u64>, json: bool) -> Result<()> {
    let storage = mount(config)?;
    let mut sequencer = Sequencer::new(config, storage, MonotonicClock::new())
        .context("preparing storage layout")?;
    if let Some(ticks) = max_ticks {
        sequencer = sequencer.with_tick_limit(ticks);
    }

    let mut rig = Rig::new(
        SimulatedFrontEnd::new(config.channel_count(), &config.simulation),
        SimulatedSwitch::new(&config.simulation),
        LoggingIndicator::default(),
    );
    info!(
        channels = config.channel_count(),
        period_us = config.acquisition.sample_period_us,
        window = config.acquisition.sample_n,
        cycles = config.total_cycles(),
        "starting acquisition"
    );

    let summary = sequencer.run(&mut rig).context("capture run aborted")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for record in &summary.records {
            println!(
                "{:<24} class {} ch{} deviation {:>5} rows {} flush {} us",
                record.path,
                record.class,
                record.rise.channel,
                record.rise.deviation,
                record.rows,
                record.flush_us
            );
        }
        println!(
            "{} cycles recorded in {} ms",
            summary.records.len(),
            summary.elapsed_ms
        );
    }
    Ok(())
}

fn check(config: &RunConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn status(config: &RunConfig) -> Result<()> {
    let mut storage = mount(config)?;
    let layout = StorageLayout::from_config(config);
    let next = layout.next_file_indices(&storage)?;

    for (class, index) in config.classes.iter().zip(&next) {
        println!(
            "{:<12} next index {:<6} target {} cycles",
            class.folder, index, class.cycles
        );
    }
    println!(
        "{} holds {} label records",
        layout.ledger_path(),
        layout.ledger_rows(&mut storage)?
    );
    Ok(())
}

fn read_line(config: &RunConfig, path: &str, offset: u64, max_len: usize) -> Result<()> {
    let mut storage = mount(config)?;
    let mut handle = storage.open(path, OpenMode::Read)?;
    let line = read_line_at(&mut handle, offset, max_len);
    storage.close(handle)?;

    match line? {
        Some(line) => println!("{line}"),
        None => println!("<end of file>"),
    }
    Ok(())
}
