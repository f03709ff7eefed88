//! Run configuration using Figment
//!
//! Configuration is immutable once loaded and is passed by reference to every component.
//! Sources are merged in order:
//! 1. Built-in defaults (the values the logger ships with)
//! 2. `config/capture.toml` (or a file given on the command line)
//! 3. Environment variables prefixed with `CAPTURE_`, nested keys split on `__`
//!
//! # Example
//! ```no_run
//! use transient_capture::config::RunConfig;
//!
//! let config = RunConfig::load()?;
//! config.validate()?;
//! println!("Window: {} samples", config.acquisition.sample_n);
//! # Ok::<(), transient_capture::error::CaptureError>(())
//! ```
//!
//! Environment example: `CAPTURE_ACQUISITION__THRESHOLD=300`.

use crate::error::{CaptureError, CaptureResult};
use crate::validation;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/capture.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "CAPTURE_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Sampling and trigger parameters
    pub acquisition: AcquisitionConfig,
    /// Analog channels, in sampling order
    pub channels: Vec<ChannelConfig>,
    /// Storage layout
    pub storage: StorageConfig,
    /// Classes to collect, in collection order
    pub classes: Vec<ClassConfig>,
    /// Parameters of the simulated front end used by the CLI
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Sampling clock, window and trigger settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Fixed inter-sample period in microseconds
    pub sample_period_us: u64,
    /// Total window length per channel (pre + post trigger)
    pub sample_n: usize,
    /// Samples kept from before the trigger
    pub pre_trigger_n: usize,
    /// Fresh samples averaged per channel after arming
    pub baseline_n: usize,
    /// Absolute deviation from baseline that must be exceeded to trigger
    pub threshold: u16,
}

impl AcquisitionConfig {
    /// Samples collected from the trigger tick onwards.
    pub fn post_trigger_n(&self) -> usize {
        self.sample_n.saturating_sub(self.pre_trigger_n)
    }
}

/// One analog input channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Display name
    pub name: String,
    /// Hardware source identifier (pin name)
    pub source: String,
}

/// Storage layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the storage volume
    pub root: PathBuf,
    /// File name of the shared label ledger at the volume root
    pub ledger_name: String,
    /// Header row written when the ledger is created
    pub ledger_header: String,
    /// Log every n-th row written (0 disables row progress)
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

/// One class (output folder) and its target cycle count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Folder name on the volume
    pub folder: String,
    /// Capture cycles to record for this class
    pub cycles: u32,
}

/// Simulated analog front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// RNG seed, for reproducible runs
    pub seed: u64,
    /// Quiescent level of every channel
    pub level: u16,
    /// Peak noise amplitude around the quiescent level
    pub noise: u16,
    /// Height of injected transients
    pub spike_height: u16,
    /// Per-tick probability that a transient starts
    pub spike_probability: f64,
    /// Ticks the transient lasts
    pub spike_ticks: u32,
    /// Arm switch reads before it reports pressed
    pub arm_after_reads: u64,
}

fn default_progress_every() -> usize {
    10_000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            level: 2048,
            noise: 20,
            spike_height: 600,
            spike_probability: 1.0e-4,
            spike_ticks: 40,
            arm_after_reads: 10,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            acquisition: AcquisitionConfig {
                sample_period_us: 10,
                sample_n: 9600,
                pre_trigger_n: 5000,
                baseline_n: 100,
                threshold: 240,
            },
            channels: ["A9", "A7", "A3"]
                .iter()
                .enumerate()
                .map(|(i, pin)| ChannelConfig {
                    name: format!("sensor{i}"),
                    source: (*pin).to_string(),
                })
                .collect(),
            storage: StorageConfig {
                root: PathBuf::from("data"),
                ledger_name: "datasets.csv".to_string(),
                ledger_header: "x:sensor,y".to_string(),
                progress_every: default_progress_every(),
            },
            classes: ["110001", "210001"]
                .iter()
                .map(|folder| ClassConfig {
                    folder: (*folder).to_string(),
                    cycles: 20,
                })
                .collect(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from `config/capture.toml` and the environment
    pub fn load() -> CaptureResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> CaptureResult<Self> {
        Ok(Self::figment(path).extract()?)
    }

    /// The merged provider chain, exposed for callers that layer extra sources.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(RunConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> CaptureResult<()> {
        let invalid = |msg: String| Err(CaptureError::Configuration(msg));

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return invalid(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }

        let acq = &self.acquisition;
        if validation::is_in_range(acq.sample_period_us, 1..=u64::MAX).is_err() {
            return invalid("sample_period_us must be at least 1".to_string());
        }
        if acq.sample_n == 0 {
            return invalid("sample_n must be at least 1".to_string());
        }
        if acq.pre_trigger_n >= acq.sample_n {
            return invalid(format!(
                "pre_trigger_n ({}) must be smaller than sample_n ({})",
                acq.pre_trigger_n, acq.sample_n
            ));
        }
        if acq.baseline_n == 0 {
            return invalid("baseline_n must be at least 1".to_string());
        }

        if self.channels.is_empty() {
            return invalid("at least one channel is required".to_string());
        }
        for channel in &self.channels {
            if let Err(msg) = validation::is_not_empty(&channel.source) {
                return invalid(format!("channel '{}' source: {msg}", channel.name));
            }
        }

        if let Err(msg) = validation::is_valid_path(&self.storage.ledger_name) {
            return invalid(format!("ledger_name: {msg}"));
        }
        if self.storage.ledger_name.contains('/') {
            return invalid("ledger_name must be a bare file name".to_string());
        }

        if self.classes.is_empty() {
            return invalid("at least one class is required".to_string());
        }
        let mut folders = HashSet::new();
        for class in &self.classes {
            if let Err(msg) = validation::is_valid_folder(&class.folder) {
                return invalid(format!("class folder '{}': {msg}", class.folder));
            }
            if !folders.insert(class.folder.trim_start_matches('/')) {
                return invalid(format!("Duplicate class folder: {}", class.folder));
            }
        }

        if !(0.0..=1.0).contains(&self.simulation.spike_probability) {
            return invalid("simulation.spike_probability must be within 0..=1".to_string());
        }

        Ok(())
    }

    /// Number of analog channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Total cycles the sequencer will record.
    pub fn total_cycles(&self) -> u64 {
        self.classes.iter().map(|c| u64::from(c.cycles)).sum()
    }
}
