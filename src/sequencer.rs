//! Sequencer for repeated capture-and-write cycles.
//!
//! The sequencer walks the configured classes in order and records the configured number
//! of cycles for each. Every cycle gets the next unused file index of its class; the
//! window is flushed to storage before the next cycle starts sampling.
//!
//! # State Machine
//!
//! ```text
//! Ready ──run──> Running ──all classes done──> Finished
//!                   │
//!                   └──storage error──> Aborted
//! ```
//!
//! `Finished` and `Aborted` are terminal: a later [`Sequencer::run`] does no acquisition.
//!
//! # Example
//!
//! ```rust,no_run
//! use transient_capture::acquisition::{MonotonicClock, Rig};
//! use transient_capture::config::RunConfig;
//! use transient_capture::data::FsStorage;
//! use transient_capture::hardware::{LoggingIndicator, SimulatedFrontEnd, SimulatedSwitch};
//! use transient_capture::sequencer::Sequencer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::load()?;
//! let storage = FsStorage::mount(&config.storage.root)?;
//! let mut rig = Rig::new(
//!     SimulatedFrontEnd::new(config.channel_count(), &config.simulation),
//!     SimulatedSwitch::new(&config.simulation),
//!     LoggingIndicator::default(),
//! );
//! let mut sequencer = Sequencer::new(&config, storage, MonotonicClock::new())?;
//! let summary = sequencer.run(&mut rig)?;
//! println!("{} artifacts written", summary.records.len());
//! # Ok(())
//! # }
//! ```

use crate::acquisition::{Acquisition, Rig, Rise, TimeSource};
use crate::config::{ClassConfig, RunConfig};
use crate::data::{BlockStorage, CaptureWriter, StorageLayout};
use crate::error::{CaptureError, CaptureResult};
use crate::hardware::{AnalogInput, DigitalInput, StatusIndicator};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Lifecycle of a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SequencerState {
    /// Storage prepared, nothing recorded yet
    Ready,
    /// Recording cycles
    Running,
    /// Every class reached its cycle count
    Finished,
    /// A cycle failed; nothing more will be recorded
    Aborted,
}

impl std::fmt::Display for SequencerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequencerState::Ready => write!(f, "Ready"),
            SequencerState::Running => write!(f, "Running"),
            SequencerState::Finished => write!(f, "Finished"),
            SequencerState::Aborted => write!(f, "Aborted"),
        }
    }
}

impl SequencerState {
    /// True if a run would record anything.
    pub fn can_run(&self) -> bool {
        matches!(self, SequencerState::Ready | SequencerState::Running)
    }
}

/// One recorded cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleRecord {
    /// Class index in configuration order
    pub class: usize,
    /// Class folder
    pub folder: String,
    /// File index within the class
    pub index: u32,
    /// Volume path of the artifact
    pub path: String,
    /// What fired the trigger
    pub rise: Rise,
    /// Rows written
    pub rows: usize,
    /// Ticks sampled during the cycle
    pub ticks: u64,
    /// Time spent flushing, in microseconds
    pub flush_us: u64,
}

/// Everything a run recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Cycles in the order they were recorded
    pub records: Vec<CycleRecord>,
    /// Wall time of the run, in milliseconds
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Records of one class.
    pub fn for_class(&self, class: usize) -> impl Iterator<Item = &CycleRecord> + '_ {
        self.records.iter().filter(move |r| r.class == class)
    }
}

/// Drives capture cycles class by class and hands every window to storage.
pub struct Sequencer<S, T> {
    classes: Vec<ClassConfig>,
    progress_every: usize,
    layout: StorageLayout,
    storage: S,
    acquisition: Acquisition<T>,
    next_index: Vec<u32>,
    state: SequencerState,
    tick_limit: Option<u64>,
}

impl<S: BlockStorage, T: TimeSource> Sequencer<S, T> {
    /// Prepare storage and compute the first free file index of every class.
    ///
    /// Storage errors here are start-up failures: nothing has been sampled yet.
    pub fn new(config: &RunConfig, mut storage: S, time: T) -> CaptureResult<Self> {
        let layout = StorageLayout::from_config(config);
        let next_index = layout.prepare(&mut storage)?;
        Ok(Self {
            classes: config.classes.clone(),
            progress_every: config.storage.progress_every,
            layout,
            storage,
            acquisition: Acquisition::new(config, time),
            next_index,
            state: SequencerState::Ready,
            tick_limit: None,
        })
    }

    /// Bound every cycle to `ticks` ticks; a cycle that does not complete in time fails
    /// with [`CaptureError::CycleIncomplete`].
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Next file index of every class.
    pub fn next_indices(&self) -> &[u32] {
        &self.next_index
    }

    /// Storage layout in use.
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// The storage volume.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The storage volume, mutably, e.g. to read the ledger back.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Acquisition pipeline, for inspecting the last window.
    pub fn acquisition(&self) -> &Acquisition<T> {
        &self.acquisition
    }

    /// Record every configured cycle.
    ///
    /// The first error aborts the run; artifacts already flushed stay on the volume.
    pub fn run<A, D, L>(&mut self, rig: &mut Rig<A, D, L>) -> CaptureResult<RunSummary>
    where
        A: AnalogInput,
        D: DigitalInput,
        L: StatusIndicator,
    {
        if !self.state.can_run() {
            warn!(state = %self.state, "sequencer idle, nothing to record");
            return Ok(RunSummary::default());
        }

        let started = Instant::now();
        self.state = SequencerState::Running;
        let mut summary = RunSummary::default();

        for class in 0..self.classes.len() {
            let folder = self.classes[class].folder.clone();
            let cycles = self.classes[class].cycles;
            info!(class, folder = %folder, cycles, "measurement start");

            for cycle in 0..cycles {
                match self.record_cycle(class, rig) {
                    Ok(record) => {
                        info!(
                            class,
                            cycle = cycle + 1,
                            cycles,
                            index = record.index,
                            path = %record.path,
                            "cycle recorded"
                        );
                        summary.records.push(record);
                    }
                    Err(e) => {
                        error!(class, cycle = cycle + 1, error = %e, "cycle failed, aborting run");
                        self.state = SequencerState::Aborted;
                        return Err(e);
                    }
                }
            }
        }

        self.state = SequencerState::Finished;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            cycles = summary.records.len(),
            elapsed_ms = summary.elapsed_ms,
            "end of measurement"
        );
        Ok(summary)
    }

    fn record_cycle<A, D, L>(
        &mut self,
        class: usize,
        rig: &mut Rig<A, D, L>,
    ) -> CaptureResult<CycleRecord>
    where
        A: AnalogInput,
        D: DigitalInput,
        L: StatusIndicator,
    {
        let outcome = self.acquisition.run_cycle(rig, self.tick_limit)?;

        let index = self.next_index[class];
        let path = self.layout.artifact_path(class, index).ok_or_else(|| {
            CaptureError::Configuration(format!("class {class} is not configured"))
        })?;

        let report = CaptureWriter::new(&mut self.storage, &self.layout, self.progress_every)
            .flush(&path, class, self.acquisition.bank())?;
        self.next_index[class] = index.saturating_add(1);

        Ok(CycleRecord {
            class,
            folder: self.classes[class].folder.clone(),
            index,
            path,
            rise: outcome.rise,
            rows: report.rows,
            ticks: outcome.ticks,
            flush_us: duration_micros(report.elapsed),
        })
    }
}

fn duration_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::SteppedClock;
    use crate::config::{AcquisitionConfig, ChannelConfig};
    use crate::data::storage::testing::FaultyStorage;
    use crate::data::FsStorage;
    use crate::hardware::{RecordingIndicator, ScriptedAnalog, ScriptedSwitch};
    use tracing_test::traced_test;

    fn small_config(root: &std::path::Path, cycles: [u32; 2]) -> RunConfig {
        let mut config = RunConfig::default();
        config.storage.root = root.to_path_buf();
        config.acquisition = AcquisitionConfig {
            sample_period_us: 10,
            sample_n: 4,
            pre_trigger_n: 2,
            baseline_n: 1,
            threshold: 5,
        };
        config.channels = vec![ChannelConfig {
            name: "ch0".into(),
            source: "A0".into(),
        }];
        for (class, n) in config.classes.iter_mut().zip(cycles) {
            class.cycles = n;
        }
        config
    }

    /// Analog script that triggers once per cycle: 4 fill, 1 arm, 1 baseline, spike, 1 post.
    fn spiking_rig(cycles: usize) -> Rig<ScriptedAnalog, ScriptedSwitch, RecordingIndicator> {
        let mut script = Vec::new();
        for _ in 0..cycles {
            script.extend([100, 100, 100, 100, 100, 100, 200, 100]);
        }
        Rig::new(
            ScriptedAnalog::new(vec![script]),
            ScriptedSwitch::pressed(),
            RecordingIndicator::default(),
        )
    }

    #[test]
    fn records_every_class_then_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), [2, 1]);
        let storage = FsStorage::mount(dir.path()).unwrap();
        let mut seq = Sequencer::new(&config, storage, SteppedClock::new(10))
            .unwrap()
            .with_tick_limit(100);
        assert_eq!(seq.state(), SequencerState::Ready);

        let summary = seq.run(&mut spiking_rig(3)).unwrap();
        let paths: Vec<_> = summary.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/110001/1.csv", "/110001/2.csv", "/210001/1.csv"]);
        assert!(summary.records.iter().all(|r| r.rows == 4));
        assert_eq!(summary.for_class(0).count(), 2);
        assert_eq!(seq.state(), SequencerState::Finished);
        assert_eq!(seq.next_indices(), &[3, 2]);

        let again = seq.run(&mut spiking_rig(1)).unwrap();
        assert!(again.records.is_empty());
    }

    #[test]
    fn tick_budget_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), [1, 1]);
        let storage = FsStorage::mount(dir.path()).unwrap();
        let mut seq = Sequencer::new(&config, storage, SteppedClock::new(10))
            .unwrap()
            .with_tick_limit(20);

        let mut rig = Rig::new(
            ScriptedAnalog::constant(1, 100),
            ScriptedSwitch::never(),
            RecordingIndicator::default(),
        );
        let err = seq.run(&mut rig).unwrap_err();
        assert!(matches!(err, CaptureError::CycleIncomplete { .. }));
        assert_eq!(seq.state(), SequencerState::Aborted);
        assert_eq!(seq.layout.ledger_rows(&mut seq.storage).unwrap(), 0);
    }

    #[test]
    fn close_failure_aborts_and_records_nothing_more() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), [2, 1]);
        let storage = FaultyStorage::mount(dir.path()).failing_close("/110001/1.csv");
        let mut seq = Sequencer::new(&config, storage, SteppedClock::new(10))
            .unwrap()
            .with_tick_limit(100);

        let err = seq.run(&mut spiking_rig(3)).unwrap_err();
        assert!(matches!(err, CaptureError::StorageClose { ref path, .. } if path == "/110001/1.csv"));
        assert_eq!(seq.state(), SequencerState::Aborted);
        assert_eq!(seq.next_indices(), &[1, 1]);
        assert_eq!(seq.layout.ledger_rows(&mut seq.storage).unwrap(), 1);
        assert!(!dir.path().join("110001").join("2.csv").exists());
        assert_eq!(std::fs::read_dir(dir.path().join("210001")).unwrap().count(), 0);

        assert!(seq.run(&mut spiking_rig(1)).unwrap().records.is_empty());
    }

    #[test]
    fn write_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), [1, 1]);
        let storage = FaultyStorage::mount(dir.path()).failing_write("/110001/1.csv");
        let mut seq = Sequencer::new(&config, storage, SteppedClock::new(10))
            .unwrap()
            .with_tick_limit(100);

        let err = seq.run(&mut spiking_rig(2)).unwrap_err();
        assert!(matches!(err, CaptureError::StorageWrite { .. }));
        assert_eq!(seq.state(), SequencerState::Aborted);
    }

    #[test]
    #[traced_test]
    fn logs_rise_flush_and_end_of_measurement() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), [1, 0]);
        let storage = FsStorage::mount(dir.path()).unwrap();
        let mut seq = Sequencer::new(&config, storage, SteppedClock::new(10))
            .unwrap()
            .with_tick_limit(100);

        seq.run(&mut spiking_rig(1)).unwrap();
        assert!(logs_contain("next artifact index"));
        assert!(logs_contain("rise detected"));
        assert!(logs_contain("window flushed"));
        assert!(logs_contain("end of measurement"));
    }
}
