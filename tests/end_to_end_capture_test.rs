//! End-to-end capture tests: scripted front end, stepped clock, real files in a temp dir.

use std::fs;
use std::path::Path;
use transient_capture::acquisition::{SteppedClock, TriggerState};
use transient_capture::config::{AcquisitionConfig, ChannelConfig, ClassConfig, RunConfig};
use transient_capture::data::read::read_window;
use transient_capture::data::{FsStorage, Sample};
use transient_capture::hardware::{RecordingIndicator, ScriptedAnalog, ScriptedSwitch};
use transient_capture::sequencer::{Sequencer, SequencerState};
use transient_capture::{acquisition::Rig, CaptureError};

const TICK_BUDGET: u64 = 200;

/// Two channels, window 10 (pre 6, post 4), threshold 5, baseline over 4 ticks.
fn scenario_config(root: &Path, classes: &[&str]) -> RunConfig {
    let mut config = RunConfig {
        acquisition: AcquisitionConfig {
            sample_period_us: 10,
            sample_n: 10,
            pre_trigger_n: 6,
            baseline_n: 4,
            threshold: 5,
        },
        channels: vec![
            ChannelConfig {
                name: "left".into(),
                source: "A9".into(),
            },
            ChannelConfig {
                name: "right".into(),
                source: "A7".into(),
            },
        ],
        classes: classes
            .iter()
            .map(|folder| ClassConfig {
                folder: (*folder).to_string(),
                cycles: 1,
            })
            .collect(),
        ..RunConfig::default()
    };
    config.storage.root = root.to_path_buf();
    config
}

/// One cycle worth of samples for channel 0:
/// 10 fill ticks, 1 arm tick, 4 baseline ticks, 2 quiet ticks, the spike, 3 post ticks.
fn spike_cycle() -> Vec<Sample> {
    let mut ch0 = vec![100; 17];
    ch0[16] = 102;
    ch0.push(110);
    ch0.extend([101, 102, 103]);
    ch0
}

fn flat_cycle() -> Vec<Sample> {
    vec![100; 21]
}

fn rig(cycles: usize) -> Rig<ScriptedAnalog, ScriptedSwitch, RecordingIndicator> {
    let ch0: Vec<Sample> = (0..cycles).flat_map(|_| spike_cycle()).collect();
    let ch1: Vec<Sample> = (0..cycles).flat_map(|_| flat_cycle()).collect();
    Rig::new(
        ScriptedAnalog::new(vec![ch0, ch1]),
        ScriptedSwitch::pressed(),
        RecordingIndicator::default(),
    )
}

fn ledger_lines(root: &Path) -> Vec<String> {
    fs::read_to_string(root.join("datasets.csv"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn spike_on_channel_zero_lands_on_trigger_row() {
    let dir = tempfile::tempdir().unwrap();
    let config = scenario_config(dir.path(), &["110001"]);
    let storage = FsStorage::mount(dir.path()).unwrap();
    let mut sequencer = Sequencer::new(&config, storage, SteppedClock::new(10))
        .unwrap()
        .with_tick_limit(TICK_BUDGET);

    let summary = sequencer.run(&mut rig(1)).unwrap();
    assert_eq!(summary.records.len(), 1);
    let record = &summary.records[0];
    assert_eq!(record.rise.channel, 0);
    assert_eq!(record.rise.sample, 110);
    assert_eq!(record.rise.baseline, 100);
    assert_eq!(record.rise.deviation, 10);
    assert_eq!(record.ticks, 21);

    let file = fs::File::open(dir.path().join("110001").join("1.csv")).unwrap();
    let rows = read_window(file).unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|row| row.len() == 2));
    assert_eq!(rows[6], vec![110, 100]);
    assert_eq!(rows[5], vec![102, 100]);

    let ch0: Vec<Sample> = rows.iter().map(|row| row[0]).collect();
    assert_eq!(ch0, vec![100, 100, 100, 100, 100, 102, 110, 101, 102, 103]);

    assert_eq!(ledger_lines(dir.path()), ["x:sensor,y", "./110001/1.csv,0"]);
}

#[test]
fn unarmed_device_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = scenario_config(dir.path(), &["110001"]);
    let storage = FsStorage::mount(dir.path()).unwrap();
    let mut sequencer = Sequencer::new(&config, storage, SteppedClock::new(10))
        .unwrap()
        .with_tick_limit(TICK_BUDGET);

    let mut rig = Rig::new(
        ScriptedAnalog::new(vec![spike_cycle(), flat_cycle()]),
        ScriptedSwitch::never(),
        RecordingIndicator::default(),
    );
    let err = sequencer.run(&mut rig).unwrap_err();
    assert!(matches!(err, CaptureError::CycleIncomplete { ticks } if ticks == TICK_BUDGET));
    assert_eq!(sequencer.acquisition().state(), TriggerState::ArmWait);
    assert!(rig.indicator.is_on());

    let artifacts = fs::read_dir(dir.path().join("110001")).unwrap().count();
    assert_eq!(artifacts, 0);
    assert_eq!(ledger_lines(dir.path()), ["x:sensor,y"]);
}

#[test]
fn two_classes_one_cycle_each() {
    let dir = tempfile::tempdir().unwrap();
    let config = scenario_config(dir.path(), &["110001", "210001"]);
    let storage = FsStorage::mount(dir.path()).unwrap();
    let mut sequencer = Sequencer::new(&config, storage, SteppedClock::new(10))
        .unwrap()
        .with_tick_limit(TICK_BUDGET);

    let summary = sequencer.run(&mut rig(2)).unwrap();
    assert_eq!(summary.records.len(), 2);
    assert_eq!(sequencer.state(), SequencerState::Finished);

    assert!(dir.path().join("110001").join("1.csv").is_file());
    assert!(dir.path().join("210001").join("1.csv").is_file());
    assert_eq!(
        ledger_lines(dir.path()),
        ["x:sensor,y", "./110001/1.csv,0", "./210001/1.csv,1"]
    );

    let layout = sequencer.layout().clone();
    assert_eq!(layout.ledger_rows(sequencer.storage_mut()).unwrap(), 2);

    let idle = sequencer.run(&mut rig(1)).unwrap();
    assert!(idle.records.is_empty());
    assert_eq!(ledger_lines(dir.path()).len(), 3);
}

#[test]
fn indices_continue_after_highest_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let class_dir = dir.path().join("110001");
    fs::create_dir(&class_dir).unwrap();
    for name in ["1.csv", "2.csv", "5.csv"] {
        fs::write(class_dir.join(name), b"0,0\n").unwrap();
    }

    let mut config = scenario_config(dir.path(), &["110001"]);
    config.classes[0].cycles = 2;
    let storage = FsStorage::mount(dir.path()).unwrap();
    let mut sequencer = Sequencer::new(&config, storage, SteppedClock::new(10))
        .unwrap()
        .with_tick_limit(TICK_BUDGET);
    assert_eq!(sequencer.next_indices(), &[6]);

    let summary = sequencer.run(&mut rig(2)).unwrap();
    let indices: Vec<u32> = summary.records.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![6, 7]);
    assert_eq!(fs::read(class_dir.join("5.csv")).unwrap(), b"0,0\n");
}

#[test]
fn failed_artifact_open_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = scenario_config(dir.path(), &["110001"]);
    let storage = FsStorage::mount(dir.path()).unwrap();
    let mut sequencer = Sequencer::new(&config, storage, SteppedClock::new(10))
        .unwrap()
        .with_tick_limit(TICK_BUDGET);

    // Replace the class directory with a plain file so the artifact cannot be created.
    let class_dir = dir.path().join("110001");
    fs::remove_dir(&class_dir).unwrap();
    fs::write(&class_dir, b"").unwrap();

    let err = sequencer.run(&mut rig(1)).unwrap_err();
    assert!(err.is_storage());
    assert!(matches!(err, CaptureError::StorageOpen { ref path, .. } if path == "/110001/1.csv"));
    assert_eq!(sequencer.state(), SequencerState::Aborted);
}

#[test]
fn unusable_root_halts_before_acquisition() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("volume");
    fs::write(&root, b"not a directory").unwrap();

    let err = FsStorage::mount(&root).unwrap_err();
    assert!(matches!(err, CaptureError::StorageUnavailable { .. }));
}
