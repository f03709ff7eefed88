//! Trigger detection state machine.
//!
//! # State Machine
//!
//! ```text
//! Filling ──buffers full──> ArmWait ──arm low──> Baselining ──baseline ready──> Armed
//!                                                                                 │
//!                                                                     |B - S| > T │
//!                                                                                 ▼
//!              Complete <──window complete── Capturing <──(same tick)── Triggered
//! ```
//!
//! Transitions are decided by [`next_state`], a pure function of the current state and a
//! set of [`Guards`]. [`TriggerDetector`] evaluates the guards for one tick and applies
//! the result. Only the guard belonging to the current state is evaluated, so the arm
//! input is polled in `ArmWait` only and the deviation is scanned in `Armed` only.

use super::baseline::{deviation, exceeds_threshold, BaselineEstimator};
use super::window::CaptureWindow;
use crate::config::AcquisitionConfig;
use crate::data::Sample;
use serde::Serialize;

/// Lifecycle of one capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriggerState {
    /// Ring buffers are not yet at capacity
    Filling,
    /// Buffers full, waiting for the arm input
    ArmWait,
    /// Armed by the operator, averaging the baseline
    Baselining,
    /// Baseline known, scanning every tick for a rise
    Armed,
    /// A rise was seen on this tick
    Triggered,
    /// Counting post-trigger samples
    Capturing,
    /// Window complete, ready to flush
    Complete,
}

impl std::fmt::Display for TriggerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TriggerState::Filling => "Filling",
            TriggerState::ArmWait => "ArmWait",
            TriggerState::Baselining => "Baselining",
            TriggerState::Armed => "Armed",
            TriggerState::Triggered => "Triggered",
            TriggerState::Capturing => "Capturing",
            TriggerState::Complete => "Complete",
        };
        f.write_str(name)
    }
}

/// Conditions evaluated for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guards {
    /// Every ring buffer is at capacity
    pub buffers_full: bool,
    /// The arm input reads low
    pub arm_asserted: bool,
    /// The baseline average is complete
    pub baseline_ready: bool,
    /// Some channel deviates from its baseline by more than the threshold
    pub rise: bool,
    /// The post-trigger count reached its target
    pub window_complete: bool,
}

/// Transition function of the detector.
pub fn next_state(state: TriggerState, guards: &Guards) -> TriggerState {
    use TriggerState::*;
    match state {
        Filling if guards.buffers_full => ArmWait,
        ArmWait if guards.arm_asserted => Baselining,
        Baselining if guards.baseline_ready => Armed,
        Armed if guards.rise => Triggered,
        Triggered => Capturing,
        Capturing if guards.window_complete => Complete,
        other => other,
    }
}

/// The channel and values that fired the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rise {
    /// Channel index in scan order
    pub channel: usize,
    /// Sample that crossed the threshold
    pub sample: Sample,
    /// Baseline of that channel
    pub baseline: Sample,
    /// `|baseline - sample|`
    pub deviation: u16,
}

/// Notable transition reported by [`TriggerDetector::on_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Buffers reached capacity; waiting for the arm input
    BuffersFull,
    /// The arm input was seen low
    ArmAsserted,
    /// Baseline computed
    BaselineReady(Vec<Sample>),
    /// Trigger fired
    Rise(Rise),
    /// Window complete
    WindowComplete,
}

/// Per-cycle trigger state machine.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    state: TriggerState,
    threshold: u16,
    baseline: BaselineEstimator,
    window: CaptureWindow,
    rise: Option<Rise>,
}

impl TriggerDetector {
    /// Detector for `channels` channels with the given acquisition settings.
    pub fn new(channels: usize, acquisition: &AcquisitionConfig) -> Self {
        Self {
            state: TriggerState::Filling,
            threshold: acquisition.threshold,
            baseline: BaselineEstimator::new(channels, acquisition.baseline_n),
            window: CaptureWindow::new(acquisition.pre_trigger_n, acquisition.post_trigger_n()),
            rise: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// True once the window is complete.
    pub fn is_complete(&self) -> bool {
        self.state == TriggerState::Complete
    }

    /// Baseline values; zero until computed.
    pub fn baseline(&self) -> &[Sample] {
        self.baseline.values()
    }

    /// The rise that fired this cycle, if any.
    pub fn rise(&self) -> Option<Rise> {
        self.rise
    }

    /// Post-trigger window bookkeeping.
    pub fn window(&self) -> &CaptureWindow {
        &self.window
    }

    /// Back to `Filling` for a new cycle.
    pub fn reset(&mut self) {
        self.state = TriggerState::Filling;
        self.baseline.reset();
        self.window.reset();
        self.rise = None;
    }

    /// Process one tick whose samples have already been pushed into the ring buffers.
    ///
    /// `arm_low` is called only in `ArmWait`. The tick that fires the trigger is the
    /// first post-trigger sample, so a window of `post_n == 1` completes on that tick.
    pub fn on_tick(
        &mut self,
        samples: &[Sample],
        buffers_full: bool,
        arm_low: impl FnOnce() -> bool,
    ) -> Option<TriggerEvent> {
        let guards = match self.state {
            TriggerState::Filling => Guards {
                buffers_full,
                ..Guards::default()
            },
            TriggerState::ArmWait => Guards {
                arm_asserted: arm_low(),
                ..Guards::default()
            },
            TriggerState::Baselining => Guards {
                baseline_ready: self.baseline.accumulate(samples),
                ..Guards::default()
            },
            TriggerState::Armed => {
                let rise = self.scan(samples)?;
                return Some(self.fire(rise));
            }
            TriggerState::Capturing => {
                self.window.record();
                Guards {
                    window_complete: self.window.is_complete(),
                    ..Guards::default()
                }
            }
            TriggerState::Triggered | TriggerState::Complete => return None,
        };

        let next = next_state(self.state, &guards);
        if next == self.state {
            return None;
        }
        self.state = next;

        match next {
            TriggerState::ArmWait => Some(TriggerEvent::BuffersFull),
            TriggerState::Baselining => Some(TriggerEvent::ArmAsserted),
            TriggerState::Armed => Some(TriggerEvent::BaselineReady(
                self.baseline.values().to_vec(),
            )),
            TriggerState::Complete => Some(TriggerEvent::WindowComplete),
            // Entered only through `fire` or `reset`.
            TriggerState::Filling | TriggerState::Triggered | TriggerState::Capturing => None,
        }
    }

    /// Armed -> Triggered -> Capturing on the rise tick, which counts as the first
    /// post-trigger sample; Complete as well when that already fills the window.
    fn fire(&mut self, rise: Rise) -> TriggerEvent {
        self.rise = Some(rise);
        self.window.reset();
        self.window.record();

        let guards = Guards {
            rise: true,
            window_complete: self.window.is_complete(),
            ..Guards::default()
        };
        let triggered = next_state(TriggerState::Armed, &guards);
        let capturing = next_state(triggered, &guards);
        self.state = next_state(capturing, &guards);
        TriggerEvent::Rise(rise)
    }

    /// First channel, in ascending order, whose sample exceeds the threshold.
    fn scan(&self, samples: &[Sample]) -> Option<Rise> {
        samples
            .iter()
            .zip(self.baseline.values())
            .enumerate()
            .find(|(_, (&sample, &baseline))| exceeds_threshold(baseline, sample, self.threshold))
            .map(|(channel, (&sample, &baseline))| Rise {
                channel,
                sample,
                baseline,
                deviation: deviation(baseline, sample),
            })
    }
}
