//! Mock Hardware Implementations
//!
//! Simulated front ends for running the logger without a board attached.
//!
//! # Available Mocks
//!
//! - `ScriptedAnalog` - plays back fixed per-channel sequences (deterministic tests)
//! - `ScriptedSwitch` - arm input that goes low after a number of polls, or never
//! - `RecordingIndicator` - status output that remembers every transition
//! - `SimulatedFrontEnd` - quiescent level plus noise plus random transients
//! - `SimulatedSwitch` - arm input driven by the simulation settings
//!
//! # Performance Characteristics
//!
//! All reads are O(1) and allocation free, so the mocks never stretch a tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::SimulationConfig;
use crate::data::Sample;
use crate::hardware::capabilities::{AnalogInput, DigitalInput, StatusIndicator};

/// Largest value a 12-bit converter produces.
pub const ADC_MAX: Sample = 4095;

// =============================================================================
// ScriptedAnalog - deterministic playback
// =============================================================================

/// Analog front end that replays one scripted sequence per channel.
///
/// Each read of a channel returns the next scripted value; once the script is exhausted
/// the last value repeats. An empty script reads 0.
///
/// # Example
///
/// ```rust
/// use transient_capture::hardware::{AnalogInput, ScriptedAnalog};
///
/// let mut adc = ScriptedAnalog::new(vec![vec![1, 2], vec![7]]);
/// assert_eq!(adc.read(0), 1);
/// assert_eq!(adc.read(0), 2);
/// assert_eq!(adc.read(0), 2);
/// assert_eq!(adc.read(1), 7);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedAnalog {
    scripts: Vec<Vec<Sample>>,
    cursors: Vec<usize>,
}

impl ScriptedAnalog {
    /// One script per channel.
    pub fn new(scripts: Vec<Vec<Sample>>) -> Self {
        let cursors = vec![0; scripts.len()];
        Self { scripts, cursors }
    }

    /// `channels` channels reading `level` forever.
    pub fn constant(channels: usize, level: Sample) -> Self {
        Self::new(vec![vec![level]; channels])
    }

    /// Append values to a channel's script.
    pub fn extend(&mut self, channel: usize, values: impl IntoIterator<Item = Sample>) {
        if let Some(script) = self.scripts.get_mut(channel) {
            script.extend(values);
        }
    }

    /// Reads performed on `channel` so far.
    pub fn reads(&self, channel: usize) -> usize {
        self.cursors.get(channel).copied().unwrap_or(0)
    }
}

impl AnalogInput for ScriptedAnalog {
    fn channel_count(&self) -> usize {
        self.scripts.len()
    }

    fn read(&mut self, channel: usize) -> Sample {
        let (Some(script), Some(cursor)) = (self.scripts.get(channel), self.cursors.get_mut(channel))
        else {
            return 0;
        };
        let value = script
            .get(*cursor)
            .or_else(|| script.last())
            .copied()
            .unwrap_or(0);
        *cursor += 1;
        value
    }
}

// =============================================================================
// ScriptedSwitch - arm input
// =============================================================================

/// Arm input that reads high for a number of polls and low afterwards.
#[derive(Debug, Clone)]
pub struct ScriptedSwitch {
    low_after: Option<u64>,
    polls: u64,
}

impl ScriptedSwitch {
    /// Reads low from the first poll.
    pub fn pressed() -> Self {
        Self::after(0)
    }

    /// Reads low once `polls` polls have returned high.
    pub fn after(polls: u64) -> Self {
        Self {
            low_after: Some(polls),
            polls: 0,
        }
    }

    /// Never reads low.
    pub fn never() -> Self {
        Self {
            low_after: None,
            polls: 0,
        }
    }

    /// Number of times the input was polled.
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl DigitalInput for ScriptedSwitch {
    fn is_low(&mut self) -> bool {
        let low = self.low_after.is_some_and(|n| self.polls >= n);
        self.polls += 1;
        low
    }
}

// =============================================================================
// RecordingIndicator - status output
// =============================================================================

/// Status output that records every state change.
#[derive(Debug, Clone, Default)]
pub struct RecordingIndicator {
    on: bool,
    history: Vec<bool>,
}

impl RecordingIndicator {
    /// Current state.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Every value passed to [`StatusIndicator::set`], in order.
    pub fn history(&self) -> &[bool] {
        &self.history
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set(&mut self, on: bool) {
        self.on = on;
        self.history.push(on);
    }
}

// =============================================================================
// SimulatedFrontEnd - noisy channels with transients
// =============================================================================

/// Simulated analog front end.
///
/// Every channel sits at a quiescent level with uniform noise. At each read of channel 0
/// a transient starts with the configured probability; while it lasts, every channel is
/// offset by the spike height, scaled down with the channel index so the first channel
/// sees the largest rise.
pub struct SimulatedFrontEnd {
    rng: StdRng,
    channels: usize,
    level: Sample,
    noise: Sample,
    spike_height: Sample,
    spike_probability: f64,
    spike_ticks: u32,
    spike_remaining: u32,
}

impl SimulatedFrontEnd {
    /// Create a front end with `channels` channels.
    pub fn new(channels: usize, config: &SimulationConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            channels,
            level: config.level.min(ADC_MAX),
            noise: config.noise,
            spike_height: config.spike_height,
            spike_probability: config.spike_probability.clamp(0.0, 1.0),
            spike_ticks: config.spike_ticks,
            spike_remaining: 0,
        }
    }

    /// True while a transient is being generated.
    pub fn in_transient(&self) -> bool {
        self.spike_remaining > 0
    }

    fn advance_transient(&mut self) {
        if self.spike_remaining > 0 {
            self.spike_remaining -= 1;
        } else if self.spike_ticks > 0 && self.rng.gen_bool(self.spike_probability) {
            self.spike_remaining = self.spike_ticks;
            debug!(ticks = self.spike_ticks, "simulated transient");
        }
    }
}

impl AnalogInput for SimulatedFrontEnd {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn read(&mut self, channel: usize) -> Sample {
        if channel >= self.channels {
            return 0;
        }
        if channel == 0 {
            self.advance_transient();
        }

        let noise = i32::from(self.noise);
        let mut value = i32::from(self.level) + self.rng.gen_range(-noise..=noise);
        if self.in_transient() {
            let divisor = i32::try_from(channel + 1).unwrap_or(i32::MAX);
            value += i32::from(self.spike_height) / divisor;
        }
        value.clamp(0, i32::from(ADC_MAX)) as Sample
    }
}

/// Arm input of the simulated rig: pressed after a configured number of polls.
#[derive(Debug, Clone)]
pub struct SimulatedSwitch(ScriptedSwitch);

impl SimulatedSwitch {
    /// Switch pressed after `config.arm_after_reads` polls.
    pub fn new(config: &SimulationConfig) -> Self {
        Self(ScriptedSwitch::after(config.arm_after_reads))
    }
}

impl DigitalInput for SimulatedSwitch {
    fn is_low(&mut self) -> bool {
        self.0.is_low()
    }
}

/// Status output that only logs transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingIndicator {
    on: bool,
}

impl StatusIndicator for LoggingIndicator {
    fn set(&mut self, on: bool) {
        if self.on != on {
            debug!(on, "status indicator");
        }
        self.on = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_analog_repeats_last_value() {
        let mut adc = ScriptedAnalog::new(vec![vec![5, 6], vec![]]);
        assert_eq!(adc.channel_count(), 2);
        assert_eq!([adc.read(0), adc.read(0), adc.read(0)], [5, 6, 6]);
        assert_eq!(adc.read(1), 0);
        assert_eq!(adc.read(9), 0);
        assert_eq!(adc.reads(0), 3);
    }

    #[test]
    fn switch_goes_low_after_polls() {
        let mut sw = ScriptedSwitch::after(2);
        assert!(!sw.is_low());
        assert!(!sw.is_low());
        assert!(sw.is_low());
        assert_eq!(sw.polls(), 3);

        let mut never = ScriptedSwitch::never();
        assert!((0..100).all(|_| !never.is_low()));
        assert!(ScriptedSwitch::pressed().is_low());
    }

    #[test]
    fn indicator_records_history() {
        let mut led = RecordingIndicator::default();
        led.set(true);
        led.set(false);
        assert!(!led.is_on());
        assert_eq!(led.history(), &[true, false]);
    }

    #[test]
    fn simulation_stays_in_adc_range_and_is_reproducible() {
        let config = SimulationConfig {
            spike_probability: 0.05,
            spike_height: 4000,
            ..SimulationConfig::default()
        };
        let mut a = SimulatedFrontEnd::new(3, &config);
        let mut b = SimulatedFrontEnd::new(3, &config);
        for _ in 0..5_000 {
            for ch in 0..3 {
                let va = a.read(ch);
                assert!(va <= ADC_MAX);
                assert_eq!(va, b.read(ch));
            }
        }
    }

    #[test]
    fn default_transients_are_rare_and_short() {
        let mut fe = SimulatedFrontEnd::new(1, &SimulationConfig::default());
        let mut inside = 0usize;
        let mut starts = 0usize;
        let mut was_inside = false;
        for _ in 0..200_000 {
            fe.read(0);
            let now = fe.in_transient();
            if now {
                inside += 1;
                if !was_inside {
                    starts += 1;
                }
            }
            was_inside = now;
        }
        assert!(starts > 0);
        assert!(inside < 200_000 / 50, "{inside} of 200000 ticks inside a transient");
    }

    #[test]
    fn quiet_simulation_stays_within_noise() {
        let config = SimulationConfig {
            spike_probability: 0.0,
            ..SimulationConfig::default()
        };
        let mut fe = SimulatedFrontEnd::new(2, &config);
        for _ in 0..1_000 {
            let v = i32::from(fe.read(0));
            assert!((v - i32::from(config.level)).abs() <= i32::from(config.noise));
        }
    }
}
