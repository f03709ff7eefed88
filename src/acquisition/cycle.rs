//! One capture cycle: sample on every tick until the window is complete.

use super::clock::{SampleClock, TimeSource};
use super::trigger::{Rise, TriggerDetector, TriggerEvent, TriggerState};
use crate::config::RunConfig;
use crate::data::{ChannelBank, Sample};
use crate::error::{CaptureError, CaptureResult};
use crate::hardware::{AnalogInput, DigitalInput, StatusIndicator};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The devices a capture cycle drives.
#[derive(Debug)]
pub struct Rig<A, D, L> {
    /// Analog front end, one channel per configured channel
    pub analog: A,
    /// Active-low arm input
    pub arm: D,
    /// Status output, lit while waiting for the arm input
    pub indicator: L,
}

impl<A: AnalogInput, D: DigitalInput, L: StatusIndicator> Rig<A, D, L> {
    /// Bundle the devices.
    pub fn new(analog: A, arm: D, indicator: L) -> Self {
        Self {
            analog,
            arm,
            indicator,
        }
    }
}

/// Result of a completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// What fired the trigger
    pub rise: Rise,
    /// Ticks sampled during the cycle
    pub ticks: u64,
    /// Tick on which the trigger fired, counted from the start of the cycle
    pub trigger_tick: u64,
    /// Wall time from the trigger to the complete window
    pub capture_time: Duration,
}

/// Sampling clock, ring buffers and trigger detector of the logger.
#[derive(Debug)]
pub struct Acquisition<T> {
    clock: SampleClock<T>,
    bank: ChannelBank,
    detector: TriggerDetector,
    samples: Vec<Sample>,
}

impl<T: TimeSource> Acquisition<T> {
    /// Allocate buffers for the configured channels and window.
    pub fn new(config: &RunConfig, time: T) -> Self {
        let channels = config.channel_count();
        let acquisition = &config.acquisition;
        Self {
            clock: SampleClock::new(time, acquisition.sample_period_us),
            bank: ChannelBank::new(channels, acquisition.sample_n),
            detector: TriggerDetector::new(channels, acquisition),
            samples: vec![0; channels],
        }
    }

    /// Ring buffers; after a completed cycle they hold the window.
    pub fn bank(&self) -> &ChannelBank {
        &self.bank
    }

    /// Current detector state.
    pub fn state(&self) -> TriggerState {
        self.detector.state()
    }

    /// Clear buffers and detector for a new cycle.
    pub fn reset(&mut self) {
        self.bank.clear();
        self.detector.reset();
        self.clock.restart();
    }

    /// Read every channel once, push the tick, then run the detector on it.
    pub fn sample_tick<A, D, L>(&mut self, rig: &mut Rig<A, D, L>) -> Option<TriggerEvent>
    where
        A: AnalogInput,
        D: DigitalInput,
        L: StatusIndicator,
    {
        for (channel, slot) in self.samples.iter_mut().enumerate() {
            *slot = rig.analog.read(channel);
        }
        self.bank.push_tick(&self.samples);

        let arm = &mut rig.arm;
        let event = self
            .detector
            .on_tick(&self.samples, self.bank.all_full(), || arm.is_low());

        match &event {
            Some(TriggerEvent::BuffersFull) => {
                rig.indicator.set(true);
                info!(depth = self.bank.depth(), "buffers full, waiting for arm");
            }
            Some(TriggerEvent::ArmAsserted) => info!("armed, measuring baseline"),
            Some(TriggerEvent::BaselineReady(values)) => info!(baseline = ?values, "baseline set"),
            Some(TriggerEvent::Rise(rise)) => {
                rig.indicator.set(false);
                info!(
                    channel = rise.channel,
                    sample = rise.sample,
                    baseline = rise.baseline,
                    deviation = rise.deviation,
                    "rise detected"
                );
            }
            Some(TriggerEvent::WindowComplete) => debug!("window complete"),
            None => {}
        }
        event
    }

    /// Run one cycle from a cleared state to a complete window.
    ///
    /// With `tick_limit` set, fails with [`CaptureError::CycleIncomplete`] once that many
    /// ticks pass without completing; unbounded otherwise.
    pub fn run_cycle<A, D, L>(
        &mut self,
        rig: &mut Rig<A, D, L>,
        tick_limit: Option<u64>,
    ) -> CaptureResult<CycleOutcome>
    where
        A: AnalogInput,
        D: DigitalInput,
        L: StatusIndicator,
    {
        let actual = rig.analog.channel_count();
        if actual != self.bank.channels() {
            return Err(CaptureError::ChannelMismatch {
                expected: self.bank.channels(),
                actual,
            });
        }

        self.reset();
        rig.indicator.set(false);

        let mut ticks = 0u64;
        let mut triggered: Option<(u64, Instant)> = None;
        while !self.detector.is_complete() {
            if tick_limit.is_some_and(|limit| ticks >= limit) {
                debug!(ticks, state = %self.state(), "tick budget exhausted");
                return Err(CaptureError::CycleIncomplete { ticks });
            }
            self.clock.wait_tick();
            ticks += 1;
            if let Some(TriggerEvent::Rise(_)) = self.sample_tick(rig) {
                triggered = Some((ticks, Instant::now()));
            }
        }

        let (trigger_tick, started) = triggered.unwrap_or((ticks, Instant::now()));
        let rise = self
            .detector
            .rise()
            .ok_or(CaptureError::CycleIncomplete { ticks })?;
        let outcome = CycleOutcome {
            rise,
            ticks,
            trigger_tick,
            capture_time: started.elapsed(),
        };
        info!(
            ticks,
            capture_us = outcome.capture_time.as_micros() as u64,
            "capture complete"
        );
        Ok(outcome)
    }
}
