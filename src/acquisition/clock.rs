//! Sample clock: gates sampling to a fixed period by tight polling.

use std::time::Instant;

/// Source of elapsed microseconds.
pub trait TimeSource {
    /// Current reading in microseconds. Expected to increase, may wrap or reset.
    fn now_micros(&mut self) -> u64;
}

/// Wall time since construction, from the monotonic system clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock starting at zero now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_micros(&mut self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Deterministic clock advancing by a fixed step on every reading.
///
/// With a step equal to the sample period every poll is a tick, which makes cycle tests
/// independent of wall time.
#[derive(Debug, Clone, Copy)]
pub struct SteppedClock {
    now: u64,
    step: u64,
}

impl SteppedClock {
    /// Clock starting at zero.
    pub fn new(step: u64) -> Self {
        Self::starting_at(0, step)
    }

    /// Clock starting at `now`.
    pub fn starting_at(now: u64, step: u64) -> Self {
        Self { now, step }
    }

    /// Jump to an arbitrary reading, e.g. to simulate a counter reset.
    pub fn set(&mut self, now: u64) {
        self.now = now;
    }
}

impl TimeSource for SteppedClock {
    fn now_micros(&mut self) -> u64 {
        self.now = self.now.wrapping_add(self.step);
        self.now
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &mut T {
    fn now_micros(&mut self) -> u64 {
        (**self).now_micros()
    }
}

/// Fixed-period tick generator over a [`TimeSource`].
#[derive(Debug)]
pub struct SampleClock<T> {
    source: T,
    period_us: u64,
    last_tick: u64,
    ticks: u64,
}

impl<T: TimeSource> SampleClock<T> {
    /// Create a clock ticking every `period_us` microseconds (at least 1).
    pub fn new(mut source: T, period_us: u64) -> Self {
        let last_tick = source.now_micros();
        Self {
            source,
            period_us: period_us.max(1),
            last_tick,
            ticks: 0,
        }
    }

    /// Poll once. Returns true when a full period has elapsed since the last tick, in
    /// which case the elapsed counter restarts from now.
    ///
    /// A reading earlier than the last tick (wrap or reset of the source) counts as zero
    /// elapsed and becomes the new reference.
    pub fn poll(&mut self) -> bool {
        let now = self.source.now_micros();
        if now < self.last_tick {
            self.last_tick = now;
            return false;
        }
        if now - self.last_tick >= self.period_us {
            self.last_tick = now;
            self.ticks += 1;
            return true;
        }
        false
    }

    /// Spin until the next tick.
    pub fn wait_tick(&mut self) {
        while !self.poll() {
            std::hint::spin_loop();
        }
    }

    /// Restart the elapsed counter from the current reading.
    pub fn restart(&mut self) {
        self.last_tick = self.source.now_micros();
    }

    /// Ticks generated since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Configured period.
    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Current reading of the underlying source, without ticking.
    pub fn now_micros(&mut self) -> u64 {
        self.source.now_micros()
    }
}
