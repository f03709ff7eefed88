//! Real-time acquisition pipeline: sample clock, baseline, trigger and capture window.
//!
//! Everything here runs on a single execution context. A tick reads every channel,
//! pushes the samples into the ring buffers, and only then lets the trigger detector
//! look at them.

pub mod baseline;
pub mod clock;
pub mod cycle;
pub mod trigger;
pub mod window;

pub use clock::{MonotonicClock, SampleClock, SteppedClock, TimeSource};
pub use cycle::{Acquisition, CycleOutcome, Rig};
pub use trigger::{Rise, TriggerDetector, TriggerEvent, TriggerState};
