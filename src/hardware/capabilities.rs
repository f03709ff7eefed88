//! Hardware Capabilities
//!
//! Small capability traits for the signals the logger touches. The acquisition core is
//! written against these bounds only, so it never performs I/O itself:
//!
//! - an analog front end implements [`AnalogInput`]
//! - the arm push-button implements [`DigitalInput`]
//! - the status LED implements [`StatusIndicator`]
//! - the tick source implements [`crate::acquisition::clock::TimeSource`]
//!
//! # Design Philosophy
//!
//! Each capability trait:
//! - Is synchronous (the logger runs on a single execution context and busy-waits)
//! - Takes `&mut self`, since reads may advance device or simulation state
//! - Cannot fail: a reading is always produced, matching an ADC conversion
//! - Focuses on ONE thing
//!
//! # Example
//!
//! ```rust
//! use transient_capture::data::Sample;
//! use transient_capture::hardware::capabilities::AnalogInput;
//!
//! struct Flat(Sample);
//!
//! impl AnalogInput for Flat {
//!     fn channel_count(&self) -> usize { 1 }
//!     fn read(&mut self, _channel: usize) -> Sample { self.0 }
//! }
//!
//! fn first_reading<A: AnalogInput>(adc: &mut A) -> Sample {
//!     adc.read(0)
//! }
//!
//! assert_eq!(first_reading(&mut Flat(2048)), 2048);
//! ```

use crate::data::Sample;

/// Capability: Analog Sampling
///
/// Multi-channel analog front end converted once per tick.
///
/// # Contract
/// - Channels are addressed `0..channel_count()` in configuration order
/// - `read` performs one conversion and returns the raw value
/// - Reading a channel out of range returns 0
pub trait AnalogInput {
    /// Number of channels the front end exposes.
    fn channel_count(&self) -> usize;

    /// Convert `channel` once.
    fn read(&mut self, channel: usize) -> Sample;
}

/// Capability: Digital Input
///
/// A single digital line; the arm input is wired active-low.
pub trait DigitalInput {
    /// True while the line is pulled low.
    fn is_low(&mut self) -> bool;
}

/// Capability: Status Output
///
/// One on/off indicator.
pub trait StatusIndicator {
    /// Switch the indicator on or off.
    fn set(&mut self, on: bool);
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }

    fn read(&mut self, channel: usize) -> Sample {
        (**self).read(channel)
    }
}

impl<T: DigitalInput + ?Sized> DigitalInput for &mut T {
    fn is_low(&mut self) -> bool {
        (**self).is_low()
    }
}

impl<T: StatusIndicator + ?Sized> StatusIndicator for &mut T {
    fn set(&mut self, on: bool) {
        (**self).set(on)
    }
}
