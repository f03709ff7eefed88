//! # Transient Capture Core Library
//!
//! This crate is the core library of the `transient_capture` logger. It samples several
//! analog channels at a fixed period, waits for an operator to arm it, measures a
//! per-channel baseline, and when any channel rises away from its baseline by more than a
//! threshold it keeps a fixed window of samples around that moment and writes it to block
//! storage, together with a label record naming the class being collected.
//!
//! ## Crate Structure
//!
//! - **`acquisition`**: The real-time pipeline. A busy-wait `SampleClock`, the
//!   `TriggerDetector` state machine with its baseline and post-trigger window, and the
//!   `Acquisition` loop that runs one capture cycle on a `Rig` of devices.
//! - **`config`**: `RunConfig`, loaded with `figment` from defaults, a TOML file and
//!   `CAPTURE_` environment variables.
//! - **`data`**: Per-channel ring buffers, the `BlockStorage` abstraction with its
//!   filesystem volume, the on-volume layout, the CSV window writer and read-back helpers.
//! - **`error`**: The `CaptureError` enum shared by every module.
//! - **`hardware`**: Capability traits for the analog front end, the arm input and the
//!   status indicator, plus scripted and simulated implementations.
//! - **`logging`**: `tracing-subscriber` initialisation.
//! - **`sequencer`**: Walks the configured classes and cycles, flushing every window.
//! - **`validation`**: Small helpers used by configuration validation.

pub mod acquisition;
pub mod config;
pub mod data;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod sequencer;
pub mod validation;

pub use error::{CaptureError, CaptureResult};
