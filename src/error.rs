//! Custom error types for the capture logger.
//!
//! `CaptureError` is the single error type of the library. It is built with
//! `thiserror` and groups failures by where they come from:
//!
//! - **`Config`** / **`Configuration`**: the run configuration could not be parsed, or
//!   parsed but is logically inconsistent (e.g. a pre-trigger length larger than the window).
//! - **Storage**: opening, writing or closing an artifact failed, or the storage medium
//!   was not usable at start-up. These are fatal for the cycle in progress; the sequencer
//!   never retries them.
//! - **`LineTooLong`**: a bounded line read found no line terminator within the limit.
//! - **`InvalidRow`**: a fixed-width row read asked for row 0; rows are numbered from 1.
//! - **`ChannelMismatch`**: the configured channel list does not match the analog front end.
//! - **`CycleIncomplete`**: a caller-supplied tick budget ran out before the window completed.
//!
//! The acquisition and trigger path itself has no failure modes.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Errors raised by the capture logger.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The configuration sources could not be merged or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The configuration parsed but failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Uncategorised I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage root is missing or cannot be used.
    #[error("Storage medium unavailable at {root}: {reason}")]
    StorageUnavailable {
        /// Root directory of the storage medium.
        root: PathBuf,
        /// Human readable cause.
        reason: String,
    },

    /// An artifact or directory could not be opened or created.
    #[error("Can't open {path}: {source}")]
    StorageOpen {
        /// Volume path that failed.
        path: String,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// A row could not be written to an open artifact.
    #[error("Can't write {path}: {reason}")]
    StorageWrite {
        /// Volume path that failed.
        path: String,
        /// Human readable cause.
        reason: String,
    },

    /// An artifact could not be flushed and closed.
    #[error("Can't close {path}: {source}")]
    StorageClose {
        /// Volume path that failed.
        path: String,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// A bounded line read did not find a line terminator.
    #[error("Line too long at byte offset {offset} (limit {max_len} bytes)")]
    LineTooLong {
        /// Byte offset the read started from.
        offset: u64,
        /// Maximum accepted line length including the terminator.
        max_len: usize,
    },

    /// Rows of an artifact are numbered from 1.
    #[error("Invalid row number {row}: rows start at 1")]
    InvalidRow {
        /// Requested row.
        row: u64,
    },

    /// The analog front end exposes a different number of channels than configured.
    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch {
        /// Channels in the run configuration.
        expected: usize,
        /// Channels reported by the hardware.
        actual: usize,
    },

    /// The tick budget given to a cycle ran out before the window was complete.
    #[error("Capture cycle incomplete after {ticks} ticks")]
    CycleIncomplete {
        /// Ticks consumed before giving up.
        ticks: u64,
    },
}

impl From<figment::Error> for CaptureError {
    fn from(value: figment::Error) -> Self {
        CaptureError::Config(Box::new(value))
    }
}

impl CaptureError {
    /// Returns true for failures of the storage layer: open, write, close and start-up
    /// volume failures.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CaptureError::StorageUnavailable { .. }
                | CaptureError::StorageOpen { .. }
                | CaptureError::StorageWrite { .. }
                | CaptureError::StorageClose { .. }
        )
    }
}
