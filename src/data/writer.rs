//! Storage writer for completed capture windows.
//!
//! A flush first appends one label record to the shared ledger, then writes the window
//! as headerless CSV: row `i` holds every channel's sample at logical index `i`, oldest
//! first. Any open, write or close failure aborts the flush and is returned as is; a
//! partially written artifact is left on the volume.

use super::layout::StorageLayout;
use super::ring_buffer::ChannelBank;
use super::storage::{BlockStorage, OpenMode};
use crate::error::{CaptureError, CaptureResult};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of one successful flush.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushReport {
    /// Volume path of the artifact
    pub path: String,
    /// Rows written
    pub rows: usize,
    /// Wall time spent writing the ledger record and the rows
    pub elapsed: Duration,
}

impl FlushReport {
    /// Average write cost per sample row.
    pub fn micros_per_row(&self) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1e6 / self.rows as f64
    }
}

/// Writes capture windows and label records to a [`BlockStorage`] volume.
pub struct CaptureWriter<'a, S: BlockStorage> {
    storage: &'a mut S,
    layout: &'a StorageLayout,
    progress_every: usize,
}

impl<'a, S: BlockStorage> CaptureWriter<'a, S> {
    /// Create a writer; `progress_every` logs every n-th row (0 disables).
    pub fn new(storage: &'a mut S, layout: &'a StorageLayout, progress_every: usize) -> Self {
        Self {
            storage,
            layout,
            progress_every,
        }
    }

    /// Append the label record and then the window rows for `artifact`.
    pub fn flush(
        &mut self,
        artifact: &str,
        class: usize,
        bank: &ChannelBank,
    ) -> CaptureResult<FlushReport> {
        let started = Instant::now();
        self.append_label(artifact, class)?;
        let rows = self.write_window(artifact, bank)?;
        let report = FlushReport {
            path: artifact.to_string(),
            rows,
            elapsed: started.elapsed(),
        };
        info!(
            path = %report.path,
            rows,
            elapsed_us = report.elapsed.as_micros() as u64,
            us_per_row = report.micros_per_row(),
            "window flushed"
        );
        Ok(report)
    }

    /// Append `.<artifact>,<class>` to the ledger.
    pub fn append_label(&mut self, artifact: &str, class: usize) -> CaptureResult<()> {
        let ledger = self.layout.ledger_path();
        let handle = self.storage.open(ledger, OpenMode::Append)?;
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(handle);

        let record = [format!(".{artifact}"), class.to_string()];
        csv_writer
            .write_record(&record)
            .map_err(|e| write_error(ledger, e))?;
        let handle = csv_writer
            .into_inner()
            .map_err(|e| write_error(ledger, e.error()))?;
        self.storage.close(handle)?;

        debug!(ledger, artifact, class, "label recorded");
        Ok(())
    }

    /// Write every row of `bank`, oldest first, to `artifact`. Returns the row count.
    pub fn write_window(&mut self, artifact: &str, bank: &ChannelBank) -> CaptureResult<usize> {
        let handle = self.storage.open(artifact, OpenMode::Append)?;
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(handle);

        let mut rows = 0usize;
        for (index, row) in bank.rows().enumerate() {
            csv_writer
                .write_record(row.iter().map(|v| v.to_string()))
                .map_err(|e| write_error(artifact, e))?;
            if self.progress_every > 0 && index % self.progress_every == 0 {
                debug!(artifact, row = index, values = ?row, "wrote row");
            }
            rows += 1;
        }

        let mut handle = csv_writer
            .into_inner()
            .map_err(|e| write_error(artifact, e.error()))?;
        handle.flush().map_err(|e| write_error(artifact, e))?;
        self.storage.close(handle)?;
        Ok(rows)
    }
}

fn write_error(path: &str, err: impl std::fmt::Display) -> CaptureError {
    CaptureError::StorageWrite {
        path: path.to_string(),
        reason: err.to_string(),
    }
}
