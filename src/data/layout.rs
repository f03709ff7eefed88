//! On-volume layout: one directory per class, numbered artifacts, a shared ledger.
//!
//! ```text
//! /datasets.csv          x:sensor,y
//!                        ./110001/1.csv,0
//!                        ./210001/1.csv,1
//! /110001/1.csv          <sample rows>
//! /210001/1.csv          <sample rows>
//! ```

use super::storage::{volume_path, BlockStorage, OpenMode};
use crate::config::RunConfig;
use crate::error::{CaptureError, CaptureResult};
use std::io::{BufRead, BufReader, Write};
use tracing::info;

/// Extension of capture artifacts.
pub const ARTIFACT_EXTENSION: &str = "csv";

/// Paths and naming rules derived from the run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    class_dirs: Vec<String>,
    ledger_path: String,
    ledger_header: String,
}

impl StorageLayout {
    /// Build the layout for the configured classes and ledger.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            class_dirs: config
                .classes
                .iter()
                .map(|c| volume_path(&[&c.folder]))
                .collect(),
            ledger_path: volume_path(&[&config.storage.ledger_name]),
            ledger_header: config.storage.ledger_header.clone(),
        }
    }

    /// Volume path of a class directory.
    pub fn class_dir(&self, class: usize) -> Option<&str> {
        self.class_dirs.get(class).map(String::as_str)
    }

    /// Volume path of the shared ledger.
    pub fn ledger_path(&self) -> &str {
        &self.ledger_path
    }

    /// Volume path of artifact `index` of `class`, e.g. `/110001/3.csv`.
    pub fn artifact_path(&self, class: usize, index: u32) -> Option<String> {
        self.class_dir(class)
            .map(|dir| volume_path(&[dir, &format!("{index}.{ARTIFACT_EXTENSION}")]))
    }

    /// Create what is missing and return the first free file index of every class.
    pub fn prepare<S: BlockStorage>(&self, storage: &mut S) -> CaptureResult<Vec<u32>> {
        self.ensure_class_dirs(storage)?;
        self.ensure_ledger(storage)?;

        let starts = self.next_file_indices(storage)?;
        for (dir, start) in self.class_dirs.iter().zip(&starts) {
            info!(class = %dir, start, "next artifact index");
        }
        Ok(starts)
    }

    /// First free file index of every class, without touching the volume.
    pub fn next_file_indices<S: BlockStorage>(&self, storage: &S) -> CaptureResult<Vec<u32>> {
        (0..self.class_dirs.len())
            .map(|class| self.next_file_index(storage, class))
            .collect()
    }

    /// Create every class directory that does not exist yet.
    pub fn ensure_class_dirs<S: BlockStorage>(&self, storage: &mut S) -> CaptureResult<()> {
        for dir in &self.class_dirs {
            if !storage.exists(dir) {
                storage.create_dir(dir)?;
            }
        }
        Ok(())
    }

    /// Create the ledger with its header row if it does not exist yet.
    pub fn ensure_ledger<S: BlockStorage>(&self, storage: &mut S) -> CaptureResult<()> {
        if storage.exists(&self.ledger_path) {
            return Ok(());
        }
        let mut handle = storage.open(&self.ledger_path, OpenMode::Append)?;
        writeln!(handle, "{}", self.ledger_header).map_err(|e| CaptureError::StorageWrite {
            path: self.ledger_path.clone(),
            reason: e.to_string(),
        })?;
        storage.close(handle)?;
        info!(path = %self.ledger_path, "created label ledger");
        Ok(())
    }

    /// One greater than the highest numbered artifact present for `class`, 1 if none.
    pub fn next_file_index<S: BlockStorage>(
        &self,
        storage: &S,
        class: usize,
    ) -> CaptureResult<u32> {
        let Some(dir) = self.class_dir(class) else {
            return Ok(1);
        };
        if !storage.exists(dir) {
            return Ok(1);
        }
        let highest = storage
            .list_dir(dir)?
            .iter()
            .filter_map(|name| parse_artifact_index(name))
            .max()
            .unwrap_or(0);
        Ok(highest.saturating_add(1))
    }

    /// Number of label records in the ledger, header excluded.
    pub fn ledger_rows<S: BlockStorage>(&self, storage: &mut S) -> CaptureResult<usize> {
        if !storage.exists(&self.ledger_path) {
            return Ok(0);
        }
        let handle = storage.open(&self.ledger_path, OpenMode::Read)?;
        let mut reader = BufReader::new(handle);
        let mut rows = 0usize;
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            if !line.trim().is_empty() {
                rows += 1;
            }
            line.clear();
        }
        storage.close(reader.into_inner())?;
        Ok(rows.saturating_sub(1))
    }
}

/// Parse `<n>.csv` into `n`; anything else is not an artifact.
pub fn parse_artifact_index(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(ARTIFACT_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok().filter(|&n| n > 0)
}
