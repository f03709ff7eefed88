//! Block storage abstraction and the filesystem-backed volume.
//!
//! The capture pipeline only talks to storage through [`BlockStorage`]: existence checks,
//! directory creation and listing, opening a handle in a mode, and closing it. Writes go
//! through the handle's `std::io::Write` implementation.
//!
//! Paths are volume paths: `/`-separated, rooted at the volume (`/110001/3.csv`).

use crate::error::{CaptureError, CaptureResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a handle is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read only, positioned at the start
    Read,
    /// Create if missing and append to the end
    Append,
}

/// Storage collaborator used by the layout, writer and read helpers.
pub trait BlockStorage {
    /// An open file.
    type Handle: Read + Write + Seek;

    /// True if a file or directory exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Create a single directory.
    fn create_dir(&mut self, path: &str) -> CaptureResult<()>;

    /// Names of the entries directly inside the directory at `path`.
    fn list_dir(&self, path: &str) -> CaptureResult<Vec<String>>;

    /// Open a handle at `path`.
    fn open(&mut self, path: &str, mode: OpenMode) -> CaptureResult<Self::Handle>;

    /// Flush and release a handle.
    fn close(&mut self, handle: Self::Handle) -> CaptureResult<()>;
}

/// Joins volume path components with `/`.
pub fn volume_path(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        out.push('/');
        out.push_str(part);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// A storage volume rooted at a directory of the host filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Mount the volume at `root`, creating the directory if needed.
    ///
    /// Fails with [`CaptureError::StorageUnavailable`] when the root cannot be created or
    /// is not a directory; callers treat that as a start-up halt.
    pub fn mount(root: impl AsRef<Path>) -> CaptureResult<Self> {
        let root = root.as_ref().to_path_buf();
        let unavailable = |reason: String| CaptureError::StorageUnavailable {
            root: root.clone(),
            reason,
        };

        fs::create_dir_all(&root).map_err(|e| unavailable(e.to_string()))?;
        let meta = fs::metadata(&root).map_err(|e| unavailable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(unavailable("not a directory".to_string()));
        }
        if meta.permissions().readonly() {
            return Err(unavailable("volume is read-only".to_string()));
        }

        info!(root = %root.display(), "storage volume mounted");
        Ok(Self { root })
    }

    /// Host path of a volume path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl BlockStorage for FsStorage {
    type Handle = FsHandle;

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn create_dir(&mut self, path: &str) -> CaptureResult<()> {
        fs::create_dir(self.resolve(path)).map_err(|source| CaptureError::StorageOpen {
            path: path.to_string(),
            source,
        })?;
        debug!(path, "created directory");
        Ok(())
    }

    fn list_dir(&self, path: &str) -> CaptureResult<Vec<String>> {
        let entries = fs::read_dir(self.resolve(path)).map_err(|source| {
            CaptureError::StorageOpen {
                path: path.to_string(),
                source,
            }
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> CaptureResult<Self::Handle> {
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Append => options.read(true).append(true).create(true),
        };

        let file = options
            .open(self.resolve(path))
            .map_err(|source| CaptureError::StorageOpen {
                path: path.to_string(),
                source,
            })?;

        debug!(path, ?mode, "opened");
        Ok(FsHandle {
            path: path.to_string(),
            mode,
            file,
        })
    }

    fn close(&mut self, mut handle: Self::Handle) -> CaptureResult<()> {
        let result = match handle.mode {
            OpenMode::Read => Ok(()),
            OpenMode::Append => handle.file.flush().and_then(|_| handle.file.sync_data()),
        };
        result.map_err(|source| CaptureError::StorageClose {
            path: handle.path.clone(),
            source,
        })?;
        debug!(path = %handle.path, "closed file");
        Ok(())
    }
}

/// Open file on an [`FsStorage`] volume.
#[derive(Debug)]
pub struct FsHandle {
    path: String,
    mode: OpenMode,
    file: File,
}

impl Read for FsHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for FsHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for FsHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}
