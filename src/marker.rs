//! Durable record that root-key distribution has completed
//!
//! Presence of the marker is the only signal separating a first run (bootstrap)
//! from a restart (recovery). It is written once, after every custodian has
//! acknowledged its share, and never cleared by this crate.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Marker file name inside the data directory
pub const MARKER_FILE_NAME: &str = "shardkeep.bootstrap.marker";

const MARKER_PAYLOAD: &[u8] = b"shardkeep.bootstrapped=true";

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("failed to read bootstrap marker at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write bootstrap marker at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Durable bootstrap-completion flag
pub trait BootstrapMarker: Send + Sync {
    /// Whether distribution has been recorded as complete
    fn is_present(&self) -> Result<bool, MarkerError>;

    /// Records completion. Writing an already present marker succeeds.
    fn write(&self) -> Result<(), MarkerError>;
}

/// Marker stored as a file, written via temp file + fsync + rename so a
/// reader never sees a partial write
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Marker at the well-known location inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(MARKER_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(MARKER_PAYLOAD)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        // Persist the rename itself
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                dir.sync_all()?;
            }
        }
        Ok(())
    }
}

impl BootstrapMarker for FileMarker {
    fn is_present(&self) -> Result<bool, MarkerError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(MarkerError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self) -> Result<(), MarkerError> {
        self.write_atomically().map_err(|source| MarkerError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "Bootstrap marker written");
        Ok(())
    }
}

/// Process-local marker for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryMarker {
    present: AtomicBool,
}

impl MemoryMarker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A marker that is already present, as after a completed bootstrap
    #[must_use]
    pub fn present() -> Self {
        Self {
            present: AtomicBool::new(true),
        }
    }
}

impl BootstrapMarker for MemoryMarker {
    fn is_present(&self) -> Result<bool, MarkerError> {
        Ok(self.present.load(Ordering::SeqCst))
    }

    fn write(&self) -> Result<(), MarkerError> {
        self.present.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl<M: BootstrapMarker + ?Sized> BootstrapMarker for std::sync::Arc<M> {
    fn is_present(&self) -> Result<bool, MarkerError> {
        (**self).is_present()
    }

    fn write(&self) -> Result<(), MarkerError> {
        (**self).write()
    }
}
