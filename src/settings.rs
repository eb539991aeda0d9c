//! Runtime configuration
//!
//! Values arrive from the command line or the environment (see `cli`); this
//! module validates them into the shapes the coordinators consume.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::custodian::{CustodianDirectory, DirectoryError, TlsMaterial};
use crate::domain::SharingParams;
use crate::marker::FileMarker;
use crate::sharing::SharingError;

/// Default per-request custodian timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay between bootstrap or recovery passes
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Sharing(#[from] SharingError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TLS certificate, key and CA are all required to reach custodians")]
    IncompleteTls,
}

/// Everything both coordinators need to talk to the custodian set
#[derive(Debug, Clone)]
pub struct CustodyConfig {
    pub params: SharingParams,
    pub directory: CustodianDirectory,
    pub call_timeout: Duration,
    pub retry_interval: Duration,
}

impl CustodyConfig {
    /// # Errors
    /// Returns `InvalidParameters` unless there is exactly one custodian per share
    pub fn new(params: SharingParams, directory: CustodianDirectory) -> Result<Self, SharingError> {
        directory.check_params(params)?;
        Ok(Self {
            params,
            directory,
            call_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        })
    }

    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }
}

/// Paths to the PEM files of the mutually authenticated channel
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub ca: PathBuf,
}

impl TlsPaths {
    /// Shares are only sent over mutual TLS, so all three paths are required
    ///
    /// # Errors
    /// Returns `IncompleteTls` if any path is missing
    pub fn from_parts(
        cert: Option<PathBuf>,
        key: Option<PathBuf>,
        ca: Option<PathBuf>,
    ) -> Result<Self, SettingsError> {
        match (cert, key, ca) {
            (Some(cert), Some(key), Some(ca)) => Ok(Self { cert, key, ca }),
            _ => Err(SettingsError::IncompleteTls),
        }
    }

    /// Reads the PEM files
    ///
    /// # Errors
    /// Returns `ReadFile` if any file cannot be read
    pub fn load(&self) -> Result<TlsMaterial, SettingsError> {
        let mut identity_pem = Zeroizing::new(read(&self.cert)?);
        let key = Zeroizing::new(read(&self.key)?);
        identity_pem.push(b'\n');
        identity_pem.extend_from_slice(&key);
        Ok(TlsMaterial {
            identity_pem,
            ca_pem: read(&self.ca)?,
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, SettingsError> {
    fs::read(path).map_err(|source| SettingsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub custody: CustodyConfig,
    pub data_dir: PathBuf,
    pub tls: TlsPaths,
}

impl Settings {
    /// `~/.shardkeep/data`, or under `/tmp` when there is no home directory
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".shardkeep")
            .join("data")
    }

    /// Creates the data directory, owner-only on Unix
    ///
    /// # Errors
    /// Returns `DataDir` if the directory cannot be created
    pub fn ensure_data_dir(&self) -> Result<&Path, SettingsError> {
        let wrap = |source| SettingsError::DataDir {
            path: self.data_dir.clone(),
            source,
        };
        fs::create_dir_all(&self.data_dir).map_err(wrap)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.data_dir, fs::Permissions::from_mode(0o700)).map_err(wrap)?;
        }
        Ok(&self.data_dir)
    }

    #[must_use]
    pub fn marker(&self) -> FileMarker {
        FileMarker::in_dir(&self.data_dir)
    }

    /// # Errors
    /// Returns `ReadFile` if a TLS file cannot be read
    pub fn load_tls(&self) -> Result<TlsMaterial, SettingsError> {
        self.tls.load()
    }
}
