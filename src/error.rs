//! Crate-level error aggregation for the application boundary

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::custodian::{CustodianError, DirectoryError};
use crate::marker::MarkerError;
use crate::recovery::RecoveryError;
use crate::settings::SettingsError;
use crate::sharing::SharingError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sharing(#[from] SharingError),

    #[error(transparent)]
    Custodian(#[from] CustodianError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Marker(#[from] MarkerError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl Error {
    /// Conditions after which the process must not keep running: an
    /// unrecorded bootstrap, or a reconstruction that may have produced a
    /// wrong key
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Bootstrap(e) => e.is_fatal(),
            Self::Recovery(e) => e.is_fatal(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
