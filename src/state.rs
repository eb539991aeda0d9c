//! In-memory custody of the live root key
//!
//! [`RootKeyState`] is the only holder of the root key and the only place it
//! may be replaced. Readers share access; an install takes the write lock for
//! an `Arc` swap. The state is never persisted, so every process starts unset.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::sharing::ROOT_KEY_LEN;

/// The symmetric key protecting the secret store
///
/// Wiped on drop and redacted in `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RootKey([u8; ROOT_KEY_LEN]);

impl RootKey {
    #[must_use]
    pub fn from_bytes(bytes: [u8; ROOT_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a reconstructed secret
    ///
    /// Returns `None` if the slice is not exactly [`ROOT_KEY_LEN`] bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; ROOT_KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ROOT_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootKey(***SENSITIVE***)")
    }
}

/// Shared holder of the current root key
///
/// Cloning shares the same underlying slot, which is how the key is handed to
/// the coordinators and to the secret store.
#[derive(Clone, Default)]
pub struct RootKeyState {
    slot: Arc<RwLock<Option<Arc<RootKey>>>>,
}

impl RootKeyState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed key, or `None` while the service must not serve traffic
    #[must_use]
    pub fn get(&self) -> Option<Arc<RootKey>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `key`, replacing any previous value
    pub fn set(&self, key: RootKey) {
        let key = Arc::new(key);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(key);
        tracing::debug!("Root key installed");
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for RootKeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootKeyState")
            .field("set", &self.is_set())
            .finish()
    }
}
