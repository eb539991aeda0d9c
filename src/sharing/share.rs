//! Secret share definition.
//!
//! A share is a point `(x, y)` on the polynomial hiding the root key:
//! - `x` ([`ShareId`]): public, identifies the custodian slot.
//! - `y` (value): the polynomial evaluated at `x`, 32 bytes little-endian.
//!
//! The value is wiped on drop and never printed by `Debug`.

use std::fmt;

use blstrs::Scalar;
use ff::PrimeField;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{SHARE_VALUE_LEN, SharingError};
use crate::domain::ShareId;

/// One share of a split root key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    #[zeroize(skip)]
    id: ShareId,
    value: [u8; SHARE_VALUE_LEN],
}

impl Share {
    /// Builds a share from its wire representation
    ///
    /// Only the length is checked here; whether the bytes are a valid field
    /// element is decided by [`validate_share`](super::validate_share).
    ///
    /// # Errors
    /// Returns `MalformedShare` if `value` is not exactly 32 bytes
    pub fn from_bytes(id: ShareId, value: &[u8]) -> Result<Self, SharingError> {
        let value: [u8; SHARE_VALUE_LEN] = value
            .try_into()
            .map_err(|_| SharingError::MalformedShare { id: *id })?;
        Ok(Self { id, value })
    }

    pub(crate) fn from_scalar(id: ShareId, y: &Scalar) -> Self {
        Self {
            id,
            value: y.to_repr(),
        }
    }

    /// Decodes the value as a scalar
    pub(crate) fn scalar(&self) -> Result<Scalar, SharingError> {
        Option::from(Scalar::from_repr(self.value))
            .ok_or(SharingError::MalformedShare { id: *self.id })
    }

    /// The share identifier (x-coordinate)
    #[must_use]
    pub fn id(&self) -> ShareId {
        self.id
    }

    /// The raw share value (y-coordinate)
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("id", &*self.id)
            .field("value", &"***SENSITIVE***")
            .finish()
    }
}
