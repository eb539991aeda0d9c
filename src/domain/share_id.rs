//! `ShareId` newtype for Shamir Secret Sharing

use serde::{Deserialize, Serialize};

use crate::sharing::SharingError;

/// Share identifier (1..=254)
///
/// The x-coordinate at which the sharing polynomial is evaluated. Zero is
/// never a valid identifier since the polynomial's value at zero is the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ShareId(u8);

impl ShareId {
    /// Maximum valid share identifier (254)
    pub const MAX: u8 = 254;

    /// Creates a new share identifier
    ///
    /// # Errors
    /// Returns `InvalidParameters` if the identifier is 0 or 255
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardkeep::domain::ShareId;
    ///
    /// let id = ShareId::new(1).unwrap();
    /// assert_eq!(*id, 1);
    ///
    /// assert!(ShareId::new(0).is_err());
    /// assert!(ShareId::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self, SharingError> {
        if value == 0 || value > Self::MAX {
            return Err(SharingError::InvalidParameters(format!(
                "share identifier must be in 1..={} (got {value})",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    /// Identifier of the custodian at `position` in directory order
    ///
    /// # Errors
    /// Returns `InvalidParameters` if the position is past the last identifier
    pub fn for_position(position: usize) -> Result<Self, SharingError> {
        let value = u8::try_from(position + 1).map_err(|_| {
            SharingError::InvalidParameters(format!("no share identifier for position {position}"))
        })?;
        Self::new(value)
    }

    /// Zero-based directory position this identifier was dealt to
    #[must_use]
    pub fn position(self) -> usize {
        usize::from(self.0) - 1
    }
}

impl std::ops::Deref for ShareId {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u8> for ShareId {
    type Error = SharingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShareId> for u8 {
    fn from(id: ShareId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ShareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
