//! Threshold newtype for Shamir Secret Sharing

use crate::sharing::SharingError;

/// Reconstruction threshold (1..=254)
///
/// Invariant: threshold >= 1 (enforced at construction). The upper bound
/// against the share count is enforced by [`SharingParams`](super::SharingParams).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(u8);

impl Threshold {
    /// Maximum valid threshold, bounded by the largest share count
    pub const MAX: u8 = 254;

    /// Creates a new threshold
    ///
    /// # Errors
    /// Returns `InvalidParameters` if the threshold is 0 or above [`Threshold::MAX`]
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardkeep::domain::Threshold;
    ///
    /// let threshold = Threshold::new(3).unwrap();
    /// assert_eq!(*threshold, 3);
    ///
    /// assert!(Threshold::new(0).is_err());
    /// assert!(Threshold::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self, SharingError> {
        if value == 0 {
            return Err(SharingError::InvalidParameters(
                "threshold must be at least 1".to_string(),
            ));
        }
        if value > Self::MAX {
            return Err(SharingError::InvalidParameters(format!(
                "threshold maximum is {} (got {value})",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for Threshold {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
