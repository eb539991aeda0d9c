//! `ShareCount` newtype for Shamir Secret Sharing

use crate::sharing::SharingError;

/// Number of shares to create (1..=254)
///
/// One share is dealt per custodian, so this is also the required size of the
/// custodian directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShareCount(u8);

impl ShareCount {
    /// Minimum valid share count
    pub const MIN: u8 = 1;

    /// Maximum valid share count (254)
    pub const MAX: u8 = 254;

    /// Creates a new share count
    ///
    /// # Errors
    /// Returns `InvalidParameters` if count is 0 or 255
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardkeep::domain::ShareCount;
    ///
    /// let count = ShareCount::new(5).unwrap();
    /// assert_eq!(*count, 5);
    ///
    /// assert!(ShareCount::new(0).is_err());
    /// assert!(ShareCount::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self, SharingError> {
        if value < Self::MIN {
            return Err(SharingError::InvalidParameters(
                "share count must be at least 1".to_string(),
            ));
        }
        if value > Self::MAX {
            return Err(SharingError::InvalidParameters(format!(
                "share count maximum is {}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for ShareCount {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
