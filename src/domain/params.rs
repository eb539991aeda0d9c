//! Sharing parameters shared by the splitting side and every custodian

use crate::sharing::SharingError;

use super::{ShareCount, Threshold};

/// Validated pair of threshold and share count
///
/// Enforces `1 <= threshold <= share_count` at the type level, so a
/// deployment can never be configured to need more shares than exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharingParams {
    threshold: Threshold,
    share_count: ShareCount,
}

impl SharingParams {
    /// Creates a new set of sharing parameters
    ///
    /// # Errors
    /// Returns `InvalidParameters` if threshold exceeds share count
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardkeep::domain::{SharingParams, Threshold, ShareCount};
    ///
    /// let params = SharingParams::new(
    ///     Threshold::new(3).unwrap(),
    ///     ShareCount::new(5).unwrap()
    /// ).unwrap();
    ///
    /// assert_eq!(*params.threshold(), 3);
    /// assert_eq!(*params.share_count(), 5);
    ///
    /// let result = SharingParams::new(
    ///     Threshold::new(5).unwrap(),
    ///     ShareCount::new(3).unwrap()
    /// );
    /// assert!(result.is_err());
    /// ```
    pub fn new(threshold: Threshold, share_count: ShareCount) -> Result<Self, SharingError> {
        if *threshold > *share_count {
            return Err(SharingError::InvalidParameters(format!(
                "threshold {} cannot exceed share count {}",
                *threshold, *share_count
            )));
        }
        Ok(Self {
            threshold,
            share_count,
        })
    }

    /// Validates raw `(t, n)` values, as read from configuration
    ///
    /// # Errors
    /// Returns `InvalidParameters` if either value is out of range or `t > n`
    pub fn from_raw(threshold: u8, share_count: u8) -> Result<Self, SharingError> {
        Self::new(Threshold::new(threshold)?, ShareCount::new(share_count)?)
    }

    /// Gets the threshold value
    #[must_use]
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Gets the share count value
    #[must_use]
    pub fn share_count(&self) -> ShareCount {
        self.share_count
    }

    /// Threshold as a collection size
    #[must_use]
    pub fn t(&self) -> usize {
        usize::from(*self.threshold)
    }

    /// Share count as a collection size
    #[must_use]
    pub fn n(&self) -> usize {
        usize::from(*self.share_count)
    }
}
