use thiserror::Error;

/// Failures of the secret-sharing engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharingError {
    /// Bad `t`/`n`, or a secret that does not encode a field element.
    /// A configuration error, fatal at startup.
    #[error("invalid sharing parameters: {0}")]
    InvalidParameters(String),

    /// Fewer than `t` shares with distinct identifiers were supplied
    #[error("insufficient shares: need {needed} distinct shares, got {got}")]
    InsufficientShares { needed: usize, got: usize },

    /// A share value failed to decode as a field element
    #[error("malformed share {id}: value is not a canonical field element")]
    MalformedShare { id: u8 },
}
