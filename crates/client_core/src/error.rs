use thiserror::Error;

/// Failure of a single remote catalog fetch. The controller treats every
/// variant the same way; the split exists for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("country request failed: {0}")]
    Transport(String),
    #[error("country endpoint returned HTTP {0}")]
    Status(u16),
    #[error("country response could not be decoded: {0}")]
    Decode(String),
}
