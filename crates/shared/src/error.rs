use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed country code '{0}': expected two ASCII letters")]
    MalformedCountryCode(String),
}
