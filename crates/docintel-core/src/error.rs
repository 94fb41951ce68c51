use thiserror::Error;

/// Top-level error type for the document-intelligence client.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for DocIntelError` so that the `?` operator works
/// across crate boundaries (see `docintel-client` and `docintel-session`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocIntelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),
}

impl From<toml::de::Error> for DocIntelError {
    fn from(err: toml::de::Error) -> Self {
        DocIntelError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DocIntelError {
    fn from(err: toml::ser::Error) -> Self {
        DocIntelError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DocIntelError {
    fn from(err: serde_json::Error) -> Self {
        DocIntelError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for core operations.
pub type Result<T> = std::result::Result<T, DocIntelError>;
