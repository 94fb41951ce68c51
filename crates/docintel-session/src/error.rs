//! Error types for the upload flow.

use docintel_client::ClientError;
use docintel_core::error::DocIntelError;

/// Inline message shown when a file is rejected by extension.
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Unsupported file type. Please upload PDF, DOCX, or TXT.";

/// Message used when a failed upload carries no readable detail.
pub const UPLOAD_FALLBACK_MESSAGE: &str = "Upload failed";

/// Errors from admitting or uploading a document.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type. Please upload PDF, DOCX, or TXT.")]
    UnsupportedType { extension: String },
    #[error("an upload is already in progress")]
    Busy,
    #[error("file has no name")]
    NoFileName,
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl UploadError {
    /// The persistent inline message for this failure.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Client(err) => err.user_message(UPLOAD_FALLBACK_MESSAGE),
            other => other.to_string(),
        }
    }
}

impl From<UploadError> for DocIntelError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(io) => DocIntelError::Io(io),
            UploadError::Client(client) => client.into(),
            other => DocIntelError::Upload(other.to_string()),
        }
    }
}
