//! The backend seam the session flows are written against.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::wire::{AskRequest, AskResponse, ExtractRequest, ExtractResponse, UploadResponse};

/// A remote document-intelligence backend.
///
/// Every method is one request/response round trip. Implementations must not
/// retry; a non-2xx status is reported as [`ClientError::Backend`].
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Upload a document as the multipart field `file`.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>)
        -> Result<UploadResponse, ClientError>;

    /// Ask a question about an uploaded document.
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ClientError>;

    /// Extract the structured shipment fields from an uploaded document.
    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResponse, ClientError>;
}
