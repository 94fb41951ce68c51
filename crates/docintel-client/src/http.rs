//! reqwest-based backend client.

use std::time::Duration;

use async_trait::async_trait;
use docintel_core::config::BackendConfig;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::InferenceBackend;
use crate::error::ClientError;
use crate::wire::{AskRequest, AskResponse, ExtractRequest, ExtractResponse, UploadResponse};

pub const UPLOAD_PATH: &str = "/api/upload";
pub const ASK_PATH: &str = "/api/ask";
pub const EXTRACT_PATH: &str = "/api/extract";

/// HTTP client for the three backend endpoints.
///
/// Every request is bounded by `timeout_secs`; a timed-out request surfaces
/// as [`ClientError::Transport`]. No request is retried.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        read_json(response).await
    }
}

/// Decode a success body, or turn a non-2xx response into
/// [`ClientError::Backend`] with the best-effort `detail`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(ClientError::from);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "Backend returned an error status");
    Err(ClientError::from_status(status.as_u16(), &body))
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        let url = self.config.endpoint(UPLOAD_PATH);
        tracing::debug!(url = %url, file_name = %file_name, size = bytes.len(), "POST multipart");
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self.client.post(&url).multipart(form).send().await?;
        read_json(response).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ClientError> {
        self.post_json(ASK_PATH, request).await
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResponse, ClientError> {
        self.post_json(EXTRACT_PATH, request).await
    }
}
