//! Scripted in-memory backend.
//!
//! Responses are queued per endpoint and served in order. Every call is
//! recorded. An optional gate holds calls until the test releases them, which
//! lets tests observe a flow while its request is outstanding.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::backend::InferenceBackend;
use crate::error::ClientError;
use crate::wire::{AskRequest, AskResponse, ExtractRequest, ExtractResponse, UploadResponse};

/// A request observed by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Upload { file_name: String, size: usize },
    Ask(AskRequest),
    Extract(ExtractRequest),
}

type Scripted<T> = Mutex<VecDeque<Result<T, ClientError>>>;

/// Backend that replays queued responses.
#[derive(Default)]
pub struct MockBackend {
    uploads: Scripted<UploadResponse>,
    answers: Scripted<AskResponse>,
    extractions: Scripted<ExtractResponse>,
    calls: Mutex<Vec<BackendCall>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call until [`MockBackend::release`] is called once per call.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Let `n` held calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn push_upload(&self, response: Result<UploadResponse, ClientError>) {
        lock(&self.uploads).push_back(response);
    }

    pub fn push_answer(&self, response: Result<AskResponse, ClientError>) {
        lock(&self.answers).push_back(response);
    }

    pub fn push_extraction(&self, response: Result<ExtractResponse, ClientError>) {
        lock(&self.extractions).push_back(response);
    }

    /// All calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    async fn record<T>(&self, call: BackendCall, queue: &Scripted<T>) -> Result<T, ClientError> {
        lock(&self.calls).push(call);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        lock(queue)
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no scripted response".to_string())))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        let call = BackendCall::Upload {
            file_name: file_name.to_string(),
            size: bytes.len(),
        };
        self.record(call, &self.uploads).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ClientError> {
        self.record(BackendCall::Ask(request.clone()), &self.answers)
            .await
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResponse, ClientError> {
        self.record(BackendCall::Extract(request.clone()), &self.extractions)
            .await
    }
}
