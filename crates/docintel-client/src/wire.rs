//! JSON bodies exchanged with the backend.

use docintel_core::confidence::GuardrailStatus;
use docintel_core::error::DocIntelError;
use docintel_core::types::{AssistantReply, DocumentId, ExtractionResult, SourceSnippet};
use serde::{Deserialize, Serialize};

/// Success body of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document_id: DocumentId,
    pub filename: String,
    pub num_chunks: u32,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
}

/// Body of `POST /api/ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub document_id: DocumentId,
    pub question: String,
}

/// Success body of `POST /api/ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub confidence: f64,
    pub guardrail_status: GuardrailStatus,
    #[serde(default)]
    pub sources: Vec<SourceSnippet>,
}

impl AskResponse {
    /// The assistant turn content, taken verbatim from the response.
    pub fn into_reply(self) -> AssistantReply {
        AssistantReply {
            text: self.answer,
            confidence: Some(self.confidence),
            guardrail_status: Some(self.guardrail_status),
            sources: self.sources,
        }
    }
}

/// Body of `POST /api/extract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub document_id: DocumentId,
}

/// Success body of `POST /api/extract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub confidence: f64,
}

impl ExtractResponse {
    pub fn into_result(self) -> Result<ExtractionResult, DocIntelError> {
        ExtractionResult::from_wire(&self.data, self.confidence)
    }
}
