use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::confidence::{ConfidenceBadge, GuardrailStatus};
use crate::error::DocIntelError;

/// Maximum characters of a source snippet shown before truncation.
pub const SOURCE_PREVIEW_CHARS: usize = 300;

/// Filenames longer than this are shortened for display.
const DISPLAY_NAME_MAX_CHARS: usize = 18;

// =============================================================================
// Document session
// =============================================================================

/// Opaque backend handle for an uploaded document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// File facts observed on the client before the upload resolves.
///
/// The backend never reports size or upload time, so these are measured
/// locally and merged with the upload response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientFileInfo {
    pub size_bytes: u64,
    /// Upper-case extension without the dot, e.g. `PDF`.
    pub file_extension: String,
    pub uploaded_at: DateTime<Local>,
}

impl ClientFileInfo {
    /// Observe a file at the current wall-clock time.
    pub fn observe(file_name: &str, size_bytes: u64) -> Self {
        Self::observe_at(file_name, size_bytes, Local::now())
    }

    pub fn observe_at(file_name: &str, size_bytes: u64, uploaded_at: DateTime<Local>) -> Self {
        Self {
            size_bytes,
            file_extension: file_extension(file_name).to_uppercase(),
            uploaded_at,
        }
    }
}

/// Text after the last dot of a file name, or the whole name if it has none.
pub fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

/// Descriptive facts about the active document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub size_bytes: u64,
    pub file_extension: String,
    pub uploaded_at: DateTime<Local>,
    pub chunk_count: u32,
}

impl DocumentMetadata {
    /// Filename shortened to `first15...last3` when longer than 18 characters.
    pub fn display_name(&self) -> String {
        let chars: Vec<char> = self.filename.chars().collect();
        if chars.len() <= DISPLAY_NAME_MAX_CHARS {
            return self.filename.clone();
        }
        let head: String = chars[..15].iter().collect();
        let tail: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", head, tail)
    }

    /// Size in kilobytes with one decimal, e.g. `"12.5 KB"`.
    pub fn size_kb(&self) -> String {
        format!("{:.1} KB", self.size_bytes as f64 / 1024.0)
    }

    /// Upload time as `HH:MM`.
    pub fn uploaded_at_hhmm(&self) -> String {
        self.uploaded_at.format("%H:%M").to_string()
    }
}

/// The document under analysis. Replaced atomically on every successful upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentSession {
    pub document_id: DocumentId,
    pub metadata: DocumentMetadata,
    /// Backend-provided starter prompts. Empty means no suggestions.
    pub suggested_questions: Vec<String>,
}

/// Which analysis surface is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    #[default]
    Conversation,
    Extraction,
}

// =============================================================================
// Conversation turns
// =============================================================================

/// Stable identifier of a turn within a thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Author of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A retrieved passage supporting an answer. Produced only by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSnippet {
    pub text: String,
    pub similarity_score: f64,
}

impl SourceSnippet {
    /// Similarity as a rounded whole percentage.
    pub fn relevance_percent(&self) -> i64 {
        (self.similarity_score * 100.0).round() as i64
    }

    /// Snippet text truncated to [`SOURCE_PREVIEW_CHARS`] characters.
    pub fn preview(&self) -> String {
        if self.text.chars().count() > SOURCE_PREVIEW_CHARS {
            let head: String = self.text.chars().take(SOURCE_PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.text.clone()
        }
    }
}

/// Content of an assistant turn, before it is placed in a thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub text: String,
    pub confidence: Option<f64>,
    pub guardrail_status: Option<GuardrailStatus>,
    pub sources: Vec<SourceSnippet>,
}

impl AssistantReply {
    /// The terminal turn shown when a question round trip fails.
    pub fn error(message: &str) -> Self {
        Self {
            text: format!("Error: {}", message),
            confidence: Some(0.0),
            guardrail_status: Some(GuardrailStatus::Refused),
            sources: Vec::new(),
        }
    }
}

/// One entry in the conversation log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    /// For assistant turns: the user turn this answers.
    pub reply_to: Option<TurnId>,
    pub confidence: Option<f64>,
    pub guardrail_status: Option<GuardrailStatus>,
    pub sources: Vec<SourceSnippet>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role: Role::User,
            text: text.into(),
            reply_to: None,
            confidence: None,
            guardrail_status: None,
            sources: Vec::new(),
        }
    }

    pub fn assistant(reply_to: TurnId, reply: AssistantReply) -> Self {
        Self {
            id: TurnId::new(),
            role: Role::Assistant,
            text: reply.text,
            reply_to: Some(reply_to),
            confidence: reply.confidence,
            guardrail_status: reply.guardrail_status,
            sources: reply.sources,
        }
    }

    /// Confidence display, if this turn carries a score.
    pub fn badge(&self) -> Option<ConfidenceBadge> {
        self.confidence
            .map(|c| ConfidenceBadge::new(c, self.guardrail_status.as_ref()))
    }
}

// =============================================================================
// Structured extraction
// =============================================================================

/// The fixed shipment schema returned by the extraction endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionField {
    ShipmentId,
    Shipper,
    Consignee,
    PickupDatetime,
    DeliveryDatetime,
    EquipmentType,
    Mode,
    Rate,
    Currency,
    Weight,
    CarrierName,
}

impl ExtractionField {
    /// All fields in display order.
    pub const ALL: [ExtractionField; 11] = [
        ExtractionField::ShipmentId,
        ExtractionField::Shipper,
        ExtractionField::Consignee,
        ExtractionField::PickupDatetime,
        ExtractionField::DeliveryDatetime,
        ExtractionField::EquipmentType,
        ExtractionField::Mode,
        ExtractionField::Rate,
        ExtractionField::Currency,
        ExtractionField::Weight,
        ExtractionField::CarrierName,
    ];

    /// Wire key.
    pub fn key(&self) -> &'static str {
        match self {
            ExtractionField::ShipmentId => "shipment_id",
            ExtractionField::Shipper => "shipper",
            ExtractionField::Consignee => "consignee",
            ExtractionField::PickupDatetime => "pickup_datetime",
            ExtractionField::DeliveryDatetime => "delivery_datetime",
            ExtractionField::EquipmentType => "equipment_type",
            ExtractionField::Mode => "mode",
            ExtractionField::Rate => "rate",
            ExtractionField::Currency => "currency",
            ExtractionField::Weight => "weight",
            ExtractionField::CarrierName => "carrier_name",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractionField::ShipmentId => "Shipment ID",
            ExtractionField::Shipper => "Shipper",
            ExtractionField::Consignee => "Consignee",
            ExtractionField::PickupDatetime => "Pickup Date/Time",
            ExtractionField::DeliveryDatetime => "Delivery Date/Time",
            ExtractionField::EquipmentType => "Equipment Type",
            ExtractionField::Mode => "Mode",
            ExtractionField::Rate => "Rate",
            ExtractionField::Currency => "Currency",
            ExtractionField::Weight => "Weight",
            ExtractionField::CarrierName => "Carrier Name",
        }
    }
}

/// Structured fields pulled from a document, plus one overall confidence.
///
/// Every schema field is present; `None` means the backend found no value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: BTreeMap<ExtractionField, Option<String>>,
    pub confidence: f64,
}

impl ExtractionResult {
    /// Build a result from the backend's `data` object.
    ///
    /// Scalars are kept as text; `null` becomes `None`. A missing schema key
    /// is a contract violation. Keys outside the schema are ignored.
    pub fn from_wire(
        data: &serde_json::Map<String, serde_json::Value>,
        confidence: f64,
    ) -> Result<Self, DocIntelError> {
        let mut fields = BTreeMap::new();
        for field in ExtractionField::ALL {
            let value = data.get(field.key()).ok_or_else(|| {
                DocIntelError::ContractViolation(format!(
                    "extraction payload is missing field '{}'",
                    field.key()
                ))
            })?;
            let value = match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            fields.insert(field, value);
        }

        for key in data.keys() {
            if !ExtractionField::ALL.iter().any(|f| f.key() == key) {
                tracing::debug!(key = %key, "Ignoring field outside the extraction schema");
            }
        }

        Ok(Self { fields, confidence })
    }

    /// Value of a field; `None` when the backend found nothing.
    pub fn get(&self, field: ExtractionField) -> Option<&str> {
        self.fields.get(&field).and_then(|v| v.as_deref())
    }

    /// Whether the field is part of the result at all (always true for a
    /// result built by [`ExtractionResult::from_wire`]).
    pub fn contains(&self, field: ExtractionField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn badge(&self) -> ConfidenceBadge {
        ConfidenceBadge::new(self.confidence, Some(&GuardrailStatus::Grounded))
    }
}
