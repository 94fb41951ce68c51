//! Confidence tiers and guardrail status labels.
//!
//! The tier thresholds are fixed: `>= 0.70` is high, `>= 0.45` is medium,
//! everything else (including NaN) is low. Guardrail status is assigned by the
//! backend; this module only parses and labels it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inclusive lower bound of the high tier.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.70;
/// Inclusive lower bound of the medium tier.
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.45;

/// Client-side bucketing of a confidence score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Classify a confidence score. Total: out-of-range values use the same
    /// thresholds and NaN falls through to `Low`.
    pub fn classify(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceTier::High
        } else if confidence >= MEDIUM_CONFIDENCE_THRESHOLD {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Glyph shown next to the percentage.
    pub fn glyph(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "●",
            ConfidenceTier::Medium => "◐",
            ConfidenceTier::Low => "○",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free function form of [`ConfidenceTier::classify`].
pub fn classify(confidence: f64) -> ConfidenceTier {
    ConfidenceTier::classify(confidence)
}

/// Confidence as a rounded whole percentage.
pub fn confidence_percent(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

/// Backend-assigned trust label for an answer.
///
/// Unknown tags are kept verbatim in `Other` so newer backend statuses still
/// render and re-serialize unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GuardrailStatus {
    Grounded,
    LowConfidence,
    NoContext,
    Refused,
    Other(String),
}

impl GuardrailStatus {
    /// The backend wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            GuardrailStatus::Grounded => "grounded",
            GuardrailStatus::LowConfidence => "low_confidence",
            GuardrailStatus::NoContext => "no_context",
            GuardrailStatus::Refused => "refused",
            GuardrailStatus::Other(raw) => raw,
        }
    }

    /// Human-readable label. Unknown tags pass through unmodified.
    pub fn label(&self) -> &str {
        match self {
            GuardrailStatus::Grounded => "✓ Grounded",
            GuardrailStatus::LowConfidence => "⚠ Low Confidence",
            GuardrailStatus::NoContext => "✕ No Context",
            GuardrailStatus::Refused => "✕ Refused",
            GuardrailStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for GuardrailStatus {
    fn from(tag: &str) -> Self {
        match tag {
            "grounded" => GuardrailStatus::Grounded,
            "low_confidence" => GuardrailStatus::LowConfidence,
            "no_context" => GuardrailStatus::NoContext,
            "refused" => GuardrailStatus::Refused,
            other => GuardrailStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for GuardrailStatus {
    fn from(tag: String) -> Self {
        GuardrailStatus::from(tag.as_str())
    }
}

impl From<GuardrailStatus> for String {
    fn from(status: GuardrailStatus) -> Self {
        match status {
            GuardrailStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for GuardrailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render-ready confidence display for one answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfidenceBadge {
    pub tier: ConfidenceTier,
    pub percent: i64,
    pub status_label: Option<String>,
}

impl ConfidenceBadge {
    pub fn new(confidence: f64, status: Option<&GuardrailStatus>) -> Self {
        Self {
            tier: ConfidenceTier::classify(confidence),
            percent: confidence_percent(confidence),
            status_label: status.map(|s| s.label().to_string()),
        }
    }
}

impl fmt::Display for ConfidenceBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% confidence", self.tier.glyph(), self.percent)?;
        if let Some(label) = &self.status_label {
            write!(f, " [{}]", label)?;
        }
        Ok(())
    }
}
