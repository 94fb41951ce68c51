//! Plain-text rendering of session state for the terminal.

use std::fmt::Write;

use docintel_chat::TurnPair;
use docintel_core::types::{DocumentSession, ExtractionField};
use docintel_extract::ExtractionState;

/// One-line summary of the active document.
pub fn session_header(session: &DocumentSession) -> String {
    let meta = &session.metadata;
    format!(
        "{} | {} | {} | {} chunks | uploaded {}",
        meta.display_name(),
        meta.file_extension,
        meta.size_kb(),
        meta.chunk_count,
        meta.uploaded_at_hhmm()
    )
}

/// Numbered list of suggested questions, or a placeholder.
pub fn suggestions(questions: &[String]) -> String {
    if questions.is_empty() {
        return "No suggestions available".to_string();
    }
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("  {}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A result card: the question, then its answer or a pending marker.
pub fn pair(pair: &TurnPair) -> String {
    let mut out = format!("Q: {}\n", pair.user.text);
    let Some(answer) = &pair.assistant else {
        out.push_str("   ...");
        return out;
    };

    let _ = write!(out, "A: {}", answer.text);
    if let Some(badge) = answer.badge() {
        let _ = write!(out, "\n   {}", badge);
    }
    for (i, source) in answer.sources.iter().enumerate() {
        let _ = write!(
            out,
            "\n   [{}] {}% relevant: {}",
            i + 1,
            source.relevance_percent(),
            source.preview()
        );
    }
    out
}

/// The extraction surface for a given state.
pub fn extraction(state: &ExtractionState) -> String {
    match state {
        ExtractionState::Idle => "No extraction yet. Type /extract.".to_string(),
        ExtractionState::InFlight => "Extracting...".to_string(),
        ExtractionState::Failed(message) => format!("Extraction error: {}", message),
        ExtractionState::Ready(result) => {
            let width = ExtractionField::ALL
                .iter()
                .map(|f| f.label().len())
                .max()
                .unwrap_or(0);
            let mut out = result.badge().to_string();
            for field in ExtractionField::ALL {
                let value = result.get(field).unwrap_or("null");
                let _ = write!(out, "\n  {:<width$}  {}", field.label(), value, width = width);
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use docintel_core::confidence::GuardrailStatus;
    use docintel_core::types::{
        AssistantReply, DocumentId, DocumentMetadata, ExtractionResult, SourceSnippet, Turn,
    };
    use serde_json::json;

    #[test]
    fn test_session_header() {
        let session = DocumentSession {
            document_id: DocumentId::new("d1"),
            metadata: DocumentMetadata {
                filename: "Rate_Confirmation_March.pdf".to_string(),
                size_bytes: 2048,
                file_extension: "PDF".to_string(),
                uploaded_at: Local.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap(),
                chunk_count: 4,
            },
            suggested_questions: vec![],
        };
        assert_eq!(
            session_header(&session),
            "Rate_Confirmati...pdf | PDF | 2.0 KB | 4 chunks | uploaded 14:30"
        );
    }

    #[test]
    fn test_suggestions_list() {
        assert_eq!(suggestions(&[]), "No suggestions available");
        let qs = vec!["What is the rate?".to_string(), "Who is the carrier?".to_string()];
        assert_eq!(
            suggestions(&qs),
            "  1. What is the rate?\n  2. Who is the carrier?"
        );
    }

    #[test]
    fn test_pending_and_answered_pair() {
        let user = Turn::user("What is the rate?");
        let pending = TurnPair {
            user: user.clone(),
            assistant: None,
        };
        assert_eq!(pair(&pending), "Q: What is the rate?\n   ...");

        let answered = TurnPair {
            assistant: Some(Turn::assistant(
                user.id,
                AssistantReply {
                    text: "$1200".to_string(),
                    confidence: Some(0.82),
                    guardrail_status: Some(GuardrailStatus::Grounded),
                    sources: vec![SourceSnippet {
                        text: "Line haul $1,200.00".to_string(),
                        similarity_score: 0.914,
                    }],
                },
            )),
            user,
        };
        assert_eq!(
            pair(&answered),
            "Q: What is the rate?\nA: $1200\n   ● 82% confidence [✓ Grounded]\n   [1] 91% relevant: Line haul $1,200.00"
        );
    }

    #[test]
    fn test_extraction_shows_null() {
        let data = json!({
            "shipment_id": "SH-1", "shipper": "Acme", "consignee": null,
            "pickup_datetime": null, "delivery_datetime": null, "equipment_type": null,
            "mode": null, "rate": null, "currency": null, "weight": null,
            "carrier_name": "Swift"
        });
        let result = ExtractionResult::from_wire(data.as_object().unwrap(), 0.5).unwrap();
        let text = extraction(&ExtractionState::Ready(result));

        assert!(text.starts_with("◐ 50% confidence [✓ Grounded]"));
        assert!(text.contains("Carrier Name        Swift"));
        assert!(text.contains("Rate                null"));
        assert_eq!(
            extraction(&ExtractionState::Failed("Extraction failed".into())),
            "Extraction error: Extraction failed"
        );
    }
}
