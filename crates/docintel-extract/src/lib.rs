//! Structured-field extraction for the active document.
//!
//! A single-shot request/response cycle, independent of the conversation
//! thread, that produces an [`ExtractionResult`](docintel_core::ExtractionResult)
//! or a standalone failure message.

pub mod flow;

pub use flow::{ExtractionFlow, ExtractionOutcome, ExtractionSkip, ExtractionState};
