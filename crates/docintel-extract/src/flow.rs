//! Extraction flow state machine.
//!
//! - Idle -> InFlight (attempt started; any previous result is discarded)
//! - InFlight -> Ready (backend returned the full schema)
//! - InFlight -> Failed (backend, transport, or contract failure)
//! - InFlight -> Idle (attempt abandoned before it resolved)
//!
//! Ready and Failed are replaced wholesale by the next attempt.

use std::sync::{Arc, Mutex, MutexGuard};

use docintel_client::{ExtractRequest, InferenceBackend};
use docintel_core::flight::{FlightPermit, RequestState, SingleFlight};
use docintel_core::types::{DocumentId, ExtractionResult};

/// Message used when a failed extraction carries no readable detail.
pub const EXTRACTION_FALLBACK_MESSAGE: &str = "Extraction failed";

/// What the extraction surface currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ExtractionState {
    #[default]
    Idle,
    InFlight,
    Ready(ExtractionResult),
    Failed(String),
}

/// Why an extraction request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSkip {
    NoDocument,
    Busy,
}

/// Result of one call to [`ExtractionFlow::run_extraction`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Skipped(ExtractionSkip),
    Ready(ExtractionResult),
    Failed(String),
}

/// Runs extraction requests, one at a time, and holds the latest outcome.
#[derive(Clone)]
pub struct ExtractionFlow {
    backend: Arc<dyn InferenceBackend>,
    state: Arc<Mutex<ExtractionState>>,
    flight: SingleFlight,
}

impl ExtractionFlow {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(ExtractionState::Idle)),
            flight: SingleFlight::new(),
        }
    }

    pub fn state(&self) -> ExtractionState {
        lock(&self.state).clone()
    }

    pub fn request_state(&self) -> RequestState {
        self.flight.state()
    }

    /// The latest successful result, if the last attempt succeeded.
    pub fn result(&self) -> Option<ExtractionResult> {
        match &*lock(&self.state) {
            ExtractionState::Ready(result) => Some(result.clone()),
            _ => None,
        }
    }

    /// The latest failure message, if the last attempt failed.
    pub fn error(&self) -> Option<String> {
        match &*lock(&self.state) {
            ExtractionState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Request a fresh extraction for `document_id`.
    pub async fn run_extraction(&self, document_id: Option<&DocumentId>) -> ExtractionOutcome {
        let Some(document_id) = document_id else {
            tracing::debug!("Extraction ignored: no document loaded");
            return ExtractionOutcome::Skipped(ExtractionSkip::NoDocument);
        };
        let Some(permit) = self.flight.try_acquire() else {
            tracing::debug!("Extraction ignored: already in flight");
            return ExtractionOutcome::Skipped(ExtractionSkip::Busy);
        };

        let mut attempt = Attempt::start(Arc::clone(&self.state), permit);
        tracing::info!(document_id = %document_id, "Extraction started");

        let request = ExtractRequest {
            document_id: document_id.clone(),
        };
        let outcome = match self.backend.extract(&request).await {
            Ok(response) => match response.into_result() {
                Ok(result) => ExtractionOutcome::Ready(result),
                Err(err) => {
                    tracing::warn!(document_id = %document_id, error = %err, "Extraction payload rejected");
                    ExtractionOutcome::Failed(EXTRACTION_FALLBACK_MESSAGE.to_string())
                }
            },
            Err(err) => {
                tracing::warn!(document_id = %document_id, error = %err, "Extraction failed");
                ExtractionOutcome::Failed(err.user_message(EXTRACTION_FALLBACK_MESSAGE))
            }
        };

        attempt.finish(&outcome);
        outcome
    }
}

/// One extraction attempt. Owns the flow's in-flight slot and puts the
/// state back to `Idle` if dropped before [`Attempt::finish`].
struct Attempt {
    state: Arc<Mutex<ExtractionState>>,
    finished: bool,
    _permit: FlightPermit,
}

impl Attempt {
    fn start(state: Arc<Mutex<ExtractionState>>, permit: FlightPermit) -> Self {
        *lock(&state) = ExtractionState::InFlight;
        Self {
            state,
            finished: false,
            _permit: permit,
        }
    }

    fn finish(&mut self, outcome: &ExtractionOutcome) {
        let next = match outcome {
            ExtractionOutcome::Ready(result) => ExtractionState::Ready(result.clone()),
            ExtractionOutcome::Failed(message) => ExtractionState::Failed(message.clone()),
            ExtractionOutcome::Skipped(_) => ExtractionState::Idle,
        };
        *lock(&self.state) = next;
        self.finished = true;
    }
}

impl Drop for Attempt {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Extraction abandoned before completion");
            *lock(&self.state) = ExtractionState::Idle;
        }
    }
}

fn lock(state: &Mutex<ExtractionState>) -> MutexGuard<'_, ExtractionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Tests
// =============================================================================
