//! Question dispatch: one question/answer round trip at a time.
//!
//! Preconditions are checked synchronously and a failed check is a silent
//! no-op. Once accepted, the user turn is appended before any network
//! activity, and the round trip always ends in exactly one assistant turn:
//! the backend's answer, or an `Error: ...` turn with zero confidence and a
//! `refused` status. Nothing is retried.

use std::sync::Arc;

use docintel_client::{AskRequest, InferenceBackend};
use docintel_core::flight::{FlightPermit, RequestState, SingleFlight};
use docintel_core::types::{AssistantReply, DocumentId, TurnId};

use crate::thread::ThreadStore;

/// Message used when a failed answer carries no readable detail.
pub const ASK_FALLBACK_MESSAGE: &str = "Failed to get answer";

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoDocument,
    EmptyQuestion,
    Busy,
}

/// Result of one call to [`QueryDispatcher::submit_question`].
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Preconditions failed; nothing was appended.
    Skipped(SkipReason),
    /// The backend answered; the assistant turn holds the answer.
    Answered { question: TurnId, answer: TurnId },
    /// The round trip failed; the assistant turn holds the error.
    Failed {
        question: TurnId,
        answer: TurnId,
        message: String,
    },
    /// The thread was reset while the request was outstanding, so the reply
    /// no longer has a question to attach to and was dropped.
    Discarded { question: TurnId },
}

/// Runs question/answer round trips against a backend, one at a time.
#[derive(Clone)]
pub struct QueryDispatcher {
    backend: Arc<dyn InferenceBackend>,
    thread: ThreadStore,
    flight: SingleFlight,
}

impl QueryDispatcher {
    pub fn new(backend: Arc<dyn InferenceBackend>, thread: ThreadStore) -> Self {
        Self {
            backend,
            thread,
            flight: SingleFlight::new(),
        }
    }

    pub fn thread(&self) -> &ThreadStore {
        &self.thread
    }

    pub fn request_state(&self) -> RequestState {
        self.flight.state()
    }

    /// Check preconditions, take the in-flight slot, and append the user turn.
    ///
    /// Runs without suspending, so callers can clear their input field
    /// between this and [`PendingQuestion::complete`].
    pub fn begin(
        &self,
        document_id: Option<&DocumentId>,
        question: &str,
    ) -> Result<PendingQuestion, SkipReason> {
        let Some(document_id) = document_id else {
            tracing::debug!("Question ignored: no document loaded");
            return Err(SkipReason::NoDocument);
        };

        let question = question.trim();
        if question.is_empty() {
            tracing::debug!("Question ignored: empty");
            return Err(SkipReason::EmptyQuestion);
        }

        let Some(permit) = self.flight.try_acquire() else {
            tracing::debug!("Question ignored: another question is in flight");
            return Err(SkipReason::Busy);
        };

        let user_turn = self.thread.append_user(question);
        tracing::info!(document_id = %document_id, turn = %user_turn, "Question submitted");

        Ok(PendingQuestion {
            backend: Arc::clone(&self.backend),
            thread: self.thread.clone(),
            request: AskRequest {
                document_id: document_id.clone(),
                question: question.to_string(),
            },
            user_turn,
            _permit: permit,
        })
    }

    /// Run one full round trip.
    pub async fn submit_question(
        &self,
        document_id: Option<&DocumentId>,
        question: &str,
    ) -> DispatchOutcome {
        match self.begin(document_id, question) {
            Ok(pending) => pending.complete().await,
            Err(reason) => DispatchOutcome::Skipped(reason),
        }
    }
}

/// An accepted question whose answer has not been requested yet.
///
/// Holds the dispatcher's in-flight slot; dropping it (after completion, on
/// panic, or by abandoning the future) returns the dispatcher to idle.
#[must_use = "the question is only sent when `complete` is awaited"]
pub struct PendingQuestion {
    backend: Arc<dyn InferenceBackend>,
    thread: ThreadStore,
    request: AskRequest,
    user_turn: TurnId,
    _permit: FlightPermit,
}

impl PendingQuestion {
    pub fn user_turn(&self) -> TurnId {
        self.user_turn
    }

    pub fn question(&self) -> &str {
        &self.request.question
    }

    /// Send the question and record the terminal assistant turn.
    pub async fn complete(self) -> DispatchOutcome {
        let result = self.backend.ask(&self.request).await;

        let (reply, failure) = match result {
            Ok(response) => (response.into_reply(), None),
            Err(err) => {
                let message = err.user_message(ASK_FALLBACK_MESSAGE);
                tracing::warn!(
                    document_id = %self.request.document_id,
                    error = %err,
                    "Question failed"
                );
                (AssistantReply::error(&message), Some(message))
            }
        };

        if !self.thread.contains(self.user_turn) {
            tracing::info!(turn = %self.user_turn, "Thread was reset; dropping late reply");
            return DispatchOutcome::Discarded {
                question: self.user_turn,
            };
        }

        let answer = self.thread.append_assistant(self.user_turn, reply);
        match failure {
            None => DispatchOutcome::Answered {
                question: self.user_turn,
                answer,
            },
            Some(message) => DispatchOutcome::Failed {
                question: self.user_turn,
                answer,
                message,
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use docintel_client::{
        AskResponse, BackendCall, ClientError, ExtractRequest, ExtractResponse, MockBackend,
        UploadResponse,
    };
    use docintel_core::confidence::{ConfidenceTier, GuardrailStatus};
    use docintel_core::types::{Role, SourceSnippet};

    fn doc() -> DocumentId {
        DocumentId::new("d1")
    }

    fn answer(text: &str, confidence: f64) -> AskResponse {
        AskResponse {
            answer: text.to_string(),
            confidence,
            guardrail_status: GuardrailStatus::Grounded,
            sources: vec![SourceSnippet {
                text: "Rate: $1200 USD".to_string(),
                similarity_score: 0.91,
            }],
        }
    }

    fn dispatcher_with(backend: Arc<MockBackend>) -> QueryDispatcher {
        QueryDispatcher::new(backend, ThreadStore::new())
    }

    // ---- Preconditions ----

    #[tokio::test]
    async fn no_document_is_a_no_op() {
        let backend = Arc::new(MockBackend::new());
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let outcome = dispatcher.submit_question(None, "What is the rate?").await;
        assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::NoDocument));
        assert!(dispatcher.thread().is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_and_whitespace_questions_are_no_ops() {
        let backend = Arc::new(MockBackend::new());
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        for question in ["", "   ", "\n\t "] {
            let outcome = dispatcher.submit_question(Some(&doc()), question).await;
            assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::EmptyQuestion));
        }
        assert!(dispatcher.thread().is_empty());
        assert_eq!(backend.call_count(), 0);
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn submission_while_in_flight_changes_nothing() {
        let backend = Arc::new(MockBackend::new());
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let pending = dispatcher.begin(Some(&doc()), "first").unwrap();
        assert_eq!(dispatcher.request_state(), RequestState::InFlight);
        let before = dispatcher.thread().turns();

        let outcome = dispatcher.submit_question(Some(&doc()), "second").await;
        assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::Busy));
        assert_eq!(dispatcher.thread().turns(), before);
        assert_eq!(backend.call_count(), 0);
        assert_eq!(dispatcher.request_state(), RequestState::InFlight);

        drop(pending);
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }

    // ---- Round trips ----

    #[tokio::test]
    async fn success_appends_verbatim_answer() {
        let backend = Arc::new(MockBackend::new());
        let response = answer("$1200", 0.82);
        backend.push_answer(Ok(response.clone()));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let outcome = dispatcher
            .submit_question(Some(&doc()), "What is the rate?")
            .await;
        assert!(matches!(outcome, DispatchOutcome::Answered { .. }));

        let pairs = dispatcher.thread().pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].user.text, "What is the rate?");
        let reply = pairs[0].assistant.as_ref().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.text, response.answer);
        assert_eq!(reply.confidence, Some(response.confidence));
        assert_eq!(reply.guardrail_status, Some(response.guardrail_status));
        assert_eq!(reply.sources, response.sources);
        assert_eq!(reply.badge().unwrap().tier, ConfidenceTier::High);
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn backend_error_becomes_refused_error_turn() {
        let backend = Arc::new(MockBackend::new());
        backend.push_answer(Err(ClientError::from_status(500, r#"{"detail":"boom"}"#)));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let outcome = dispatcher.submit_question(Some(&doc()), "rate?").await;
        match outcome {
            DispatchOutcome::Failed { message, .. } => assert_eq!(message, "boom"),
            other => panic!("expected failure, got {:?}", other),
        }

        let pairs = dispatcher.thread().pairs();
        let reply = pairs[0].assistant.as_ref().unwrap();
        assert_eq!(reply.text, "Error: boom");
        assert_eq!(reply.confidence, Some(0.0));
        assert_eq!(reply.guardrail_status, Some(GuardrailStatus::Refused));
        assert!(reply.sources.is_empty());
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn error_without_detail_uses_fallback() {
        let backend = Arc::new(MockBackend::new());
        backend.push_answer(Err(ClientError::from_status(502, "<html>")));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        dispatcher.submit_question(Some(&doc()), "rate?").await;
        let turns = dispatcher.thread().turns();
        assert_eq!(turns[1].text, "Error: Failed to get answer");
    }

    #[tokio::test]
    async fn failure_is_not_retried_and_next_question_is_accepted() {
        let backend = Arc::new(MockBackend::new());
        backend.push_answer(Err(ClientError::Transport("connection refused".into())));
        backend.push_answer(Ok(answer("Swift", 0.5)));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        dispatcher.submit_question(Some(&doc()), "first").await;
        assert_eq!(backend.call_count(), 1);

        let outcome = dispatcher.submit_question(Some(&doc()), "second").await;
        assert!(matches!(outcome, DispatchOutcome::Answered { .. }));
        assert_eq!(backend.call_count(), 2);

        let pairs = dispatcher.thread().pairs();
        assert_eq!(
            pairs[0].assistant.as_ref().unwrap().text,
            "Error: connection refused"
        );
        assert_eq!(pairs[1].assistant.as_ref().unwrap().text, "Swift");
    }

    #[tokio::test]
    async fn question_is_trimmed_before_append_and_send() {
        let backend = Arc::new(MockBackend::new());
        backend.push_answer(Ok(answer("ok", 0.9)));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        dispatcher
            .submit_question(Some(&doc()), "  What is the rate?  \n")
            .await;

        assert_eq!(dispatcher.thread().turns()[0].text, "What is the rate?");
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Ask(AskRequest {
                document_id: doc(),
                question: "What is the rate?".to_string(),
            })]
        );
    }

    #[tokio::test]
    async fn user_turn_is_visible_before_the_answer_arrives() {
        let backend = Arc::new(MockBackend::gated());
        backend.push_answer(Ok(answer("$1200", 0.82)));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let pending = dispatcher.begin(Some(&doc()), "What is the rate?").unwrap();
        assert_eq!(pending.question(), "What is the rate?");
        let task = tokio::spawn(pending.complete());
        tokio::task::yield_now().await;

        let pairs = dispatcher.thread().pairs();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].is_pending());
        assert!(dispatcher.thread().awaiting_response());

        backend.release(1);
        task.await.unwrap();
        assert!(!dispatcher.thread().awaiting_response());
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn concurrent_submissions_are_rejected_not_queued() {
        let backend = Arc::new(MockBackend::gated());
        backend.push_answer(Ok(answer("one", 0.9)));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit_question(Some(&doc()), "one").await })
        };
        tokio::task::yield_now().await;

        let second = dispatcher.submit_question(Some(&doc()), "two").await;
        assert_eq!(second, DispatchOutcome::Skipped(SkipReason::Busy));

        backend.release(1);
        assert!(matches!(
            first.await.unwrap(),
            DispatchOutcome::Answered { .. }
        ));
        assert_eq!(backend.call_count(), 1);
        assert_eq!(dispatcher.thread().len(), 2);
    }

    #[tokio::test]
    async fn answers_follow_request_order() {
        let backend = Arc::new(MockBackend::new());
        for i in 0..5 {
            backend.push_answer(Ok(answer(&format!("answer {}", i), 0.8)));
        }
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        for i in 0..5 {
            dispatcher
                .submit_question(Some(&doc()), &format!("question {}", i))
                .await;
        }

        let pairs = dispatcher.thread().pairs();
        assert_eq!(pairs.len(), 5);
        for (i, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.user.text, format!("question {}", i));
            assert_eq!(pair.assistant.as_ref().unwrap().text, format!("answer {}", i));
        }
    }

    // ---- Guaranteed release ----

    #[tokio::test]
    async fn abandoned_request_releases_the_slot() {
        let backend = Arc::new(MockBackend::gated());
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            dispatcher.submit_question(Some(&doc()), "never answered"),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }

    struct PanickingBackend;

    #[async_trait]
    impl InferenceBackend for PanickingBackend {
        async fn upload(&self, _: &str, _: Vec<u8>) -> Result<UploadResponse, ClientError> {
            unreachable!()
        }

        async fn ask(&self, _: &AskRequest) -> Result<AskResponse, ClientError> {
            panic!("response parsing blew up");
        }

        async fn extract(&self, _: &ExtractRequest) -> Result<ExtractResponse, ClientError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn panic_during_round_trip_releases_the_slot() {
        let dispatcher = QueryDispatcher::new(Arc::new(PanickingBackend), ThreadStore::new());

        let task = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit_question(Some(&doc()), "q").await })
        };
        let err = task.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn reply_after_thread_reset_is_discarded() {
        let backend = Arc::new(MockBackend::gated());
        backend.push_answer(Ok(answer("stale", 0.9)));
        let dispatcher = dispatcher_with(Arc::clone(&backend));

        let pending = dispatcher.begin(Some(&doc()), "old document question").unwrap();
        let task = tokio::spawn(pending.complete());
        tokio::task::yield_now().await;

        dispatcher.thread().reset();
        backend.release(1);

        assert!(matches!(
            task.await.unwrap(),
            DispatchOutcome::Discarded { .. }
        ));
        assert!(dispatcher.thread().is_empty());
        assert_eq!(dispatcher.request_state(), RequestState::Idle);
    }
}
