//! Document session controller.
//!
//! Owns the active document, the view selector, the question draft and the
//! inline upload error, and wires the conversation and extraction flows to
//! the active document id. A successful upload replaces the session
//! atomically and clears the thread; the extraction result survives a
//! document swap.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use docintel_chat::{DispatchOutcome, QueryDispatcher, ThreadStore, TurnPair};
use docintel_client::{InferenceBackend, UploadResponse};
use docintel_core::flight::{RequestState, SingleFlight};
use docintel_core::types::{
    ActiveView, ClientFileInfo, DocumentId, DocumentMetadata, DocumentSession,
};
use docintel_extract::{ExtractionFlow, ExtractionOutcome, ExtractionState};

use crate::admission::FileAdmission;
use crate::error::UploadError;

#[derive(Debug, Default)]
struct SessionState {
    session: Option<DocumentSession>,
    view: ActiveView,
    draft: String,
    upload_error: Option<String>,
}

/// Entry point for every user action against the active document.
#[derive(Clone)]
pub struct DocumentSessionController {
    backend: Arc<dyn InferenceBackend>,
    state: Arc<Mutex<SessionState>>,
    dispatcher: QueryDispatcher,
    extraction: ExtractionFlow,
    upload_flight: SingleFlight,
}

impl DocumentSessionController {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        let thread = ThreadStore::new();
        Self {
            dispatcher: QueryDispatcher::new(Arc::clone(&backend), thread),
            extraction: ExtractionFlow::new(Arc::clone(&backend)),
            backend,
            state: Arc::new(Mutex::new(SessionState::default())),
            upload_flight: SingleFlight::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ---- Upload ----

    /// Install the document described by `response` as the active session.
    ///
    /// Clears the conversation thread and switches to the conversation view.
    /// The extraction state is left as it was.
    pub fn on_upload_succeeded(
        &self,
        response: UploadResponse,
        file_info: ClientFileInfo,
    ) -> DocumentSession {
        let session = DocumentSession {
            document_id: response.document_id,
            metadata: DocumentMetadata {
                filename: response.filename,
                size_bytes: file_info.size_bytes,
                file_extension: file_info.file_extension,
                uploaded_at: file_info.uploaded_at,
                chunk_count: response.num_chunks,
            },
            suggested_questions: response.suggested_questions,
        };

        self.dispatcher.thread().reset();
        {
            let mut state = self.state();
            state.session = Some(session.clone());
            state.view = ActiveView::Conversation;
        }

        tracing::info!(
            document_id = %session.document_id,
            filename = %session.metadata.filename,
            chunks = session.metadata.chunk_count,
            suggestions = session.suggested_questions.len(),
            "Document session started"
        );
        session
    }

    /// Admit, upload, and install a document from memory.
    ///
    /// On failure the current session is untouched and the message is kept
    /// as the inline upload error until the next attempt.
    pub async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentSession, UploadError> {
        FileAdmission::admit(file_name).map_err(|err| self.record_upload_error(err))?;

        let Some(_permit) = self.upload_flight.try_acquire() else {
            tracing::debug!(file_name, "Upload ignored: another upload is in progress");
            return Err(UploadError::Busy);
        };
        self.state().upload_error = None;

        let file_info = ClientFileInfo::observe(file_name, bytes.len() as u64);
        tracing::info!(file_name, size_bytes = file_info.size_bytes, "Uploading document");

        match self.backend.upload(file_name, bytes).await {
            Ok(response) => Ok(self.on_upload_succeeded(response, file_info)),
            Err(err) => {
                tracing::warn!(file_name, error = %err, "Upload failed");
                Err(self.record_upload_error(err.into()))
            }
        }
    }

    /// Read `path` and upload it under its file name.
    ///
    /// The file type is checked before the file is read.
    pub async fn upload_path(&self, path: &Path) -> Result<DocumentSession, UploadError> {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return Err(self.record_upload_error(UploadError::NoFileName));
        };
        FileAdmission::admit(file_name).map_err(|err| self.record_upload_error(err))?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| self.record_upload_error(err.into()))?;
        self.upload_document(file_name, bytes).await
    }

    fn record_upload_error(&self, err: UploadError) -> UploadError {
        self.state().upload_error = Some(err.user_message());
        err
    }

    pub fn upload_error(&self) -> Option<String> {
        self.state().upload_error.clone()
    }

    pub fn upload_state(&self) -> RequestState {
        self.upload_flight.state()
    }

    // ---- Session ----

    pub fn session(&self) -> Option<DocumentSession> {
        self.state().session.clone()
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.state()
            .session
            .as_ref()
            .map(|session| session.document_id.clone())
    }

    /// Starter prompts for the active document. Empty without a document.
    pub fn suggested_questions(&self) -> Vec<String> {
        self.state()
            .session
            .as_ref()
            .map(|session| session.suggested_questions.clone())
            .unwrap_or_default()
    }

    pub fn active_view(&self) -> ActiveView {
        self.state().view
    }

    pub fn set_view(&self, view: ActiveView) {
        self.state().view = view;
    }

    // ---- Conversation ----

    pub fn thread(&self) -> &ThreadStore {
        self.dispatcher.thread()
    }

    pub fn pairs(&self) -> Vec<TurnPair> {
        self.dispatcher.thread().pairs()
    }

    pub fn ask_state(&self) -> RequestState {
        self.dispatcher.request_state()
    }

    pub fn draft(&self) -> String {
        self.state().draft.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.state().draft = text.into();
    }

    /// Ask `question` about the active document.
    pub async fn submit_question(&self, question: &str) -> DispatchOutcome {
        let document_id = self.document_id();
        self.dispatcher
            .submit_question(document_id.as_ref(), question)
            .await
    }

    /// Ask the current draft. The draft is cleared as soon as the question
    /// is accepted, before the answer arrives. A skipped submission keeps it.
    pub async fn submit_draft(&self) -> DispatchOutcome {
        let document_id = self.document_id();
        let draft = self.draft();

        let pending = match self.dispatcher.begin(document_id.as_ref(), &draft) {
            Ok(pending) => pending,
            Err(reason) => return DispatchOutcome::Skipped(reason),
        };
        self.state().draft.clear();
        pending.complete().await
    }

    /// Ask the suggested question at `index`. The draft is left alone.
    ///
    /// Returns `None` when there is no suggestion at that position.
    pub async fn ask_suggestion(&self, index: usize) -> Option<DispatchOutcome> {
        let suggestion = self.suggested_questions().get(index).cloned();
        let Some(question) = suggestion else {
            tracing::debug!(index, "No suggested question at index");
            return None;
        };
        Some(self.submit_question(&question).await)
    }

    // ---- Extraction ----

    pub async fn run_extraction(&self) -> ExtractionOutcome {
        let document_id = self.document_id();
        self.extraction.run_extraction(document_id.as_ref()).await
    }

    pub fn extraction_state(&self) -> ExtractionState {
        self.extraction.state()
    }

    pub fn extraction_request_state(&self) -> RequestState {
        self.extraction.request_state()
    }
}

// =============================================================================
// Tests
// =============================================================================
