//! Request contracts for the document-intelligence backend.
//!
//! Defines the wire types for the upload, ask, and extract endpoints, the
//! `InferenceBackend` trait the session flows are written against, an HTTP
//! implementation, and a scripted in-memory backend for tests and demos.

pub mod backend;
pub mod error;
pub mod http;
pub mod mock;
pub mod wire;

pub use backend::InferenceBackend;
pub use error::ClientError;
pub use http::HttpBackend;
pub use mock::{BackendCall, MockBackend};
pub use wire::{AskRequest, AskResponse, ExtractRequest, ExtractResponse, UploadResponse};
