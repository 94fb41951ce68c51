//! The document session: one active document, its conversation thread, and
//! its extraction result.
//!
//! [`DocumentSessionController`] is the only entry point that mutates shared
//! state. Uploads pass through [`FileAdmission`] before touching the network.

pub mod admission;
pub mod controller;
pub mod error;

pub use admission::{FileAdmission, ALLOWED_EXTENSIONS};
pub use controller::DocumentSessionController;
pub use error::{UploadError, UNSUPPORTED_FILE_MESSAGE, UPLOAD_FALLBACK_MESSAGE};
