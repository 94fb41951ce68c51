//! Local file-type gate applied before any upload request.

use crate::error::UploadError;

/// Accepted extensions, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

pub struct FileAdmission;

impl FileAdmission {
    /// Accept `file_name` if its extension is one of [`ALLOWED_EXTENSIONS`].
    ///
    /// A name without a dot has no extension and is rejected.
    pub fn admit(file_name: &str) -> Result<(), UploadError> {
        if file_name.trim().is_empty() {
            return Err(UploadError::NoFileName);
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(())
        } else {
            tracing::debug!(file_name, extension = %extension, "File rejected by type");
            Err(UploadError::UnsupportedType { extension })
        }
    }
}
