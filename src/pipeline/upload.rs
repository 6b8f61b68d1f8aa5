//! Upload step: send the résumé document, receive its text and the encoded
//! original.
//!
//! The suffix check here is advisory. It saves a round trip for the obvious
//! mistake (picking a PDF), but the extraction collaborator remains the
//! authority on whether the bytes really are a valid document.

use crate::client::ApiClient;
use crate::error::{Step, TailorError, ValidationError};
use crate::pipeline::transcode::EncodedDocument;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

const UPLOAD_ENDPOINT: &str = "/api/upload-resume";

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A document selected by the user, read into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeFile")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming it after the last path component.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TailorError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TailorError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read résumé {} ({} bytes)", file_name, bytes.len());
        Ok(Self { file_name, bytes })
    }

    /// Reject names that do not end in `.{extension}`.
    ///
    /// Matching is case-sensitive, the same rule the extraction endpoint
    /// applies.
    pub fn check_supported(&self, extension: &str) -> Result<(), ValidationError> {
        if is_supported(&self.file_name, extension) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedFileType {
                file_name: self.file_name.clone(),
                expected: extension.to_string(),
            })
        }
    }
}

/// `true` when `file_name` carries the `.{extension}` suffix and something before it.
pub fn is_supported(file_name: &str, extension: &str) -> bool {
    file_name
        .strip_suffix(extension)
        .and_then(|stem| stem.strip_suffix('.'))
        .is_some_and(|stem| !stem.is_empty())
}

/// What a successful upload hands back to the state store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedResume {
    pub file_name: String,
    pub text: String,
    pub original: EncodedDocument,
}

#[derive(Deserialize)]
struct UploadResponse {
    text: String,
    // Older extraction services omit the payload; an empty value is caught
    // later by the Tailor precondition check instead of failing the upload.
    #[serde(default)]
    docx_content: String,
}

/// `POST /api/upload-resume` with the document as multipart field `file`.
pub async fn upload(client: &ApiClient, file: &ResumeFile) -> Result<UploadedResume, TailorError> {
    info!("Uploading résumé: {}", file.file_name);

    let part = Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(DOCX_MIME)
        .map_err(|e| TailorError::Internal(format!("multipart mime: {e}")))?;
    let form = Form::new().part("file", part);

    let request = client.http().post(client.url(UPLOAD_ENDPOINT)).multipart(form);
    let response = client.send(Step::Upload, request).await?;
    let body: UploadResponse = client.read_json(Step::Upload, response).await?;

    if body.docx_content.is_empty() {
        warn!(
            "Upload of {} returned no original-formatting payload",
            file.file_name
        );
    }
    debug!(
        "Extracted {} chars of text, {} chars of encoded original",
        body.text.len(),
        body.docx_content.len()
    );

    Ok(UploadedResume {
        file_name: file.file_name.clone(),
        text: body.text,
        original: EncodedDocument::from_encoded(body.docx_content),
    })
}
