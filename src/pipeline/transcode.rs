//! Binary ↔ text transcoding for the original document.
//!
//! The extraction collaborator returns the uploaded `.docx` as standard
//! base64 so it survives a multipart text field on the way back in the
//! Tailor request. The client treats the text as an opaque blob: it is
//! stored and re-sent verbatim, and only decoded when the caller explicitly
//! asks for the original bytes.

use crate::error::TailorError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Encode arbitrary bytes as standard (padded) base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Inverse of [`encode`].
pub fn decode(text: &str) -> Result<Vec<u8>, TailorError> {
    Ok(STANDARD.decode(text.as_bytes())?)
}

/// The original-formatting payload carried from Upload to Tailor.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedDocument(String);

impl EncodedDocument {
    /// Wrap text received from the collaborator, unchecked.
    pub fn from_encoded(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let text = encode(bytes);
        debug!("Encoded {} bytes → {} chars base64", bytes.len(), text.len());
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TailorError> {
        decode(&self.0)
    }
}

// Payloads run to hundreds of kilobytes; keep them out of debug logs.
impl fmt::Debug for EncodedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedDocument({} chars)", self.0.len())
    }
}
