//! Error types for the resume-tailor library.
//!
//! Every fallible operation returns [`TailorError`]. Errors fall into four
//! groups, reported by [`TailorError::kind`]:
//!
//! * **Validation** — detected on the client before any request is sent
//!   (wrong file type, missing inputs, no analysis to download). Each case
//!   has its own message so the user knows exactly what to fix.
//! * **Transport** — the collaborator answered with a non-success status or
//!   could not be reached at all.
//! * **Decode** — the collaborator answered, but the body does not have the
//!   expected shape. Shown to the user the same way as a transport failure.
//! * **Local** — reading the résumé or writing the downloaded document failed.
//!
//! None of these are fatal to the process: the orchestrator always returns to
//! an interactive state and the caller decides what to show.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The network-bearing steps of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Upload,
    Tailor,
    Download,
}

impl Step {
    /// Generic failure text for a step, as shown to the user.
    pub fn failure_message(self) -> &'static str {
        match self {
            Step::Upload => "Failed to upload resume",
            Step::Tailor => "Failed to tailor resume",
            Step::Download => "Failed to download resume",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Step::Upload => "uploading",
            Step::Tailor => "tailoring",
            Step::Download => "downloading",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Upload => "upload",
            Step::Tailor => "tailor",
            Step::Download => "download",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`TailorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Decode,
    Local,
}

/// Client-detected precondition failures. No request is made for any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The selected file does not carry the supported document suffix.
    #[error("Please upload a {} file only", .expected.to_uppercase())]
    UnsupportedFileType { file_name: String, expected: String },

    /// Tailor was requested without a résumé or without a job description.
    #[error("Please upload a resume and enter a job description")]
    MissingTailorInputs,

    /// A résumé is loaded but its original-formatting payload never arrived.
    #[error("Original resume formatting not available. Please re-upload your resume.")]
    MissingOriginalFormatting,

    /// Download was requested before any successful Tailor.
    #[error("No tailored resume available for download")]
    NoAnalysis,

    /// Another step is still in flight.
    #[error("Another {in_flight} is still in progress")]
    Busy { in_flight: Step },
}

/// All errors returned by the resume-tailor library.
#[derive(Debug, Error)]
pub enum TailorError {
    // ── Validation ────────────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ── Transport ─────────────────────────────────────────────────────────
    /// The collaborator answered with a non-success status.
    #[error("{} (HTTP {status})", .step.failure_message())]
    Status {
        step: Step,
        status: u16,
        body: String,
    },

    /// The request never produced a response (DNS, refused, timeout, …).
    #[error("{}: {source}", .step.failure_message())]
    Network {
        step: Step,
        #[source]
        source: reqwest::Error,
    },

    // ── Decode ────────────────────────────────────────────────────────────
    /// The response body did not match the expected shape.
    #[error("Malformed {step} response: {detail}")]
    Decode { step: Step, detail: String },

    /// Text handed to the transcoder was not valid base64.
    #[error("Encoded document is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    // ── Local I/O ─────────────────────────────────────────────────────────
    /// The résumé file could not be read.
    #[error("Failed to read resume '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The downloaded document could not be written.
    #[error("Failed to write document '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config ────────────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TailorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TailorError::Validation(_) | TailorError::InvalidConfig(_) => ErrorKind::Validation,
            TailorError::Status { .. } | TailorError::Network { .. } => ErrorKind::Transport,
            TailorError::Decode { .. } | TailorError::InvalidEncoding(_) => ErrorKind::Decode,
            TailorError::ReadFailed { .. }
            | TailorError::WriteFailed { .. }
            | TailorError::Internal(_) => ErrorKind::Local,
        }
    }

    /// The step this error was raised by, when it came from the network.
    pub fn step(&self) -> Option<Step> {
        match self {
            TailorError::Status { step, .. }
            | TailorError::Network { step, .. }
            | TailorError::Decode { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Message suitable for an alert or status line.
    ///
    /// Transport and decode failures collapse into the same step-specific
    /// text; the status code and body stay available on the error itself.
    pub fn user_message(&self) -> String {
        match self {
            TailorError::Validation(v) => v.to_string(),
            TailorError::Status { step, .. }
            | TailorError::Network { step, .. }
            | TailorError::Decode { step, .. } => {
                format!("Error {} resume: {}", step.verb(), step.failure_message())
            }
            other => other.to_string(),
        }
    }

    pub(crate) fn decode(step: Step, detail: impl Into<String>) -> Self {
        TailorError::Decode {
            step,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_distinct() {
        let missing = TailorError::from(ValidationError::MissingTailorInputs);
        let original = TailorError::from(ValidationError::MissingOriginalFormatting);
        assert_ne!(missing.user_message(), original.user_message());
        assert!(original.user_message().contains("re-upload"));
        assert!(missing.is_validation());
    }

    #[test]
    fn unsupported_file_type_names_the_format() {
        let e = ValidationError::UnsupportedFileType {
            file_name: "cv.pdf".into(),
            expected: "docx".into(),
        };
        assert_eq!(e.to_string(), "Please upload a DOCX file only");
    }

    #[test]
    fn status_and_decode_share_user_message() {
        let status = TailorError::Status {
            step: Step::Tailor,
            status: 500,
            body: "boom".into(),
        };
        let decode = TailorError::decode(Step::Tailor, "missing field `analysis_id`");
        assert_eq!(status.kind(), ErrorKind::Transport);
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert_eq!(status.user_message(), decode.user_message());
        assert_eq!(
            status.user_message(),
            "Error tailoring resume: Failed to tailor resume"
        );
        assert!(status.to_string().contains("500"));
    }

    #[test]
    fn step_is_reported_for_network_errors_only() {
        let decode = TailorError::decode(Step::Upload, "eof");
        assert_eq!(decode.step(), Some(Step::Upload));
        let config = TailorError::InvalidConfig("bad".into());
        assert_eq!(config.step(), None);
    }
}
