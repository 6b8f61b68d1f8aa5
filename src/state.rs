//! Pipeline state store.
//!
//! [`AnalysisRun`] is the single piece of mutable workflow state. It is
//! owned by one [`crate::orchestrator::Orchestrator`] and only changed at step
//! completion boundaries, through the `apply_*` methods below, each of which
//! replaces everything it touches in one assignment.
//!
//! The busy gate is kept apart in [`BusyFlag`] so a UI task can watch it
//! through a cloned handle while the orchestrator is mid-step.

use crate::error::{Step, TailorError, ValidationError};
use crate::output::TailorResult;
use crate::pipeline::tailor::TailoredResume;
use crate::pipeline::transcode::EncodedDocument;
use crate::pipeline::upload::UploadedResume;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Where the workflow stands, derived from an [`AnalysisRun`] plus the step
/// in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing uploaded yet.
    Idle,
    Uploading,
    /// Résumé text is loaded; no analysis yet.
    ReadyToTailor,
    Tailoring,
    /// An analysis id is available for download.
    ReadyToDownload,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Uploading => "uploading",
            PipelineState::ReadyToTailor => "ready to tailor",
            PipelineState::Tailoring => "tailoring",
            PipelineState::ReadyToDownload => "ready to download",
        };
        f.write_str(s)
    }
}

/// A completed Tailor call and the job description it answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Analysis {
    id: String,
    result: TailorResult,
    job_description: String,
}

/// The unit of work for one tailoring session.
///
/// Starts empty, is filled by Upload and Tailor, and is reset by every new
/// Upload. The analysis id and the results share one `Option`, so one can
/// never be present without the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisRun {
    resume_text: String,
    #[serde(skip)]
    original: EncodedDocument,
    job_description: String,
    uploaded_file_name: Option<String>,
    analysis: Option<Analysis>,
}

impl AnalysisRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn has_resume(&self) -> bool {
        !self.resume_text.is_empty()
    }

    /// The encoded original as received from the extraction collaborator.
    pub fn original(&self) -> &EncodedDocument {
        &self.original
    }

    /// Decode the cached original document, if one was captured.
    pub fn original_document(&self) -> Result<Option<Vec<u8>>, TailorError> {
        if self.original.is_empty() {
            return Ok(None);
        }
        self.original.to_bytes().map(Some)
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn uploaded_file_name(&self) -> Option<&str> {
        self.uploaded_file_name.as_deref()
    }

    pub fn analysis_id(&self) -> Option<&str> {
        self.analysis.as_ref().map(|a| a.id.as_str())
    }

    pub fn result(&self) -> Option<&TailorResult> {
        self.analysis.as_ref().map(|a| &a.result)
    }

    /// ATS score of the current result; `None` while no Tailor has succeeded.
    pub fn score(&self) -> Option<u8> {
        self.result().map(|r| r.ats_score)
    }

    /// `true` when the job description was edited after the current result
    /// was produced.
    pub fn is_stale(&self) -> bool {
        self.analysis
            .as_ref()
            .is_some_and(|a| a.job_description.trim() != self.job_description.trim())
    }

    pub fn state(&self, in_flight: Option<Step>) -> PipelineState {
        match in_flight {
            Some(Step::Upload) => PipelineState::Uploading,
            Some(Step::Tailor) => PipelineState::Tailoring,
            Some(Step::Download) | None => {
                if self.analysis.is_some() {
                    PipelineState::ReadyToDownload
                } else if self.has_resume() {
                    PipelineState::ReadyToTailor
                } else {
                    PipelineState::Idle
                }
            }
        }
    }

    pub(crate) fn set_job_description(&mut self, text: String) {
        self.job_description = text;
    }

    /// A new source document supersedes everything derived from the old one.
    pub(crate) fn apply_upload(&mut self, uploaded: UploadedResume) {
        self.resume_text = uploaded.text;
        self.original = uploaded.original;
        self.uploaded_file_name = Some(uploaded.file_name);
        self.analysis = None;
    }

    pub(crate) fn apply_tailor(&mut self, tailored: TailoredResume) {
        self.analysis = Some(Analysis {
            id: tailored.analysis_id,
            result: tailored.result,
            job_description: self.job_description.clone(),
        });
    }
}

const IDLE: u8 = 0;

fn step_code(step: Step) -> u8 {
    match step {
        Step::Upload => 1,
        Step::Tailor => 2,
        Step::Download => 3,
    }
}

fn code_step(code: u8) -> Option<Step> {
    match code {
        1 => Some(Step::Upload),
        2 => Some(Step::Tailor),
        3 => Some(Step::Download),
        _ => None,
    }
}

/// Shared "a step is in flight" flag.
///
/// Clones observe the same flag. Only [`BusyFlag::try_acquire`] sets it and
/// only dropping the returned [`BusyGuard`] clears it.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    inner: Arc<AtomicU8>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.load(Ordering::Acquire) != IDLE
    }

    pub fn in_flight(&self) -> Option<Step> {
        code_step(self.inner.load(Ordering::Acquire))
    }

    /// Claim the flag for `step`, or report which step already holds it.
    pub fn try_acquire(&self, step: Step) -> Result<BusyGuard, ValidationError> {
        self.inner
            .compare_exchange(IDLE, step_code(step), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard {
                flag: Arc::clone(&self.inner),
            })
            .map_err(|held| ValidationError::Busy {
                in_flight: code_step(held).unwrap_or(step),
            })
    }
}

/// Holds the busy flag until dropped.
#[derive(Debug)]
#[must_use = "the busy flag is released as soon as the guard is dropped"]
pub struct BusyGuard {
    flag: Arc<AtomicU8>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(IDLE, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded(name: &str) -> UploadedResume {
        UploadedResume {
            file_name: name.into(),
            text: "Jane Doe\nRust engineer".into(),
            original: EncodedDocument::from_bytes(b"PK\x03\x04"),
        }
    }

    fn tailored(id: &str, score: u8) -> TailoredResume {
        TailoredResume {
            analysis_id: id.into(),
            result: TailorResult {
                tailored_text: "Jane Doe — tailored".into(),
                ats_score: score,
                suggestions: vec!["Add metrics".into()],
                matched_keywords: vec!["Rust".into()],
                missing_keywords: vec!["Kubernetes".into()],
            },
        }
    }

    #[test]
    fn fresh_run_is_idle_with_unset_score() {
        let run = AnalysisRun::new();
        assert_eq!(run.state(None), PipelineState::Idle);
        assert_eq!(run.score(), None);
        assert_eq!(run.analysis_id(), None);
        assert!(run.original_document().unwrap().is_none());
    }

    #[test]
    fn upload_then_tailor_walks_the_states() {
        let mut run = AnalysisRun::new();
        run.apply_upload(uploaded("resume.docx"));
        assert_eq!(run.state(None), PipelineState::ReadyToTailor);
        assert_eq!(run.uploaded_file_name(), Some("resume.docx"));
        assert_eq!(run.original_document().unwrap().unwrap(), b"PK\x03\x04");

        run.set_job_description("Rust engineer".into());
        run.apply_tailor(tailored("abc12345-xxxx", 85));
        assert_eq!(run.state(None), PipelineState::ReadyToDownload);
        assert_eq!(run.state(Some(Step::Download)), PipelineState::ReadyToDownload);
        assert_eq!(run.state(Some(Step::Tailor)), PipelineState::Tailoring);
        assert_eq!(run.score(), Some(85));
    }

    #[test]
    fn new_upload_clears_previous_analysis() {
        let mut run = AnalysisRun::new();
        run.apply_upload(uploaded("first.docx"));
        run.set_job_description("Rust engineer".into());
        run.apply_tailor(tailored("abc", 70));

        run.apply_upload(uploaded("second.docx"));
        assert_eq!(run.analysis_id(), None);
        assert_eq!(run.result(), None);
        assert_eq!(run.score(), None);
        assert_eq!(run.uploaded_file_name(), Some("second.docx"));
        // The job description belongs to the user, not to the document.
        assert_eq!(run.job_description(), "Rust engineer");
    }

    #[test]
    fn editing_job_description_marks_results_stale_without_clearing() {
        let mut run = AnalysisRun::new();
        run.apply_upload(uploaded("resume.docx"));
        run.set_job_description("Rust engineer".into());
        run.apply_tailor(tailored("abc", 70));
        assert!(!run.is_stale());

        run.set_job_description("Rust engineer  ".into());
        assert!(!run.is_stale(), "whitespace-only edits are not stale");

        run.set_job_description("Go engineer".into());
        assert!(run.is_stale());
        assert_eq!(run.analysis_id(), Some("abc"));
        assert_eq!(run.state(None), PipelineState::ReadyToDownload);
    }

    #[test]
    fn busy_flag_is_exclusive_and_released_on_drop() {
        let flag = BusyFlag::new();
        let observer = flag.clone();
        {
            let _guard = flag.try_acquire(Step::Upload).unwrap();
            assert!(observer.is_busy());
            assert_eq!(observer.in_flight(), Some(Step::Upload));
            let err = flag.try_acquire(Step::Tailor).unwrap_err();
            assert_eq!(err, ValidationError::Busy { in_flight: Step::Upload });
        }
        assert!(!observer.is_busy());
        assert_eq!(observer.in_flight(), None);
        assert!(flag.try_acquire(Step::Tailor).is_ok());
    }
}
