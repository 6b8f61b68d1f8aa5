//! Step sequencing, preconditions and the busy gate.
//!
//! [`Orchestrator`] owns the one [`AnalysisRun`] of a session and is the only
//! thing that mutates it. Every user action goes through one of its methods:
//!
//! ```text
//!             upload ok                  tailor ok
//!   Idle ───────────────▶ ReadyToTailor ───────────▶ ReadyToDownload ─┐
//!    ▲  (Uploading)        ▲  │ (Tailoring)              │  ▲         │ download
//!    └── upload failed ────┘  └──── upload ok ───────────┘  └─────────┘ (no transition)
//! ```
//!
//! ## Guarantees
//!
//! * Validation happens before any request is built; a rejected action
//!   sends nothing and changes nothing.
//! * The busy flag is held by a guard for the duration of the network call
//!   and released on every exit path, including the step future being
//!   dropped before it completes.
//! * State is written only after a response has been fully received and
//!   decoded, so a failed or cancelled step leaves the previous state intact.

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{Step, TailorError, ValidationError};
use crate::output::SavedDocument;
use crate::pipeline::download::{self, DirectorySink, DocumentSink};
use crate::pipeline::tailor::{self, TailorRequest};
use crate::pipeline::upload::{self, ResumeFile};
use crate::progress::Observer;
use crate::state::{AnalysisRun, BusyFlag, BusyGuard, PipelineState};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinates Upload → Tailor → Download for one session.
pub struct Orchestrator {
    client: ApiClient,
    run: AnalysisRun,
    busy: BusyFlag,
    sink: Arc<dyn DocumentSink>,
    extension: String,
    observer: Option<Observer>,
}

impl Orchestrator {
    /// Build an orchestrator with an empty run and a [`DirectorySink`] over
    /// `config.download_dir`.
    pub fn new(config: &ClientConfig) -> Result<Self, TailorError> {
        Ok(Self {
            client: ApiClient::new(config)?,
            run: AnalysisRun::new(),
            busy: BusyFlag::new(),
            sink: Arc::new(DirectorySink::new(config.download_dir.clone())),
            extension: config.document_extension.clone(),
            observer: config.observer.clone(),
        })
    }

    /// Replace where downloaded documents are delivered.
    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn run(&self) -> &AnalysisRun {
        &self.run
    }

    pub fn state(&self) -> PipelineState {
        self.run.state(self.busy.in_flight())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// A handle a UI can poll to disable its triggers while a step runs.
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// Whether the Tailor trigger should be enabled.
    pub fn can_tailor(&self) -> bool {
        !self.is_busy()
            && !self.run.resume_text().trim().is_empty()
            && !self.run.job_description().trim().is_empty()
    }

    /// Whether the Download trigger should be enabled.
    pub fn can_download(&self) -> bool {
        !self.is_busy() && self.run.analysis_id().is_some()
    }

    /// Replace the job description. Allowed in every state; never transitions.
    pub fn set_job_description(&mut self, text: impl Into<String>) {
        self.run.set_job_description(text.into());
        if self.run.is_stale() {
            debug!("Job description edited after tailoring; current results are stale");
        }
    }

    /// Read `path` from disk and upload it.
    ///
    /// The suffix is checked before the file is read.
    pub async fn upload_path(&mut self, path: impl AsRef<Path>) -> Result<(), TailorError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !upload::is_supported(&name, &self.extension) {
            return Err(self.reject(
                Step::Upload,
                ValidationError::UnsupportedFileType {
                    file_name: name,
                    expected: self.extension.clone(),
                },
            ));
        }
        let file = ResumeFile::open(path)
            .await
            .map_err(|e| self.reject(Step::Upload, e))?;
        self.upload(file).await
    }

    /// Upload a selected document.
    ///
    /// On success the résumé text, encoded original and file name are
    /// replaced and any previous analysis is discarded. On failure the run
    /// is untouched.
    pub async fn upload(&mut self, file: ResumeFile) -> Result<(), TailorError> {
        file.check_supported(&self.extension)
            .map_err(|e| self.reject(Step::Upload, e))?;

        let guard = self.begin(Step::Upload)?;
        let outcome = upload::upload(&self.client, &file)
            .await
            .map(|uploaded| self.run.apply_upload(uploaded));
        self.finish(guard, &outcome);
        outcome
    }

    /// Tailor the uploaded résumé to the current job description.
    ///
    /// Preconditions, checked in this order without touching the network:
    /// résumé text and job description present (after trimming), then the
    /// original-formatting payload present. Each has its own error.
    pub async fn tailor(&mut self) -> Result<(), TailorError> {
        let request = self
            .tailor_request()
            .map_err(|e| self.reject(Step::Tailor, e))?;

        let guard = self.begin(Step::Tailor)?;
        let outcome = tailor::tailor(&self.client, request).await;
        let outcome = outcome.map(|tailored| self.run.apply_tailor(tailored));
        self.finish(guard, &outcome);
        outcome
    }

    /// Fetch the tailored document for the current analysis and save it.
    ///
    /// Never changes the run.
    pub async fn download(&self) -> Result<SavedDocument, TailorError> {
        let Some(analysis_id) = self.run.analysis_id() else {
            return Err(self.reject(Step::Download, ValidationError::NoAnalysis));
        };
        if self.run.is_stale() {
            warn!(
                "Downloading analysis {} produced for an earlier job description",
                analysis_id
            );
        }

        let guard = self.begin(Step::Download)?;
        let outcome = match download::download(&self.client, analysis_id).await {
            Ok(bytes) => {
                let file_name = download::file_name_for(analysis_id, &self.extension);
                self.sink.save(&file_name, &bytes)
            }
            Err(e) => Err(e),
        };
        self.finish(guard, &outcome);
        outcome
    }

    fn tailor_request(&self) -> Result<TailorRequest<'_>, ValidationError> {
        let run = &self.run;
        if run.resume_text().trim().is_empty() || run.job_description().trim().is_empty() {
            return Err(ValidationError::MissingTailorInputs);
        }
        if run.original().is_empty() {
            return Err(ValidationError::MissingOriginalFormatting);
        }
        Ok(TailorRequest {
            resume_text: run.resume_text(),
            job_description: run.job_description(),
            original: run.original(),
        })
    }

    /// Claim the busy flag and announce the step.
    fn begin(&self, step: Step) -> Result<StepGuard, TailorError> {
        let before = self.state();
        let busy = self
            .busy
            .try_acquire(step)
            .map_err(|e| self.reject(step, e))?;
        let during = self.state();

        debug!("{} started ({} → {})", step, before, during);
        if let Some(obs) = &self.observer {
            obs.on_step_start(step);
            if before != during {
                obs.on_state_change(before, during);
            }
        }
        Ok(StepGuard {
            busy: Some(busy),
            step,
            before,
            during,
            observer: self.observer.clone(),
        })
    }

    /// Release the busy flag, then report the outcome.
    fn finish<T>(&self, guard: StepGuard, outcome: &Result<T, TailorError>) {
        let step = guard.step;
        let during = guard.complete();
        let after = self.state();

        match outcome {
            Ok(_) => info!("{} finished, now {}", step, after),
            Err(e) => warn!("{} failed, back to {}: {}", step, after, e),
        }
        if let Some(obs) = &self.observer {
            if during != after {
                obs.on_state_change(during, after);
            }
            match outcome {
                Ok(_) => obs.on_step_complete(step),
                Err(e) => obs.on_step_error(step, &e.user_message()),
            }
        }
    }

    /// Log and report an error raised before the step's request was sent.
    fn reject(&self, step: Step, err: impl Into<TailorError>) -> TailorError {
        let err = err.into();
        warn!("{} rejected: {}", step, err);
        if let Some(obs) = &self.observer {
            obs.on_step_error(step, &err.user_message());
        }
        err
    }
}

/// Busy flag plus observer bookkeeping for one in-flight step.
///
/// Dropped without [`StepGuard::complete`] means the step future was
/// cancelled. The flag is released, then the observer gets the state change
/// back and an error event.
struct StepGuard {
    busy: Option<BusyGuard>,
    step: Step,
    before: PipelineState,
    during: PipelineState,
    observer: Option<Observer>,
}

impl StepGuard {
    /// Release the flag without the cancellation events. Returns the state
    /// the step ran in.
    fn complete(mut self) -> PipelineState {
        self.busy = None;
        self.during
    }
}

impl Drop for StepGuard {
    fn drop(&mut self) {
        // Already released by `complete`.
        if self.busy.take().is_none() {
            return;
        }
        warn!("{} cancelled, back to {}", self.step, self.before);
        if let Some(obs) = &self.observer {
            if self.during != self.before {
                obs.on_state_change(self.during, self.before);
            }
            obs.on_step_error(self.step, &format!("{} cancelled", self.step));
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("base_url", &self.client.base_url())
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .field("run", &self.run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::transcode::EncodedDocument;
    use crate::pipeline::upload::UploadedResume;

    // Nothing listens on port 9; any request that slips through fails as a
    // transport error rather than a validation error.
    fn orchestrator() -> Orchestrator {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        Orchestrator::new(&config).unwrap()
    }

    fn loaded(original: &str) -> Orchestrator {
        let mut orch = orchestrator();
        orch.run.apply_upload(UploadedResume {
            file_name: "resume.docx".into(),
            text: "Jane Doe".into(),
            original: EncodedDocument::from_encoded(original),
        });
        orch
    }

    #[tokio::test]
    async fn wrong_suffix_is_rejected_without_state_change() {
        let mut orch = orchestrator();
        let err = orch
            .upload(ResumeFile::new("resume.pdf", b"%PDF".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TailorError::Validation(ValidationError::UnsupportedFileType { .. })
        ));
        assert_eq!(orch.state(), PipelineState::Idle);
        assert_eq!(orch.run(), &AnalysisRun::new());
    }

    #[tokio::test]
    async fn upload_path_checks_suffix_before_reading() {
        let mut orch = orchestrator();
        let err = orch.upload_path("/no/such/dir/resume.txt").await.unwrap_err();
        assert!(err.is_validation(), "{err}");
    }

    #[tokio::test]
    async fn tailor_preconditions_are_distinct() {
        let mut orch = loaded("UEsDBBQ=");
        orch.set_job_description("   \n\t");
        let blank = orch.tailor().await.unwrap_err();
        assert!(matches!(
            blank,
            TailorError::Validation(ValidationError::MissingTailorInputs)
        ));

        let mut orch = loaded("");
        orch.set_job_description("Rust engineer");
        let missing = orch.tailor().await.unwrap_err();
        assert!(matches!(
            missing,
            TailorError::Validation(ValidationError::MissingOriginalFormatting)
        ));
        assert_ne!(blank.user_message(), missing.user_message());
        assert!(!orch.is_busy());
    }

    #[tokio::test]
    async fn download_without_analysis_is_rejected() {
        let orch = loaded("UEsDBBQ=");
        let err = orch.download().await.unwrap_err();
        assert!(matches!(
            err,
            TailorError::Validation(ValidationError::NoAnalysis)
        ));
    }

    #[tokio::test]
    async fn busy_orchestrator_refuses_new_steps() {
        let mut orch = loaded("UEsDBBQ=");
        orch.set_job_description("Rust engineer");
        let held = orch.busy_flag().try_acquire(Step::Upload).unwrap();

        let err = orch.tailor().await.unwrap_err();
        assert!(matches!(
            err,
            TailorError::Validation(ValidationError::Busy { in_flight: Step::Upload })
        ));
        assert_eq!(orch.state(), PipelineState::Uploading);
        assert!(!orch.can_tailor());

        drop(held);
        assert!(orch.can_tailor());
    }

    #[tokio::test]
    async fn transport_failure_releases_busy_and_keeps_state() {
        let mut orch = loaded("UEsDBBQ=");
        orch.set_job_description("Rust engineer");
        let before = orch.run().clone();

        let err = orch.tailor().await.unwrap_err();
        assert_eq!(err.step(), Some(Step::Tailor));
        assert!(!orch.is_busy());
        assert_eq!(orch.run(), &before);
        assert_eq!(orch.state(), PipelineState::ReadyToTailor);
    }
}
