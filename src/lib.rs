//! # resume-tailor
//!
//! Client-side coordinator for a résumé tailoring service: upload a `.docx`
//! résumé, tailor it to a job description, read the ATS compatibility
//! assessment, and download the tailored document in its original format.
//!
//! The language work (extraction, rewriting, scoring, document generation)
//! happens behind an HTTP API. This crate owns the part in between: the
//! ordering of the steps, their preconditions, the busy gate, and keeping
//! the session state consistent when a step fails.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx
//!  │
//!  ├─ 1. Upload    POST /api/upload-resume       → text + base64 original
//!  ├─ 2. (edit)    job description, any time
//!  ├─ 3. Tailor    POST /api/tailor-resume       → tailored text, ATS score,
//!  │                                               keywords, suggestions, id
//!  └─ 4. Download  GET  /api/download-resume/{id} → tailored_resume_<id8>.docx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_tailor::{ClientConfig, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL from RESUME_TAILOR_API_URL, default http://localhost:8001
//!     let config = ClientConfig::from_env()?;
//!     let mut session = Orchestrator::new(&config)?;
//!
//!     session.upload_path("resume.docx").await?;
//!     session.set_job_description("Senior Rust engineer, Kubernetes, gRPC");
//!     session.tailor().await?;
//!
//!     if let Some(result) = session.run().result() {
//!         println!("ATS score {} — {}", result.ats_score, result.band());
//!     }
//!     let saved = session.download().await?;
//!     println!("saved {}", saved.path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-tailor` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ErrorKind, Step, TailorError, ValidationError};
pub use orchestrator::Orchestrator;
pub use output::{AnalysisRecord, HealthStatus, SavedDocument, ScoreBand, TailorResult};
pub use pipeline::download::{DirectorySink, DocumentSink};
pub use pipeline::transcode::EncodedDocument;
pub use pipeline::upload::ResumeFile;
pub use progress::{NoopObserver, Observer, PipelineObserver};
pub use state::{AnalysisRun, BusyFlag, BusyGuard, PipelineState};
