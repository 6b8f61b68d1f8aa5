//! Pipeline steps for résumé tailoring.
//!
//! Each submodule implements exactly one step and knows nothing about the
//! others; sequencing, preconditions and state live in
//! [`crate::orchestrator`].
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ tailor ──▶ download
//!   │          ▲
//!   └─encoded──┘
//!    original
//! ```
//!
//! 1. [`upload`]    — send the `.docx`, get extracted text + base64 original
//! 2. [`transcode`] — base64 helpers for the original-formatting payload
//! 3. [`tailor`]    — send text, job description and original; get results
//! 4. [`download`]  — fetch the generated document and save it locally

pub mod download;
pub mod tailor;
pub mod transcode;
pub mod upload;
