//! Result types produced by the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Everything a successful Tailor call yields, apart from the analysis id.
///
/// Always replaced as a whole; a run never holds a mix of two results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailorResult {
    pub tailored_text: String,
    /// ATS compatibility, 0–100.
    pub ats_score: u8,
    /// Improvement suggestions in server order.
    pub suggestions: Vec<String>,
    /// Job keywords found in the résumé, de-duplicated in first-seen order.
    pub matched_keywords: Vec<String>,
    /// Job keywords absent from the résumé, de-duplicated in first-seen order.
    pub missing_keywords: Vec<String>,
}

impl TailorResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.ats_score)
    }
}

/// Qualitative bucket for an ATS score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// 80 and above.
    Excellent,
    /// 60–79.
    Good,
    /// Below 60.
    NeedsImprovement,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => ScoreBand::Excellent,
            60..=79 => ScoreBand::Good,
            _ => ScoreBand::NeedsImprovement,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent Match!",
            ScoreBand::Good => "Good Match",
            ScoreBand::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A tailored document written to disk by the Download step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes_written: u64,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// One stored analysis as listed by `GET /api/analyses`.
///
/// The server owns these records; unknown fields are ignored and missing
/// optional ones default so older records still list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    #[serde(default)]
    pub job_description: String,
    /// Stored as the model returned it; not guaranteed to be within 0–100.
    #[serde(default)]
    pub ats_score: i64,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl AnalysisRecord {
    /// First line of the job description, cut to `max_chars`.
    pub fn headline(&self, max_chars: usize) -> String {
        let first = self.job_description.lines().next().unwrap_or("").trim();
        if first.chars().count() <= max_chars {
            first.to_string()
        } else {
            let cut: String = first.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{cut}\u{2026}")
        }
    }
}
