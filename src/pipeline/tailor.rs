//! Tailor step: résumé text + job description + encoded original in,
//! tailored text, ATS assessment and an analysis id out.

use crate::client::ApiClient;
use crate::error::{Step, TailorError};
use crate::output::TailorResult;
use crate::pipeline::transcode::EncodedDocument;
use reqwest::multipart::Form;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

const TAILOR_ENDPOINT: &str = "/api/tailor-resume";

/// Borrowed inputs for one Tailor call.
#[derive(Debug, Clone, Copy)]
pub struct TailorRequest<'a> {
    pub resume_text: &'a str,
    pub job_description: &'a str,
    pub original: &'a EncodedDocument,
}

impl TailorRequest<'_> {
    fn into_form(self) -> Form {
        Form::new()
            .text("resume_text", self.resume_text.to_string())
            .text("job_description", self.job_description.to_string())
            .text("original_docx_content", self.original.as_str().to_string())
    }
}

/// A fully validated Tailor response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailoredResume {
    pub analysis_id: String,
    pub result: TailorResult,
}

#[derive(Deserialize)]
struct TailorResponse {
    tailored_resume: String,
    ats_score: i64,
    suggestions: Vec<String>,
    keyword_matches: Vec<String>,
    missing_keywords: Vec<String>,
    analysis_id: String,
}

impl TryFrom<TailorResponse> for TailoredResume {
    type Error = TailorError;

    fn try_from(r: TailorResponse) -> Result<Self, Self::Error> {
        let ats_score = u8::try_from(r.ats_score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| {
                TailorError::decode(Step::Tailor, format!("ats_score {} is outside 0–100", r.ats_score))
            })?;
        if r.analysis_id.trim().is_empty() {
            return Err(TailorError::decode(Step::Tailor, "empty analysis_id"));
        }
        if r.tailored_resume.is_empty() {
            return Err(TailorError::decode(Step::Tailor, "empty tailored_resume"));
        }

        Ok(TailoredResume {
            analysis_id: r.analysis_id,
            result: TailorResult {
                tailored_text: r.tailored_resume,
                ats_score,
                suggestions: r.suggestions,
                matched_keywords: dedup_keywords(r.keyword_matches),
                missing_keywords: dedup_keywords(r.missing_keywords),
            },
        })
    }
}

/// Drop repeated keywords, keeping the first occurrence in place.
fn dedup_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(keywords.len());
    keywords
        .into_iter()
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// `POST /api/tailor-resume` as a multipart form.
pub async fn tailor(
    client: &ApiClient,
    request: TailorRequest<'_>,
) -> Result<TailoredResume, TailorError> {
    info!(
        "Tailoring résumé ({} chars) against job description ({} chars)",
        request.resume_text.len(),
        request.job_description.len()
    );
    debug!("Original-formatting payload: {:?}", request.original);

    let http_request = client
        .http()
        .post(client.url(TAILOR_ENDPOINT))
        .multipart(request.into_form());
    let response = client.send(Step::Tailor, http_request).await?;
    let body: TailorResponse = client.read_json(Step::Tailor, response).await?;
    let tailored = TailoredResume::try_from(body)?;

    info!(
        "Tailored: ATS score {}, {} matched / {} missing keywords, {} suggestions",
        tailored.result.ats_score,
        tailored.result.matched_keywords.len(),
        tailored.result.missing_keywords.len(),
        tailored.result.suggestions.len()
    );
    Ok(tailored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(score: i64, id: &str) -> TailorResponse {
        TailorResponse {
            tailored_resume: "Jane Doe — Rust engineer".into(),
            ats_score: score,
            suggestions: vec!["Add metrics".into()],
            keyword_matches: vec!["Python".into(), "Rust".into(), "Python".into()],
            missing_keywords: vec!["Kubernetes".into()],
            analysis_id: id.into(),
        }
    }

    #[test]
    fn converts_valid_response() {
        let t = TailoredResume::try_from(response(85, "abc123")).unwrap();
        assert_eq!(t.analysis_id, "abc123");
        assert_eq!(t.result.ats_score, 85);
        assert_eq!(t.result.matched_keywords, vec!["Python", "Rust"]);
        assert_eq!(t.result.missing_keywords, vec!["Kubernetes"]);
        assert_eq!(t.result.suggestions, vec!["Add metrics"]);
    }

    #[test]
    fn rejects_out_of_range_scores() {
        for bad in [-1, 101, 1000] {
            let err = TailoredResume::try_from(response(bad, "abc")).unwrap_err();
            assert!(matches!(err, TailorError::Decode { step: Step::Tailor, .. }), "{bad}");
        }
        assert!(TailoredResume::try_from(response(0, "abc")).is_ok());
        assert!(TailoredResume::try_from(response(100, "abc")).is_ok());
    }

    #[test]
    fn rejects_blank_analysis_id() {
        let err = TailoredResume::try_from(response(50, "  ")).unwrap_err();
        assert!(err.to_string().contains("analysis_id"));
    }

    #[test]
    fn missing_field_fails_to_deserialize() {
        let json = serde_json::json!({
            "tailored_resume": "x",
            "ats_score": 10,
            "suggestions": [],
            "keyword_matches": [],
            "missing_keywords": []
        });
        assert!(serde_json::from_value::<TailorResponse>(json).is_err());
    }
}
