//! HTTP plumbing shared by every pipeline step.
//!
//! [`ApiClient`] owns one `reqwest::Client` (and therefore one connection
//! pool) plus the base URL. Steps build their request, hand it to
//! [`ApiClient::send`], and get back either a success response or a
//! [`TailorError`] tagged with the step that failed.

use crate::config::ClientConfig;
use crate::error::{Step, TailorError};
use crate::output::{AnalysisRecord, HealthStatus};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const HEALTH_ENDPOINT: &str = "/api/health";
const ANALYSES_ENDPOINT: &str = "/api/analyses";

/// Non-success bodies are kept for diagnostics, but only this much of them.
const MAX_ERROR_BODY: usize = 512;

/// Thin wrapper over `reqwest::Client` bound to one API host.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, TailorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("resume-tailor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TailorError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send a request and keep only success responses.
    ///
    /// Any non-2xx status becomes [`TailorError::Status`]; the body is read
    /// best-effort and truncated.
    pub(crate) async fn send(
        &self,
        step: Step,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TailorError> {
        let response = request
            .send()
            .await
            .map_err(|source| TailorError::Network { step, source })?;

        let status = response.status();
        debug!("{} response status: {}", step, status);
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        warn!("{} failed with HTTP {}: {}", step, status.as_u16(), body);
        Err(TailorError::Status {
            step,
            status: status.as_u16(),
            body,
        })
    }

    /// Read a success response as JSON of type `T`.
    ///
    /// The body is read as text first so a truncated or non-JSON body is
    /// reported as a decode error rather than a network one.
    pub(crate) async fn read_json<T: DeserializeOwned>(
        &self,
        step: Step,
        response: reqwest::Response,
    ) -> Result<T, TailorError> {
        let text = response
            .text()
            .await
            .map_err(|e| TailorError::decode(step, format!("unreadable body: {e}")))?;
        serde_json::from_str(&text).map_err(|e| TailorError::decode(step, e.to_string()))
    }

    /// `GET /api/health`.
    ///
    /// Failures are attributed to [`Step::Upload`] since the probe exists to
    /// check the collaborator before a run starts.
    pub async fn health(&self) -> Result<HealthStatus, TailorError> {
        let request = self.http.get(self.url(HEALTH_ENDPOINT));
        let response = self.send(Step::Upload, request).await?;
        self.read_json(Step::Upload, response).await
    }

    /// `GET /api/analyses`: most recent analyses first, as stored server-side.
    pub async fn recent_analyses(&self) -> Result<Vec<AnalysisRecord>, TailorError> {
        #[derive(Deserialize)]
        struct Listing {
            analyses: Vec<AnalysisRecord>,
        }

        let request = self.http.get(self.url(ANALYSES_ENDPOINT));
        let response = self.send(Step::Download, request).await?;
        let listing: Listing = self.read_json(Step::Download, response).await?;
        Ok(listing.analyses)
    }
}
