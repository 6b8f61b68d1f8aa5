//! Configuration for the tailoring client.
//!
//! Everything the client needs to reach its collaborators and place
//! downloaded documents lives in [`ClientConfig`], built through
//! [`ClientConfigBuilder`] or resolved from the environment with
//! [`ClientConfig::from_env`].

use crate::error::TailorError;
use crate::progress::Observer;
use std::fmt;
use std::path::PathBuf;

/// Base URL used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Primary environment variable for the API host.
pub const BASE_URL_ENV: &str = "RESUME_TAILOR_API_URL";

/// Secondary variable, honoured so an existing frontend `.env` keeps working.
pub const LEGACY_BASE_URL_ENV: &str = "REACT_APP_BACKEND_URL";

/// Request timeout override, in seconds.
pub const TIMEOUT_ENV: &str = "RESUME_TAILOR_TIMEOUT";

/// Configuration for a [`crate::orchestrator::Orchestrator`].
///
/// # Example
/// ```rust
/// use resume_tailor::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com")
///     .request_timeout_secs(60)
///     .download_dir("/tmp")
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "https://api.example.com");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// API host, without a trailing slash. Default: `http://localhost:8001`.
    pub base_url: String,

    /// Whole-request timeout in seconds. Default: 120.
    ///
    /// Tailoring runs two model calls server-side, so this is generous.
    /// A timeout surfaces as an ordinary transport failure.
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Directory downloaded documents are written to. Default: current directory.
    pub download_dir: PathBuf,

    /// Supported document extension, without the dot. Default: `docx`.
    pub document_extension: String,

    /// Step/state observer. Default: none.
    pub observer: Option<Observer>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            download_dir: PathBuf::from("."),
            document_extension: "docx".to_string(),
            observer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("download_dir", &self.download_dir)
            .field("document_extension", &self.document_extension)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the configuration from the process environment.
    ///
    /// `RESUME_TAILOR_API_URL` wins over `REACT_APP_BACKEND_URL`; empty
    /// values count as unset. Falls back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Result<Self, TailorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TailorError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(url) = non_empty(BASE_URL_ENV).or_else(|| non_empty(LEGACY_BASE_URL_ENV)) {
            builder = builder.base_url(url.trim());
        }
        if let Some(raw) = non_empty(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                TailorError::InvalidConfig(format!("{TIMEOUT_ENV} must be a whole number, got '{raw}'"))
            })?;
            builder = builder.request_timeout_secs(secs);
        }
        builder.build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn document_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.document_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, TailorError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(TailorError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.request_timeout_secs == 0 || c.connect_timeout_secs == 0 {
            return Err(TailorError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.document_extension.is_empty() {
            return Err(TailorError::InvalidConfig(
                "document extension must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_dev_server() {
        let c = ClientConfig::default();
        assert_eq!(c.base_url, "http://localhost:8001");
        assert_eq!(c.document_extension, "docx");
        assert_eq!(c.download_dir, PathBuf::from("."));
    }

    #[test]
    fn env_lookup_prefers_primary_variable() {
        let c = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_ENV, "https://primary.example"),
            (LEGACY_BASE_URL_ENV, "https://legacy.example"),
        ]))
        .unwrap();
        assert_eq!(c.base_url, "https://primary.example");
    }

    #[test]
    fn env_lookup_falls_back_to_legacy_then_default() {
        let c = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_ENV, "  "),
            (LEGACY_BASE_URL_ENV, "https://legacy.example/"),
        ]))
        .unwrap();
        assert_eq!(c.base_url, "https://legacy.example");

        let c = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn env_timeout_must_be_numeric() {
        let err = ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(err.to_string().contains(TIMEOUT_ENV));

        let c = ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "30")])).unwrap();
        assert_eq!(c.request_timeout_secs, 30);
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(ClientConfig::builder().base_url("ftp://x").build().is_err());
        assert!(ClientConfig::builder().request_timeout_secs(0).build().is_err());
        assert!(ClientConfig::builder().document_extension("").build().is_err());
    }

    #[test]
    fn builder_normalises_extension_and_url() {
        let c = ClientConfig::builder()
            .base_url("http://host:9000///")
            .document_extension(".docx")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://host:9000");
        assert_eq!(c.document_extension, "docx");
    }
}
