//! Download step: fetch the generated document for an analysis and save it.
//!
//! Saving goes through a [`DocumentSink`]. The default [`DirectorySink`]
//! stages the bytes in a temporary file next to the destination and renames
//! it into place, so a failed write never leaves a partial document behind
//! and the staging file is removed on every exit path.

use crate::client::ApiClient;
use crate::error::{Step, TailorError};
use crate::output::SavedDocument;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DOWNLOAD_ENDPOINT: &str = "/api/download-resume";

/// Characters of the analysis id used in the saved file name.
pub const ID_PREFIX_CHARS: usize = 8;

/// `tailored_resume_<first 8 chars of id>.<ext>`.
///
/// Characters that cannot appear in a file name are replaced with `_`.
pub fn file_name_for(analysis_id: &str, extension: &str) -> String {
    let prefix: String = analysis_id
        .chars()
        .take(ID_PREFIX_CHARS)
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("tailored_resume_{prefix}.{extension}")
}

/// The id is opaque, so it is pushed as a single escaped path segment.
fn download_url(client: &ApiClient, analysis_id: &str) -> Result<reqwest::Url, TailorError> {
    let mut url = reqwest::Url::parse(&client.url(DOWNLOAD_ENDPOINT))
        .map_err(|e| TailorError::Internal(format!("download url: {e}")))?;
    let url_text = url.to_string();
    url.path_segments_mut()
        .map_err(|_| TailorError::Internal(format!("base URL cannot carry a path: {url_text}")))?
        .push(analysis_id);
    Ok(url)
}

/// `GET /api/download-resume/{analysis_id}`; returns the raw body.
pub async fn download(client: &ApiClient, analysis_id: &str) -> Result<Vec<u8>, TailorError> {
    info!("Downloading tailored résumé for analysis {}", analysis_id);

    let url = download_url(client, analysis_id)?;
    let response = client.send(Step::Download, client.http().get(url)).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| TailorError::decode(Step::Download, format!("unreadable body: {e}")))?;

    debug!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

/// Where downloaded documents end up.
pub trait DocumentSink: Send + Sync {
    /// Deliver `bytes` under `file_name`. Called once per successful download.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<SavedDocument, TailorError>;
}

/// Writes documents into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<SavedDocument, TailorError> {
        let path = self.dir.join(file_name);
        let write_failed = |source: std::io::Error| TailorError::WriteFailed {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;

        // Dropping `staged` on any early return deletes the staging file.
        let mut staged = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(&self.dir)
            .map_err(write_failed)?;
        staged.write_all(bytes).map_err(write_failed)?;
        staged.as_file().sync_all().map_err(write_failed)?;
        staged
            .persist(&path)
            .map_err(|e| write_failed(e.error))?;

        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(SavedDocument {
            path,
            file_name: file_name.to_string(),
            bytes_written: bytes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_first_eight_chars() {
        assert_eq!(
            file_name_for("abc12345-xxxx", "docx"),
            "tailored_resume_abc12345.docx"
        );
        assert_eq!(file_name_for("short", "docx"), "tailored_resume_short.docx");
    }

    #[test]
    fn file_name_neutralises_path_separators() {
        assert_eq!(
            file_name_for("../../etc", "docx"),
            "tailored_resume_______et.docx"
        );
    }

    #[test]
    fn download_url_escapes_reserved_characters() {
        let config = crate::config::ClientConfig::builder()
            .base_url("http://127.0.0.1:8001")
            .build()
            .unwrap();
        let client = ApiClient::new(&config).unwrap();

        let url = download_url(&client, "ab#cd?e/f").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8001/api/download-resume/ab%23cd%3Fe%2Ff"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let plain = download_url(&client, "abc12345-6789").unwrap();
        assert_eq!(plain.path(), "/api/download-resume/abc12345-6789");
    }

    #[test]
    fn directory_sink_writes_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        let saved = sink.save("tailored_resume_abc12345.docx", b"PK\x03\x04").unwrap();
        assert_eq!(saved.bytes_written, 4);
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"PK\x03\x04");

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "staging file leaked");
    }

    #[test]
    fn directory_sink_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out/nested");
        let saved = DirectorySink::new(&nested).save("a.docx", b"x").unwrap();
        assert!(saved.path.starts_with(&nested));
    }

    #[test]
    fn directory_sink_failure_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let err = DirectorySink::new(&blocker).save("a.docx", b"x").unwrap_err();
        assert!(matches!(err, TailorError::WriteFailed { .. }));
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
