//! Report artifact persistence.
//!
//! The artifact is written to a `.partial` sibling first and renamed into
//! place, so the configured path either holds a complete report or nothing
//! from this run.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use scanward_core::EngineError;

/// The report could not be obtained. Never fatal to the alert summary.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to fetch report: {0}")]
    Fetch(#[source] EngineError),

    #[error("Failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the report ended up.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportStatus {
    Saved { path: PathBuf },
    Unavailable { reason: String },
}

impl From<&ArtifactError> for ReportStatus {
    fn from(err: &ArtifactError) -> Self {
        Self::Unavailable {
            reason: err.to_string(),
        }
    }
}

pub async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let partial = partial_path(path);

    let written = match tokio::fs::write(&partial, bytes).await {
        Ok(()) => tokio::fs::rename(&partial, path).await,
        Err(e) => Err(e),
    };

    if let Err(source) = written {
        remove_partial(&partial).await;
        return Err(ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Report written");
    Ok(())
}

async fn remove_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => tracing::debug!(path = %partial.display(), "Removed partial report"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %partial.display(),
            error = %e,
            "Failed to remove partial report"
        ),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("report"));
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("out/security-report.html")),
            PathBuf::from("out/security-report.html.partial")
        );
    }

    #[tokio::test]
    async fn test_write_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security-report.html");
        write_atomically(&path, b"<html></html>").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"<html></html>");
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("security-report.html");
        let err = write_atomically(&path, b"x").await.unwrap_err();
        assert!(matches!(err, ArtifactError::Write { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security-report.html");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = write_atomically(&path, b"<html></html>").await.unwrap_err();
        assert!(matches!(err, ArtifactError::Write { .. }));
        assert!(!partial_path(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_status_from_error() {
        let err = ArtifactError::Fetch(EngineError::Status {
            endpoint: "/OTHER/core/other/htmlreport/".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        });
        let status = ReportStatus::from(&err);
        match status {
            ReportStatus::Unavailable { reason } => assert!(reason.contains("502")),
            other => panic!("unexpected status: {other:?}"),
        }
    }
}
