//! Export of the current output as a plain-text file.

use crate::error::PdfSumError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

/// `summary-<ISO-8601 UTC>.txt` with `:` and `.` replaced by `-`, e.g.
/// `summary-2024-05-01T12-30-05-123Z.txt`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-");
    format!("summary-{stamp}.txt")
}

/// Write `text` to `path` atomically (temp file + rename).
pub async fn write_atomic(path: &Path, text: &str) -> Result<(), PdfSumError> {
    let write_err = |source| PdfSumError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, text).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Write `text` into `dir` under a fresh timestamped name.
pub async fn export_to_dir(dir: &Path, text: &str) -> Result<PathBuf, PdfSumError> {
    if text.is_empty() {
        return Err(PdfSumError::NoOutput);
    }
    let path = dir.join(export_filename(Utc::now()));
    write_atomic(&path, text).await?;
    info!("Exported {} chars to {}", text.chars().count(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filename_replaces_colons_and_dots() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(export_filename(t), "summary-2024-05-01T12-30-05-123Z.txt");
    }

    #[tokio::test]
    async fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_dir(dir.path(), "# Title\n\nBody").await.unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("summary-"));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "# Title\n\nBody");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn empty_output_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_to_dir(dir.path(), "").await.unwrap_err();
        assert!(matches!(err, PdfSumError::NoOutput));
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/summary.md");
        write_atomic(&path, "ok").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "ok");
    }
}
