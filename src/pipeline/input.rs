//! Input resolution: turn a user-supplied path or URL into a [`Document`].
//!
//! pdfium can parse from a byte slice, so unlike a path-based pipeline there
//! is no temp file: local files are read and URLs downloaded straight into
//! memory. The size limit is enforced while reading so an oversized download
//! is abandoned early instead of buffered whole.

use crate::document::{sniff_media_type, Document};
use crate::error::FileError;
use futures::StreamExt;
use std::path::Path;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory document.
///
/// The returned document is not validated; the controller does that on
/// selection so the same rules apply to every source.
pub async fn resolve_input(
    input: &str,
    max_bytes: usize,
    timeout_secs: u64,
) -> Result<Document, FileError> {
    if is_url(input) {
        download_url(input, max_bytes, timeout_secs).await
    } else {
        read_local(Path::new(input), max_bytes).await
    }
}

/// Read a local file, mapping I/O failures to file errors.
async fn read_local(path: &Path, max_bytes: usize) -> Result<Document, FileError> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| io_to_file_error(path, e))?;
    if meta.len() as usize > max_bytes {
        return Err(FileError::TooLarge {
            size: meta.len() as usize,
            max: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| io_to_file_error(path, e))?;
    let declared = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.eq_ignore_ascii_case("pdf"))
        .map(|_| crate::document::PDF_MEDIA_TYPE);
    let media_type = sniff_media_type(&bytes, declared);

    debug!("Read local file {} ({} bytes, {})", path.display(), bytes.len(), media_type);
    Ok(Document::new(display_name(path), media_type, bytes))
}

fn io_to_file_error(path: &Path, e: std::io::Error) -> FileError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => FileError::NotFound {
            path: path.to_path_buf(),
        },
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Download a URL into memory, stopping once `max_bytes` is exceeded.
async fn download_url(url: &str, max_bytes: usize, timeout_secs: u64) -> Result<Document, FileError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| FileError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_send_err = |e: reqwest::Error| {
        if e.is_timeout() {
            FileError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            FileError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_send_err)?;

    if !response.status().is_success() {
        return Err(FileError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let Some(len) = response.content_length() {
        if len as usize > max_bytes {
            return Err(FileError::TooLarge {
                size: len as usize,
                max: max_bytes,
            });
        }
    }

    let declared = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let name = filename_from_url(url);

    let mut bytes = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(piece) = body.next().await {
        let piece = piece.map_err(map_send_err)?;
        bytes.extend_from_slice(&piece);
        if bytes.len() > max_bytes {
            return Err(FileError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
    }

    let media_type = sniff_media_type(&bytes, declared.as_deref());
    info!("Downloaded {} ({} bytes, {})", name, bytes.len(), media_type);
    Ok(Document::new(name, media_type, bytes))
}

/// Last path segment of the URL if it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
