//! The in-memory document a run operates on.

use crate::error::FileError;
use std::fmt;
use std::sync::Arc;

/// The only media type a document may have.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// One selected file: name, declared media type and content.
///
/// The content is shared (`Arc<[u8]>`) so a run can hand it to the blocking
/// extraction task without copying while the controller keeps its own
/// reference.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl Document {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check the size limit first, then the media type.
    pub fn validate(&self, max_bytes: usize) -> Result<(), FileError> {
        if self.len() > max_bytes {
            return Err(FileError::TooLarge {
                size: self.len(),
                max: max_bytes,
            });
        }
        if self.media_type != PDF_MEDIA_TYPE {
            return Err(FileError::WrongMediaType {
                media_type: self.media_type.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.len())
            .finish()
    }
}

/// Media type from content: `%PDF` magic wins, otherwise the declared type,
/// otherwise `application/octet-stream`.
pub fn sniff_media_type(bytes: &[u8], declared: Option<&str>) -> String {
    if bytes.starts_with(b"%PDF") {
        return PDF_MEDIA_TYPE.to_string();
    }
    declared
        .map(|d| d.split(';').next().unwrap_or(d).trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
