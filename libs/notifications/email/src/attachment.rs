//! Attachments: boundary map → validated, tagged sources
//!
//! Callers hand over a [`AttachmentMap`] of filename → arbitrary value. Only
//! two value types are meaningful, a [`PathBuf`] for files on disk and a
//! [`StreamSource`] for content produced on demand. [`resolve`] turns the map
//! into [`ResolvedAttachment`]s or fails on the first value of any other type.

use crate::error::{MailError, MailResult};
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

type Opener = dyn Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync;

/// Re-readable stream: every [`open`](Self::open) yields a fresh reader.
#[derive(Clone)]
pub struct StreamSource {
    open: Arc<Opener>,
}

impl StreamSource {
    pub fn new<F>(open: F) -> Self
    where
        F: Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        Self {
            open: Arc::new(open),
        }
    }

    /// In-memory content.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Arc<[u8]> = bytes.into().into();
        Self::new(move || Ok(Box::new(io::Cursor::new(Arc::clone(&bytes))) as Box<dyn Read + Send>))
    }

    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        (self.open)()
    }
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource").finish_non_exhaustive()
    }
}

/// Where attachment content comes from.
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    File(PathBuf),
    Stream(StreamSource),
}

impl AttachmentSource {
    /// Read the whole content. Streams are drained on a blocking thread.
    pub async fn load(&self) -> io::Result<Vec<u8>> {
        match self {
            Self::File(path) => tokio::fs::read(path).await,
            Self::Stream(source) => {
                let source = source.clone();
                tokio::task::spawn_blocking(move || {
                    let mut reader = source.open()?;
                    let mut content = Vec::new();
                    reader.read_to_end(&mut content)?;
                    Ok::<_, io::Error>(content)
                })
                .await
                .map_err(io::Error::other)?
            }
        }
    }
}

/// A validated attachment ready to be sent.
#[derive(Debug, Clone)]
pub struct ResolvedAttachment {
    pub filename: String,
    pub source: AttachmentSource,
}

impl ResolvedAttachment {
    pub fn new(filename: impl Into<String>, source: AttachmentSource) -> Self {
        Self {
            filename: filename.into(),
            source,
        }
    }

    /// MIME type guessed from the filename, `application/octet-stream` if unknown.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

struct Entry {
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

/// Filename → value, as received from callers.
#[derive(Default)]
pub struct AttachmentMap {
    entries: BTreeMap<String, Entry>,
}

impl AttachmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under `filename`, replacing any previous one.
    pub fn insert<T: Any + Send>(&mut self, filename: impl Into<String>, value: T) -> &mut Self {
        self.entries.insert(
            filename.into(),
            Entry {
                type_name: type_name::<T>(),
                value: Box::new(value),
            },
        );
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<T: Any + Send>(mut self, filename: impl Into<String>, value: T) -> Self {
        self.insert(filename, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AttachmentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, entry.type_name)))
            .finish()
    }
}

/// Validate every value of `map`.
///
/// Fails fast on the first unsupported value; no partial list is returned.
pub fn resolve(map: AttachmentMap) -> MailResult<Vec<ResolvedAttachment>> {
    map.entries
        .into_iter()
        .map(|(name, entry)| {
            let source = match entry.value.downcast::<PathBuf>() {
                Ok(path) => AttachmentSource::File(*path),
                Err(value) => match value.downcast::<StreamSource>() {
                    Ok(stream) => AttachmentSource::Stream(*stream),
                    Err(_) => {
                        return Err(MailError::UnsupportedAttachmentType {
                            name,
                            found: entry.type_name,
                        })
                    }
                },
            };
            Ok(ResolvedAttachment::new(name, source))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_supported_types() {
        let map = AttachmentMap::new()
            .with("a.pdf", PathBuf::from("/tmp/a.pdf"))
            .with("b.txt", StreamSource::from_bytes("hello"));

        let resolved = resolve(map).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].filename, "a.pdf");
        assert!(matches!(resolved[0].source, AttachmentSource::File(_)));
        assert_eq!(resolved[1].filename, "b.txt");
        assert!(matches!(resolved[1].source, AttachmentSource::Stream(_)));
    }

    #[test]
    fn test_resolve_rejects_other_types() {
        let map = AttachmentMap::new()
            .with("a.pdf", PathBuf::from("/tmp/a.pdf"))
            .with("notes.txt", String::from("not a path"));

        let err = resolve(map).unwrap_err();

        match err {
            MailError::UnsupportedAttachmentType { name, found } => {
                assert_eq!(name, "notes.txt");
                assert!(found.ends_with("String"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_content_type_from_filename() {
        let pdf = ResolvedAttachment::new("report.pdf", AttachmentSource::File("x".into()));
        let unknown = ResolvedAttachment::new("blob.zzz", AttachmentSource::File("x".into()));

        assert_eq!(pdf.content_type(), "application/pdf");
        assert_eq!(unknown.content_type(), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_stream_source_is_rereadable() {
        let source = AttachmentSource::Stream(StreamSource::from_bytes(b"abc".to_vec()));

        assert_eq!(source.load().await.unwrap(), b"abc");
        assert_eq!(source.load().await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_file_source_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file content").unwrap();

        let source = AttachmentSource::File(file.path().to_path_buf());
        assert_eq!(source.load().await.unwrap(), b"file content");
    }

    #[tokio::test]
    async fn test_missing_file_fails_on_load() {
        let source = AttachmentSource::File(PathBuf::from("/definitely/not/here.bin"));
        assert!(source.load().await.is_err());
    }
}
