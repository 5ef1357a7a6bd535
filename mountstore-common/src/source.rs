//! Handles to files waiting to be uploaded.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::backend::BoxReader;

/// A file supplied by a client, readable as a stream.
#[async_trait]
pub trait SourceFile: Send + Sync {
    /// Name the client gave the file.
    fn original_name(&self) -> &str;

    /// MIME type reported by the client, if any.
    fn mime_type(&self) -> Option<&str> {
        None
    }

    /// Open a fresh stream over the file contents.
    async fn open(&self) -> std::io::Result<BoxReader>;
}

/// A file on local disk, e.g. a spooled HTTP upload.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    original_name: String,
    mime_type: Option<String>,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, original_name, mime_type: None }
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = name.into();
        self
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SourceFile for LocalFile {
    fn original_name(&self) -> &str {
        &self.original_name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn open(&self) -> std::io::Result<BoxReader> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::new(file))
    }
}

/// A file already held in memory.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    original_name: String,
    data: Bytes,
    mime_type: Option<String>,
}

impl MemoryFile {
    pub fn new(original_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            data: data.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }
}

#[async_trait]
impl SourceFile for MemoryFile {
    fn original_name(&self) -> &str {
        &self.original_name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn open(&self) -> std::io::Result<BoxReader> {
        Ok(Box::new(std::io::Cursor::new(self.data.clone())))
    }
}
