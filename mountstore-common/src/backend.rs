use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

/// Owned readable stream handed out by backends and source files.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Errors reported by a [`Filesystem`] backend.
///
/// Callers inspect the variant rather than the message: `FileNotFound` is
/// the one condition the storage layer recovers from.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::FileNotFound(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Per-write hints forwarded to the backend untouched.
///
/// Backends honour the fields they understand (ACL headers, file modes,
/// content type) and ignore the rest. `extra` is never read by the storage
/// layer itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteOptions {
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Trait implemented by all storage backends.
///
/// Each backend handles the raw I/O for one storage medium (local directory,
/// S3-compatible bucket, memory). Name resolution, naming strategies and
/// error recovery live in the storage layer; the backend is responsible only
/// for writing, reading, deleting and probing objects by path.
#[async_trait::async_trait]
pub trait Filesystem: Send + Sync {
    /// Write everything readable from `reader` at `path`, replacing any
    /// existing object.
    async fn write_stream(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        options: &WriteOptions,
    ) -> Result<(), BackendError>;

    /// Open the object at `path` for reading.
    async fn read_stream(&self, path: &str) -> Result<BoxReader, BackendError>;

    /// Delete the object at `path`. Returns `FileNotFound` if it is absent.
    async fn delete(&self, path: &str) -> Result<(), BackendError>;

    /// Whether an object exists at `path`.
    async fn has(&self, path: &str) -> Result<bool, BackendError>;
}

/// Strip leading slashes and parent-directory segments from a path so it
/// cannot escape the backend root.
pub fn normalize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Join path segments with `/`, skipping empty ones.
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compute the remote key for a file scoped by the owning object's id.
/// Scheme: `{prefix}/{object_id[..chars]}/{filename}`
pub fn remote_key(prefix: &str, object_id: &str, chars: usize, filename: &str) -> String {
    let end = object_id
        .char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(object_id.len());
    join_path(&[prefix, &object_id[..end], filename])
}
