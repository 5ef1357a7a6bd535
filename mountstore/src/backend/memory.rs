//! In-memory backend adapter.
//!
//! Keeps objects in a map for the lifetime of the process. Useful for tests
//! and for scratch storage that does not need to survive a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;
use tracing::debug;

use mountstore_common::backend::{normalize_path, BackendError, BoxReader, Filesystem, WriteOptions};

#[derive(Default)]
pub struct MemoryAdapter {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents stored at `path`, if any.
    pub async fn get(&self, path: &str) -> Option<Bytes> {
        self.objects.read().await.get(&normalize_path(path)).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl Filesystem for MemoryAdapter {
    async fn write_stream(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        _options: &WriteOptions,
    ) -> Result<(), BackendError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let key = normalize_path(path);
        debug!(key = %key, size = data.len(), "Memory write complete");
        self.objects.write().await.insert(key, Bytes::from(data));
        Ok(())
    }

    async fn read_stream(&self, path: &str) -> Result<BoxReader, BackendError> {
        match self.get(path).await {
            Some(data) => Ok(Box::new(std::io::Cursor::new(data))),
            None => Err(BackendError::FileNotFound(path.to_string())),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let key = normalize_path(path);
        match self.objects.write().await.remove(&key) {
            Some(_) => {
                debug!(key = %key, "Memory delete complete");
                Ok(())
            }
            None => Err(BackendError::FileNotFound(path.to_string())),
        }
    }

    async fn has(&self, path: &str) -> Result<bool, BackendError> {
        Ok(self.objects.read().await.contains_key(&normalize_path(path)))
    }
}
