//! Local directory backend adapter.
//!
//! Stores files in a local filesystem directory. Uses atomic write
//! (temp file → fsync → rename) so readers never see a partial upload.
//! Each write gets its own temp file; concurrent writes to one path leave
//! the content of whichever rename lands last.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tracing::debug;
use uuid::Uuid;

use mountstore_common::backend::{
    normalize_path, BackendError, BoxReader, Filesystem, Visibility, WriteOptions,
};

pub struct DirectoryAdapter {
    base_path: PathBuf,
}

impl DirectoryAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(normalize_path(key))
    }
}

fn not_found(path: &str, err: std::io::Error) -> BackendError {
    if err.kind() == ErrorKind::NotFound {
        BackendError::FileNotFound(path.to_string())
    } else {
        BackendError::Io(err)
    }
}

#[cfg(unix)]
async fn apply_visibility(path: &std::path::Path, visibility: Visibility) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match visibility {
        Visibility::Public => 0o644,
        Visibility::Private => 0o600,
    };
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn apply_visibility(_path: &std::path::Path, _visibility: Visibility) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl Filesystem for DirectoryAdapter {
    async fn write_stream(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        options: &WriteOptions,
    ) -> Result<(), BackendError> {
        let dest = self.full_path(path);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp_name = dest.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(format!(".{}.upload-tmp", Uuid::new_v4().simple()));
        let tmp_path = dest.with_file_name(tmp_name);

        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            let size = tokio::io::copy(reader, &mut file).await?;
            file.sync_all().await?;
            drop(file);
            if let Some(visibility) = options.visibility {
                apply_visibility(&tmp_path, visibility).await?;
            }
            tokio::fs::rename(&tmp_path, &dest).await?;
            Ok::<u64, std::io::Error>(size)
        }
        .await;

        match written {
            Ok(size) => {
                debug!(key = %path, size, "Directory write complete");
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                Err(BackendError::Io(e))
            }
        }
    }

    async fn read_stream(&self, path: &str) -> Result<BoxReader, BackendError> {
        let file = tokio::fs::File::open(self.full_path(path))
            .await
            .map_err(|e| not_found(path, e))?;
        Ok(Box::new(file))
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        tokio::fs::remove_file(self.full_path(path))
            .await
            .map_err(|e| not_found(path, e))?;
        debug!(key = %path, "Directory delete complete");
        Ok(())
    }

    async fn has(&self, path: &str) -> Result<bool, BackendError> {
        match tokio::fs::metadata(self.full_path(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BackendError::Io(e)),
        }
    }
}
