pub mod directory;
pub mod memory;
pub mod s3;

use std::sync::Arc;

use anyhow::bail;
use mountstore_common::Filesystem;

use crate::config::{BackendConfig, S3BackendConfig};

use self::directory::DirectoryAdapter;
use self::memory::MemoryAdapter;
use self::s3::{S3Adapter, S3Config};

/// Construct a backend from its configuration entry.
///
/// S3 credentials come from the entry itself, falling back to the standard
/// AWS environment variables.
pub fn from_config(key: &str, config: &BackendConfig) -> anyhow::Result<Arc<dyn Filesystem>> {
    match config {
        BackendConfig::Directory { path } => Ok(Arc::new(DirectoryAdapter::new(path))),
        BackendConfig::Memory => Ok(Arc::new(MemoryAdapter::new())),
        BackendConfig::S3(s3) => {
            let (access_key_id, secret_access_key) = s3_credentials(s3);
            if access_key_id.is_empty() || secret_access_key.is_empty() {
                bail!("S3 credentials not found for backend '{}'", key);
            }
            Ok(Arc::new(S3Adapter::new(S3Config {
                bucket: s3.bucket.clone(),
                prefix: s3.prefix.clone(),
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                access_key_id,
                secret_access_key,
                storage_class: s3.storage_class.clone(),
                visibility: s3.visibility,
            })?))
        }
    }
}

fn s3_credentials(s3: &S3BackendConfig) -> (String, String) {
    let access_key_id = s3
        .access_key_id
        .clone()
        .unwrap_or_else(|| std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default());
    let secret_access_key = s3
        .secret_access_key
        .clone()
        .unwrap_or_else(|| std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default());
    (access_key_id, secret_access_key)
}
