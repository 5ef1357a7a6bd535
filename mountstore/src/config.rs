use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use mountstore_common::{DirectoryStrategy, NamingStrategy, Visibility};

const DEFAULT_S3_REGION: &str = "us-east-1";
/// Hex length of a SHA-256 digest, the longest name the hash namer produces.
const MAX_HASH_LENGTH: usize = 64;

fn default_region() -> String {
    DEFAULT_S3_REGION.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backends: BTreeMap<String, BackendConfig>,
    #[serde(default)]
    pub mappings: BTreeMap<String, MappingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Directory { path: PathBuf },
    #[serde(alias = "b2")]
    S3(S3BackendConfig),
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3BackendConfig {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for B2, MinIO or other S3-compatible APIs.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
    /// Default ACL for writes that do not set a visibility.
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    pub upload_destination: String,
    #[serde(default)]
    pub uri_prefix: Option<String>,
    #[serde(default)]
    pub namer: NamingStrategy,
    #[serde(default)]
    pub directory: DirectoryStrategy,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Backend-specific write hints, passed through untouched.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl StorageConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: StorageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.backends.is_empty() {
            anyhow::bail!("at least one backend must be configured");
        }
        for (key, backend) in &self.backends {
            if key.is_empty() {
                anyhow::bail!("backend keys must not be empty");
            }
            match backend {
                BackendConfig::Directory { path } => {
                    if !path.is_absolute() {
                        anyhow::bail!(
                            "directory backend '{}' path must be absolute: {}",
                            key,
                            path.display()
                        );
                    }
                }
                BackendConfig::S3(s3) => {
                    if s3.bucket.is_empty() {
                        anyhow::bail!("s3 backend '{}' bucket must not be empty", key);
                    }
                }
                BackendConfig::Memory => {}
            }
        }
        for (name, mapping) in &self.mappings {
            if !self.backends.contains_key(&mapping.upload_destination) {
                anyhow::bail!(
                    "mapping '{}' uploads to unknown backend '{}'",
                    name,
                    mapping.upload_destination
                );
            }
            if let NamingStrategy::Hash { length } = mapping.namer {
                if length == 0 || length > MAX_HASH_LENGTH {
                    anyhow::bail!(
                        "mapping '{}' hash namer length must be between 1 and {}",
                        name,
                        MAX_HASH_LENGTH
                    );
                }
            }
            if let DirectoryStrategy::IdPrefix { chars: 0 } = mapping.directory {
                anyhow::bail!("mapping '{}' id_prefix chars must be positive", name);
            }
        }
        Ok(())
    }
}
