use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use mountstore_common::{Filesystem, StorageError};

use crate::backend;
use crate::config::StorageConfig;

/// Named storage backends, keyed by upload destination.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn Filesystem>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every backend in the configuration.
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        for (key, backend_config) in &config.backends {
            registry.register(key.clone(), backend::from_config(key, backend_config)?);
        }
        info!(backends = ?registry.keys(), "Backend registry ready");
        Ok(registry)
    }

    /// Register `backend` under `key`, returning the handle it replaces.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        backend: Arc<dyn Filesystem>,
    ) -> Option<Arc<dyn Filesystem>> {
        self.backends.insert(key.into(), backend)
    }

    pub fn with(mut self, key: impl Into<String>, backend: Arc<dyn Filesystem>) -> Self {
        self.register(key, backend);
        self
    }

    pub fn resolve(&self, key: &str) -> Result<Arc<dyn Filesystem>, StorageError> {
        self.backends
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::BackendNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.backends.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry").field("keys", &self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryAdapter;

    #[test]
    fn test_resolve_unknown_key() {
        let registry = BackendRegistry::new().with("uploads", Arc::new(MemoryAdapter::new()));
        assert!(registry.resolve("uploads").is_ok());
        let err = registry.resolve("missing").err().unwrap();
        assert!(matches!(err, StorageError::BackendNotFound(ref k) if k == "missing"));
    }

    #[test]
    fn test_register_replaces_by_key() {
        let mut registry = BackendRegistry::new();
        let first: Arc<dyn Filesystem> = Arc::new(MemoryAdapter::new());
        assert!(registry.register("uploads", first.clone()).is_none());
        let replaced = registry.register("uploads", Arc::new(MemoryAdapter::new())).unwrap();
        assert!(Arc::ptr_eq(&replaced, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_config_builds_all_backends() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::parse(&format!(
            r#"
[backends.scratch]
type = "memory"

[backends.uploads]
type = "directory"
path = {:?}
"#,
            dir.path().display().to_string()
        ))
        .unwrap();
        let registry = BackendRegistry::from_config(&config).unwrap();
        assert_eq!(registry.keys(), vec!["scratch", "uploads"]);
        assert!(registry.contains("uploads"));
        assert!(!registry.contains("media"));
    }
}
