//! Named-backend file storage.
//!
//! Files attached to domain objects are described by
//! [`PropertyMapping`](mountstore_common::PropertyMapping)s and stored in
//! backends looked up by key in a [`BackendRegistry`]. [`MountStorage`] ties
//! the two together.

pub mod backend;
pub mod config;
pub mod provider;
pub mod registry;
pub mod storage;

pub use config::{BackendConfig, MappingConfig, StorageConfig};
pub use provider::{ConfiguredMappings, FileField, Uploadable};
pub use registry::BackendRegistry;
pub use storage::MountStorage;

/// Build the registry and mapping provider described by a configuration.
pub fn from_config(config: &StorageConfig) -> anyhow::Result<MountStorage<ConfiguredMappings>> {
    let registry = BackendRegistry::from_config(config)?;
    Ok(MountStorage::new(ConfiguredMappings::new(config), registry))
}
