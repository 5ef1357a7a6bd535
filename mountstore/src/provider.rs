use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use mountstore_common::{MappingProvider, PropertyMapping, SourceFile, WriteOptions};

use crate::config::{MappingConfig, StorageConfig};

/// One file slot of a domain object.
#[derive(Clone)]
pub struct FileField {
    pub property: String,
    /// Name of the configured mapping this slot uses.
    pub mapping: String,
    /// Pending upload, if the client sent one.
    pub file: Option<Arc<dyn SourceFile>>,
    /// Name recorded by a previous upload.
    pub file_name: Option<String>,
}

impl FileField {
    pub fn new(property: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            mapping: mapping.into(),
            file: None,
            file_name: None,
        }
    }

    pub fn with_file(mut self, file: Arc<dyn SourceFile>) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

impl fmt::Debug for FileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileField")
            .field("property", &self.property)
            .field("mapping", &self.mapping)
            .field("file", &self.file.as_ref().map(|f| f.original_name().to_string()))
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// A domain object with file slots.
pub trait Uploadable {
    fn object_id(&self) -> String;
    fn file_fields(&self) -> Vec<FileField>;
}

/// Mapping provider backed by the `[mappings]` section of the configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredMappings {
    mappings: BTreeMap<String, MappingConfig>,
}

impl ConfiguredMappings {
    pub fn new(config: &StorageConfig) -> Self {
        Self { mappings: config.mappings.clone() }
    }

    fn build(&self, object_id: &str, field: FileField) -> Option<PropertyMapping> {
        let Some(config) = self.mappings.get(&field.mapping) else {
            warn!(
                property = %field.property,
                mapping = %field.mapping,
                "Unknown mapping, ignoring field"
            );
            return None;
        };

        let mut mapping =
            PropertyMapping::new(field.property, &config.upload_destination, object_id)
                .with_mapping_name(field.mapping)
                .with_namer(config.namer.clone())
                .with_directory(config.directory.clone())
                .with_write_options(WriteOptions {
                    visibility: config.visibility,
                    content_type: None,
                    extra: config.options.clone(),
                });
        mapping.file = field.file;
        mapping.file_name = field.file_name;
        mapping.uri_prefix = config.uri_prefix.clone();
        Some(mapping)
    }
}

impl<O: Uploadable + ?Sized> MappingProvider<O> for ConfiguredMappings {
    fn mappings_for(&self, object: &O) -> Vec<PropertyMapping> {
        let object_id = object.object_id();
        object
            .file_fields()
            .into_iter()
            .filter_map(|field| self.build(&object_id, field))
            .collect()
    }
}
