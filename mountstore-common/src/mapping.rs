use std::fmt;
use std::sync::Arc;

use crate::backend::WriteOptions;
use crate::naming::{DirectoryStrategy, NamingStrategy};
use crate::source::SourceFile;

/// Where one file slot of a domain object is stored.
///
/// Mappings are snapshots built per operation by a [`MappingProvider`]; they
/// carry the pending upload (if any) and the name recorded from a previous
/// upload (if any).
#[derive(Clone)]
pub struct PropertyMapping {
    /// Name of the file slot on the owning object, e.g. `avatar`.
    pub property: String,
    /// Name of the configured mapping the slot uses.
    pub mapping_name: String,
    /// Identity of the owning object.
    pub object_id: String,
    /// Key of the backend in the registry.
    pub upload_destination: String,
    pub file: Option<Arc<dyn SourceFile>>,
    pub file_name: Option<String>,
    pub namer: NamingStrategy,
    pub directory: DirectoryStrategy,
    pub uri_prefix: Option<String>,
    pub write_options: WriteOptions,
}

impl PropertyMapping {
    pub fn new(
        property: impl Into<String>,
        upload_destination: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Self {
        let property = property.into();
        Self {
            mapping_name: property.clone(),
            property,
            object_id: object_id.into(),
            upload_destination: upload_destination.into(),
            file: None,
            file_name: None,
            namer: NamingStrategy::default(),
            directory: DirectoryStrategy::default(),
            uri_prefix: None,
            write_options: WriteOptions::default(),
        }
    }

    pub fn with_mapping_name(mut self, name: impl Into<String>) -> Self {
        self.mapping_name = name.into();
        self
    }

    pub fn with_file(mut self, file: Arc<dyn SourceFile>) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_namer(mut self, namer: NamingStrategy) -> Self {
        self.namer = namer;
        self
    }

    pub fn with_directory(mut self, directory: DirectoryStrategy) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_uri_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.uri_prefix = Some(prefix.into());
        self
    }

    pub fn with_write_options(mut self, options: WriteOptions) -> Self {
        self.write_options = options;
        self
    }

    /// The recorded file name, treating an empty string as absent.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|n| !n.is_empty())
    }

    /// Name a new upload of `file` is stored under.
    pub fn upload_name(&self, file: &dyn SourceFile) -> String {
        self.namer.name(file.original_name(), self.file_name())
    }

    /// Path inside the backend for a stored name.
    pub fn path_for(&self, name: &str) -> String {
        self.directory.path_for(&self.object_id, name)
    }

    /// Path of the currently recorded file, if there is one.
    pub fn stored_path(&self) -> Option<String> {
        self.file_name().map(|name| self.path_for(name))
    }

    /// Public URI of the recorded file.
    pub fn uri(&self) -> Option<String> {
        let path = self.stored_path()?;
        let prefix = self.uri_prefix.as_deref().unwrap_or("").trim_end_matches('/');
        Some(format!("{}/{}", prefix, path))
    }
}

impl fmt::Debug for PropertyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMapping")
            .field("property", &self.property)
            .field("mapping_name", &self.mapping_name)
            .field("object_id", &self.object_id)
            .field("upload_destination", &self.upload_destination)
            .field("file", &self.file.as_ref().map(|f| f.original_name().to_string()))
            .field("file_name", &self.file_name)
            .field("namer", &self.namer)
            .field("directory", &self.directory)
            .field("uri_prefix", &self.uri_prefix)
            .finish()
    }
}

/// Supplies the mappings of a domain object, in a stable order.
pub trait MappingProvider<O: ?Sized>: Send + Sync {
    fn mappings_for(&self, object: &O) -> Vec<PropertyMapping>;
}

impl<O, F> MappingProvider<O> for F
where
    O: ?Sized,
    F: Fn(&O) -> Vec<PropertyMapping> + Send + Sync,
{
    fn mappings_for(&self, object: &O) -> Vec<PropertyMapping> {
        self(object)
    }
}

/// A file written by an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub property: String,
    /// Name to record on the owning object.
    pub name: String,
    /// Full path inside the backend.
    pub path: String,
}
