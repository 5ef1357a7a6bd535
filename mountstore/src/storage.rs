//! Upload, removal and lookup of mapped files.
//!
//! [`MountStorage`] asks its [`MappingProvider`] where each file slot of an
//! object lives, resolves the slot's backend in the [`BackendRegistry`] and
//! performs the operation there. It keeps no state between calls.
//!
//! Slots without a pending file are skipped on upload, and slots without a
//! recorded name are skipped on removal. Deleting a file the backend does not
//! have is not an error.

use tracing::debug;

use mountstore_common::{
    BoxReader, MappingProvider, PropertyMapping, StorageError, StoredFile, WriteOptions,
};

use crate::registry::BackendRegistry;

pub struct MountStorage<P> {
    provider: P,
    registry: BackendRegistry,
}

impl<P> MountStorage<P> {
    pub fn new(provider: P, registry: BackendRegistry) -> Self {
        Self { provider, registry }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Upload the pending file of one mapping.
    ///
    /// Returns `None` when the mapping has no pending file. The source stream
    /// is dropped before this returns, whether or not the write succeeded.
    pub async fn upload_mapping(
        &self,
        mapping: &PropertyMapping,
    ) -> Result<Option<StoredFile>, StorageError> {
        let Some(file) = mapping.file.as_ref() else {
            debug!(property = %mapping.property, "No pending file, skipping upload");
            return Ok(None);
        };
        let backend = self.registry.resolve(&mapping.upload_destination)?;

        let name = mapping.upload_name(file.as_ref());
        let path = mapping.path_for(&name);
        let guessed = || {
            mime_guess::from_path(file.original_name())
                .first_raw()
                .map(str::to_string)
        };
        let options = WriteOptions {
            content_type: mapping
                .write_options
                .content_type
                .clone()
                .or_else(|| file.mime_type().map(str::to_string))
                .or_else(guessed),
            ..mapping.write_options.clone()
        };

        let mut reader = file.open().await.map_err(|source| StorageError::SourceUnreadable {
            name: file.original_name().to_string(),
            source,
        })?;
        let written = backend.write_stream(&path, &mut *reader, &options).await;
        drop(reader);
        written?;

        debug!(
            property = %mapping.property,
            destination = %mapping.upload_destination,
            path = %path,
            "Upload complete"
        );
        Ok(Some(StoredFile {
            property: mapping.property.clone(),
            name,
            path,
        }))
    }

    /// Delete the recorded file of one mapping. Missing files are ignored.
    pub async fn remove_mapping(&self, mapping: &PropertyMapping) -> Result<(), StorageError> {
        let backend = self.registry.resolve(&mapping.upload_destination)?;
        let Some(path) = mapping.stored_path() else {
            debug!(property = %mapping.property, "No recorded file, skipping removal");
            return Ok(());
        };

        match backend.delete(&path).await {
            Ok(()) => {
                debug!(destination = %mapping.upload_destination, path = %path, "Removed file");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(
                    destination = %mapping.upload_destination,
                    path = %path,
                    "File already absent"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_path_mapping(
        &self,
        mapping: &PropertyMapping,
    ) -> Result<Option<String>, StorageError> {
        let backend = self.registry.resolve(&mapping.upload_destination)?;
        let Some(path) = mapping.stored_path() else {
            return Ok(None);
        };
        Ok(backend.has(&path).await?.then_some(path))
    }

    async fn resolve_stream_mapping(
        &self,
        mapping: &PropertyMapping,
    ) -> Result<Option<BoxReader>, StorageError> {
        let backend = self.registry.resolve(&mapping.upload_destination)?;
        let Some(path) = mapping.stored_path() else {
            return Ok(None);
        };
        match backend.read_stream(&path).await {
            Ok(reader) => Ok(Some(reader)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl<P> MountStorage<P> {
    fn mapping<O: ?Sized>(
        &self,
        object: &O,
        property: &str,
    ) -> Result<PropertyMapping, StorageError>
    where
        P: MappingProvider<O>,
    {
        self.provider
            .mappings_for(object)
            .into_iter()
            .find(|m| m.property == property)
            .ok_or_else(|| StorageError::MappingNotFound(property.to_string()))
    }

    /// Upload the pending file of one property of `object`.
    pub async fn upload<O: ?Sized>(
        &self,
        object: &O,
        property: &str,
    ) -> Result<Option<StoredFile>, StorageError>
    where
        P: MappingProvider<O>,
    {
        let mapping = self.mapping(object, property)?;
        self.upload_mapping(&mapping).await
    }

    /// Upload every pending file of `object`, in mapping order.
    ///
    /// Stops at the first failure; files uploaded before it stay in place.
    pub async fn upload_all<O: ?Sized>(&self, object: &O) -> Result<Vec<StoredFile>, StorageError>
    where
        P: MappingProvider<O>,
    {
        let mut stored = Vec::new();
        for mapping in self.provider.mappings_for(object) {
            if let Some(file) = self.upload_mapping(&mapping).await? {
                stored.push(file);
            }
        }
        Ok(stored)
    }

    pub async fn remove<O: ?Sized>(&self, object: &O, property: &str) -> Result<(), StorageError>
    where
        P: MappingProvider<O>,
    {
        let mapping = self.mapping(object, property)?;
        self.remove_mapping(&mapping).await
    }

    pub async fn remove_all<O: ?Sized>(&self, object: &O) -> Result<(), StorageError>
    where
        P: MappingProvider<O>,
    {
        for mapping in self.provider.mappings_for(object) {
            self.remove_mapping(&mapping).await?;
        }
        Ok(())
    }

    /// Path of the stored file inside its backend, if the backend has it.
    pub async fn resolve_path<O: ?Sized>(
        &self,
        object: &O,
        property: &str,
    ) -> Result<Option<String>, StorageError>
    where
        P: MappingProvider<O>,
    {
        let mapping = self.mapping(object, property)?;
        self.resolve_path_mapping(&mapping).await
    }

    /// Open the stored file for reading, if the backend has it.
    pub async fn resolve_stream<O: ?Sized>(
        &self,
        object: &O,
        property: &str,
    ) -> Result<Option<BoxReader>, StorageError>
    where
        P: MappingProvider<O>,
    {
        let mapping = self.mapping(object, property)?;
        self.resolve_stream_mapping(&mapping).await
    }

    /// Public URI of the stored file. Does not check the backend has it.
    pub fn resolve_uri<O: ?Sized>(
        &self,
        object: &O,
        property: &str,
    ) -> Result<Option<String>, StorageError>
    where
        P: MappingProvider<O>,
    {
        let mapping = self.mapping(object, property)?;
        self.registry.resolve(&mapping.upload_destination)?;
        Ok(mapping.uri())
    }

    pub async fn exists<O: ?Sized>(&self, object: &O, property: &str) -> Result<bool, StorageError>
    where
        P: MappingProvider<O>,
    {
        Ok(self.resolve_path(object, property).await?.is_some())
    }
}
