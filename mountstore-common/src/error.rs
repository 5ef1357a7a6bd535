use crate::backend::BackendError;

/// Errors surfaced by storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Backend not found: {0}")]
    BackendNotFound(String),
    #[error("No mapping for property: {0}")]
    MappingNotFound(String),
    #[error("Source file {name} is unreadable: {source}")]
    SourceUnreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// The backend error behind this failure, if it came from a backend.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            StorageError::Backend(e) => Some(e),
            _ => None,
        }
    }
}
