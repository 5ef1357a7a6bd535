pub mod backend;
pub mod error;
pub mod mapping;
pub mod naming;
pub mod source;

pub use backend::{BackendError, BoxReader, Filesystem, Visibility, WriteOptions};
pub use error::StorageError;
pub use mapping::{MappingProvider, PropertyMapping, StoredFile};
pub use naming::{DirectoryStrategy, NamingStrategy};
pub use source::{LocalFile, MemoryFile, SourceFile};
