pub mod cache;
pub mod error;
pub mod listing;
pub mod metadata;
pub mod mime;
mod models;
mod path;
pub mod repository;
pub mod sidecar;

pub use crate::cache::DocumentCache;
pub use crate::models::{Document, Timestamp};
pub use crate::path::{parent_path, relative_destination, sanitize};
pub use crate::repository::{CachingFileSystemReader, FileSystemReader, FileSystemWriter};
pub use crate::repository::{RepositoryReader, RepositoryWriter};
