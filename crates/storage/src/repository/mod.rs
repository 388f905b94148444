//! Repository traits and their filesystem implementations.
//!
//! A reader turns the configured `filePath` into a stream of [`Document`]s
//! and serves each document's metadata and content on request. A writer
//! goes the other way, persisting a document received from elsewhere along
//! with a sidecar file describing it.

mod caching;
mod local;
mod writer;

pub use self::caching::CachingFileSystemReader;
pub use self::local::FileSystemReader;
pub use self::writer::FileSystemWriter;
use crate::error::Result;
pub use crate::listing::DocumentStream;
use crate::metadata::Metadata;
use crate::models::Document;
use async_trait::async_trait;
use docfs_config::Parameters;
use futures::{Stream, TryStreamExt};
use std::fmt;
use std::io;
use std::pin::Pin;
use tokio::io::AsyncRead;

pub type BoxAsyncRead = Pin<Box<dyn AsyncRead + Send + 'static>>;
/// Inbound content for [`RepositoryWriter::write_document()`], in arrival order.
pub type ContentStream<'a, B> = Pin<Box<dyn Stream<Item = io::Result<B>> + Send + 'a>>;

/// Content of a document, ready to be read.
pub struct BinaryDetails {
    pub document_id: String,
    pub mime_type: String,
    pub content: BoxAsyncRead,
}
impl fmt::Debug for BinaryDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryDetails")
            .field("document_id", &self.document_id)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Read side of a document repository.
///
/// Document ids are the ones handed out by [`documents()`](Self::documents);
/// for the filesystem implementations they are plain paths.
///
/// # Examples
///
/// ```no_run
/// use futures::TryStreamExt;
/// use docfs_config::{Parameters, keys};
/// use docfs_storage::repository::{FileSystemReader, RepositoryReader};
/// # async fn example() -> docfs_storage::error::Result<()> {
/// let reader = FileSystemReader::new();
/// let params = Parameters::default().with(keys::FILE_PATH, "/srv/inbox");
/// let mut documents = reader.documents(&params);
/// while let Some(document) = documents.try_next().await? {
///     let metadata = reader.document_metadata(&document.id, &params).await?;
///     println!("{}: {} entries", document.name, metadata.len());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RepositoryReader: Send + Sync {
    /// Enumerate the configured `filePath`, honouring `startTime`/`endTime`.
    ///
    /// Parameter errors are reported as the first (and only) item.
    fn documents(&self, params: &Parameters) -> DocumentStream<'static>;

    /// Collect [`documents()`](Self::documents) into a [`Vec`].
    async fn all_documents(&self, params: &Parameters) -> Result<Vec<Document>> {
        self.documents(params).try_collect().await
    }

    /// Descriptor of a single document, or `None` if the date filter excludes it.
    async fn document(&self, id: &str, params: &Parameters) -> Result<Option<Document>>;

    async fn document_metadata(&self, id: &str, params: &Parameters) -> Result<Metadata>;

    /// Open a document's content.
    async fn document_binary(&self, id: &str, params: &Parameters) -> Result<BinaryDetails>;

    /// Remove a document (a file, or an empty directory).
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound),
    /// [`DirectoryNotEmpty`](crate::error::ErrorKind::DirectoryNotEmpty) or
    /// [`PermissionDenied`](crate::error::ErrorKind::PermissionDenied)
    /// naming the path when removal fails for those reasons.
    async fn delete_document(&self, id: &str, params: &Parameters) -> Result<()>;
}

/// Write side of a document repository.
#[async_trait]
pub trait RepositoryWriter: Send + Sync {
    /// Persist `document` with its `content` and `metadata`, returning the
    /// descriptor rewritten to point at where it landed.
    async fn write_document<B>(
        &self,
        document: Document,
        metadata: Metadata,
        content: ContentStream<'_, B>,
        params: &Parameters,
    ) -> Result<Document>
    where
        B: AsRef<[u8]> + Send + 'static;
}
