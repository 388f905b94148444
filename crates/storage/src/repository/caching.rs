//! Reader that answers fetches from what enumeration already saw.

use crate::cache::{BinarySource, DocumentCache};
use crate::error::{ErrorKind, Result};
use crate::listing::{CacheFill, DocumentStream, list_stream};
use crate::metadata::Metadata;
use crate::models::Document;
use crate::repository::{BinaryDetails, FileSystemReader, RepositoryReader};
use async_trait::async_trait;
use docfs_config::Parameters;
use exn::ResultExt;
use std::sync::Arc;

/// Caching counterpart of [`FileSystemReader`].
///
/// [`documents()`](RepositoryReader::documents) records the metadata (and,
/// with `includeBinaries`, the content location) of every document it yields.
/// Metadata and content fetches then pop those records instead of probing
/// the filesystem again, so each can be fetched once per enumeration.
/// Single-document lookups and deletes go straight to the filesystem.
#[derive(Clone)]
pub struct CachingFileSystemReader {
    inner: FileSystemReader,
    cache: Arc<DocumentCache>,
}
impl CachingFileSystemReader {
    pub fn new(cache: Arc<DocumentCache>) -> Self {
        Self { inner: FileSystemReader::new(), cache }
    }

    pub fn with_reader(inner: FileSystemReader, cache: Arc<DocumentCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    /// Scope key for the enumeration these parameters describe.
    fn scope(params: &Parameters) -> Result<String> {
        let source = params.file_path().or_raise(|| ErrorKind::Parameters)?;
        Ok(source.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl RepositoryReader for CachingFileSystemReader {
    fn documents(&self, params: &Parameters) -> DocumentStream<'static> {
        let settings = Self::scope(params).and_then(|scope| {
            let range = params.date_filter().or_raise(|| ErrorKind::Parameters)?;
            let include_binaries = params.include_binaries().or_raise(|| ErrorKind::Parameters)?;
            Ok((scope, range, include_binaries))
        });
        let (scope, range, include_binaries) = match settings {
            Ok(settings) => settings,
            Err(e) => return Box::pin(futures::stream::once(async move { Err::<Document, _>(e) })),
        };
        // A new pass replaces whatever an earlier one left unclaimed.
        self.cache.clear_scope(&scope);
        let fill = CacheFill { cache: Arc::clone(&self.cache), scope: scope.clone(), include_binaries };
        list_stream(scope.into(), range, self.inner.mime(), Some(fill))
    }

    async fn document(&self, id: &str, params: &Parameters) -> Result<Option<Document>> {
        self.inner.document(id, params).await
    }

    async fn document_metadata(&self, id: &str, params: &Parameters) -> Result<Metadata> {
        self.cache.take_metadata(&Self::scope(params)?, id)
    }

    async fn document_binary(&self, id: &str, params: &Parameters) -> Result<BinaryDetails> {
        match self.cache.take_binary(&Self::scope(params)?, id)? {
            BinarySource::Pending { path, mime_type } => FileSystemReader::open_binary(&path, mime_type).await,
        }
    }

    async fn delete_document(&self, id: &str, params: &Parameters) -> Result<()> {
        self.inner.delete_document(id, params).await
    }
}
