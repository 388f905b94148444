//! Stateless filesystem reader.
//!
//! Every fetch goes back to the filesystem, so metadata and content always
//! reflect what is on disk at the time of the call.

use crate::error::{ErrorKind, Result};
use crate::listing::{DocumentStream, describe, list_stream};
use crate::metadata::{Metadata, file_metadata};
use crate::mime::{ExtensionLookup, MimeLookup};
use crate::models::Document;
use crate::repository::{BinaryDetails, BoxAsyncRead, RepositoryReader};
use async_trait::async_trait;
use docfs_config::Parameters;
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

#[derive(Clone)]
pub struct FileSystemReader {
    mime: Arc<dyn MimeLookup>,
}
impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}
impl FileSystemReader {
    pub fn new() -> Self {
        Self::with_mime_lookup(Arc::new(ExtensionLookup))
    }

    pub fn with_mime_lookup(mime: Arc<dyn MimeLookup>) -> Self {
        Self { mime }
    }

    pub(crate) fn mime(&self) -> Arc<dyn MimeLookup> {
        Arc::clone(&self.mime)
    }

    /// Open `path` for reading. A file that has gone missing since it was
    /// enumerated reads as empty rather than failing the whole transfer.
    pub(crate) async fn open_binary(path: &Path, mime_type: String) -> Result<BinaryDetails> {
        let content: BoxAsyncRead = match fs::File::open(path).await {
            Ok(file) => Box::pin(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(path = %path.display(), "Document content not found, sending empty content");
                Box::pin(tokio::io::empty())
            },
            Err(e) => exn::bail!(ErrorKind::from_io(e, path)),
        };
        Ok(BinaryDetails { document_id: path.to_string_lossy().into_owned(), mime_type, content })
    }
}

#[async_trait]
impl RepositoryReader for FileSystemReader {
    fn documents(&self, params: &Parameters) -> DocumentStream<'static> {
        let settings = params.file_path().and_then(|source| Ok((source, params.date_filter()?)));
        match settings {
            Ok((source, range)) => list_stream(source, range, self.mime(), None),
            Err(e) => {
                let err: Result<Document> = Err(e).or_raise(|| ErrorKind::Parameters);
                Box::pin(futures::stream::once(async move { err }))
            },
        }
    }

    async fn document(&self, id: &str, params: &Parameters) -> Result<Option<Document>> {
        let range = params.date_filter().or_raise(|| ErrorKind::Parameters)?;
        let document = describe(Path::new(id), self.mime.as_ref()).await?;
        Ok(range.contains(document.modified_millis()).then_some(document))
    }

    async fn document_metadata(&self, id: &str, _params: &Parameters) -> Result<Metadata> {
        let document = describe(Path::new(id), self.mime.as_ref()).await?;
        Ok(file_metadata(&document.name, document.size))
    }

    async fn document_binary(&self, id: &str, _params: &Parameters) -> Result<BinaryDetails> {
        let path = Path::new(id);
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        Self::open_binary(path, self.mime.mime_type(&name)).await
    }

    async fn delete_document(&self, id: &str, params: &Parameters) -> Result<()> {
        let all_versions = params.delete_all_versions().or_raise(|| ErrorKind::Parameters)?;
        tracing::info!(id, all_versions, "Deleting document");
        let path = Path::new(id);
        let metadata = fs::symlink_metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        let removed = match metadata.is_dir() {
            true => fs::remove_dir(path).await,
            false => fs::remove_file(path).await,
        };
        removed.map_err(|e| ErrorKind::from_io(e, path))?;
        Ok(())
    }
}
