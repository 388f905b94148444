//! Filesystem writer.
//!
//! Documents land at `<filePath>/<sanitized parent path>/<name>`, next to a
//! sidecar holding their metadata. The parent path is always resolved inside
//! `filePath`, whatever the source repository sent.

use crate::error::{ErrorKind, Result};
use crate::metadata::Metadata;
use crate::models::Document;
use crate::path::{relative_destination, sanitize};
use crate::repository::{ContentStream, RepositoryWriter};
use crate::sidecar::{SidecarFormat, sidecar_path, write_sidecar};
use async_trait::async_trait;
use docfs_config::Parameters;
use exn::ResultExt;
use futures::TryStreamExt;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemWriter;

impl FileSystemWriter {
    pub fn new() -> Self {
        Self
    }

    /// Where `document` will be written under `root`.
    pub fn destination(root: &Path, document: &Document) -> Result<PathBuf> {
        let mut name = Path::new(&document.name).components();
        match (name.next(), name.next()) {
            (Some(Component::Normal(_)), None) => {},
            _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(&document.name))),
        }
        Ok(root.join(relative_destination(&sanitize(&document.parent_path))).join(&document.name))
    }
}

#[async_trait]
impl RepositoryWriter for FileSystemWriter {
    async fn write_document<B>(
        &self,
        document: Document,
        metadata: Metadata,
        content: ContentStream<'_, B>,
        params: &Parameters,
    ) -> Result<Document>
    where
        B: AsRef<[u8]> + Send + 'static,
    {
        let root = params.file_path().or_raise(|| ErrorKind::Parameters)?;
        let format = SidecarFormat::from_xml_flag(params.metadata_as_xml().or_raise(|| ErrorKind::Parameters)?);
        let destination = Self::destination(&root, &document)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ErrorKind::from_io(e, parent))?;
        }
        let mut file = fs::File::create(&destination).await.map_err(|e| ErrorKind::from_io(e, &destination))?;

        let written = copy_content(&mut file, content).await.map_err(|e| ErrorKind::from_io(e, &destination));
        match &written {
            Ok(bytes) => tracing::debug!(path = %destination.display(), bytes, "Wrote document content"),
            Err(e) => tracing::error!(path = %destination.display(), error = %e, "Failed to write document content"),
        }
        // The sidecar is written even when the content is incomplete.
        let sidecar = write_sidecar(&destination, &metadata, format).await;
        if let Err(e) = &sidecar {
            let path = sidecar_path(&destination, format);
            tracing::error!(path = %path.display(), error = ?e, "Failed to write metadata sidecar");
        }
        if let Err(e) = file.shutdown().await {
            tracing::warn!(path = %destination.display(), error = %e, "Failed to close document");
        }
        drop(file);
        written?;
        sidecar?;

        let absolute = std::path::absolute(&destination).map_err(|e| ErrorKind::from_io(e, &destination))?;
        let (Some(id), Some(parent)) = (absolute.to_str(), absolute.parent().and_then(Path::to_str)) else {
            exn::bail!(ErrorKind::InvalidPath(absolute));
        };
        tracing::info!(id, "Document written");
        Ok(Document { id: id.to_string(), parent_path: parent.to_string(), ..document })
    }
}

async fn copy_content<B: AsRef<[u8]>>(file: &mut fs::File, mut content: ContentStream<'_, B>) -> std::io::Result<u64> {
    let mut written = 0;
    while let Some(chunk) = content.try_next().await? {
        let chunk = chunk.as_ref();
        file.write_all(chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}
