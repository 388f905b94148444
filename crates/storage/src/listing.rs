//! Directory enumeration.
//!
//! The source path is either a directory, in which case its immediate
//! children become documents, or anything else, in which case the path itself
//! is the only candidate. Candidates whose modification time falls outside
//! the requested [`TimeRange`] are skipped.

use crate::cache::{BinarySource, DocumentCache};
use crate::error::{ErrorKind, Result};
use crate::metadata::file_metadata;
use crate::mime::MimeLookup;
use crate::models::{Document, Timestamp};
use crate::path::parent_path;
use async_stream::stream;
use docfs_config::TimeRange;
use futures::Stream;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::fs;

pub type DocumentStream<'a> = Pin<Box<dyn Stream<Item = Result<Document>> + Send + 'a>>;

/// Where (and what) to record for each yielded document so that a later
/// fetch does not have to touch the filesystem again.
#[derive(Clone)]
pub struct CacheFill {
    pub cache: Arc<DocumentCache>,
    pub scope: String,
    pub include_binaries: bool,
}
impl CacheFill {
    fn register(&self, document: &Document) {
        let metadata = file_metadata(&document.name, document.size);
        self.cache.insert_metadata(&self.scope, document.id.clone(), metadata);
        if self.include_binaries {
            let source =
                BinarySource::Pending { path: PathBuf::from(&document.id), mime_type: document.mime_type.clone() };
            self.cache.insert_binary(&self.scope, document.id.clone(), source);
        }
    }
}

/// Lazily enumerate `source`.
///
/// The stream owns the directory handle; it is released when the stream is
/// exhausted or dropped. The first error ends the stream.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use futures::TryStreamExt;
/// use docfs_config::TimeRange;
/// use docfs_storage::listing::list_stream;
/// use docfs_storage::mime::ExtensionLookup;
/// # async fn example() -> docfs_storage::error::Result<()> {
/// let mut documents = list_stream("/srv/inbox".into(), TimeRange::default(), Arc::new(ExtensionLookup), None);
/// while let Some(document) = documents.try_next().await? {
///     println!("{} ({} bytes)", document.id, document.size);
/// }
/// # Ok(())
/// # }
/// ```
pub fn list_stream(
    source: PathBuf,
    range: TimeRange,
    mime: Arc<dyn MimeLookup>,
    fill: Option<CacheFill>,
) -> DocumentStream<'static> {
    Box::pin(stream! {
        let is_dir = match fs::metadata(&source).await {
            Ok(metadata) => metadata.is_dir(),
            Err(e) => {
                yield Err(exn::Exn::from(ErrorKind::from_io(e, &source)));
                return;
            },
        };

        if !is_dir {
            match describe(&source, mime.as_ref()).await {
                Ok(document) if range.contains(document.modified_millis()) => {
                    if let Some(fill) = &fill {
                        fill.register(&document);
                    }
                    yield Ok(document);
                },
                Ok(document) => tracing::debug!(id = %document.id, "Outside of date filter, skipped"),
                Err(e) => yield Err(e),
            }
            return;
        }

        let mut entries = match fs::read_dir(&source).await {
            Ok(entries) => entries,
            Err(e) => {
                yield Err(exn::Exn::from(ErrorKind::from_io(e, &source)));
                return;
            },
        };
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    yield Err(exn::Exn::from(ErrorKind::from_io(e, &source)));
                    return;
                },
            };
            match describe(&entry.path(), mime.as_ref()).await {
                Ok(document) if range.contains(document.modified_millis()) => {
                    if let Some(fill) = &fill {
                        fill.register(&document);
                    }
                    yield Ok(document);
                },
                Ok(document) => tracing::debug!(id = %document.id, "Outside of date filter, skipped"),
                Err(e) => {
                    yield Err(e);
                    return;
                },
            }
        }
    })
}

/// Probe `path` and build its descriptor.
///
/// Creation time is reported where the platform and filesystem support it;
/// elsewhere it falls back to the modification time.
pub(crate) async fn describe(path: &Path, mime: &dyn MimeLookup) -> Result<Document> {
    let metadata = fs::metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
    let (Some(id), Some(name)) = (path.to_str(), path.file_name().and_then(|n| n.to_str())) else {
        exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
    };
    let modified = metadata.modified().map_err(ErrorKind::Io)?;
    let created = match metadata.created() {
        Ok(created) => created,
        Err(e) if e.kind() == IoErrorKind::Unsupported => modified,
        Err(e) => exn::bail!(ErrorKind::Io(e)),
    };
    Ok(Document {
        id: id.to_string(),
        name: name.to_string(),
        created: Some(Timestamp::from(created)),
        modified: Some(Timestamp::from(modified)),
        mime_type: mime.mime_type(name),
        size: metadata.len(),
        parent_path: parent_path(path),
    })
}
