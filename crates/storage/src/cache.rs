//! Pop-once side tables filled during enumeration.
//!
//! When the host enumerates a directory it usually follows up by fetching the
//! metadata (and maybe the content) of every document it was handed. Rather
//! than probing the filesystem a second time, the enumerator records what the
//! fetch will need here, keyed by the enumerated source directory and then by
//! document id. Every entry can be taken exactly once.

use crate::error::{ErrorKind, Result};
use crate::metadata::Metadata;
use dashmap::DashMap;
use std::path::PathBuf;

/// Content registered for a document but not opened yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinarySource {
    Pending { path: PathBuf, mime_type: String },
}

type Scoped<T> = DashMap<String, DashMap<String, T>>;

#[derive(Debug, Default)]
pub struct DocumentCache {
    metadata: Scoped<Metadata>,
    binaries: Scoped<BinarySource>,
}
impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_metadata(&self, scope: &str, id: impl Into<String>, metadata: Metadata) {
        self.metadata.entry(scope.to_string()).or_default().insert(id.into(), metadata);
    }

    pub fn insert_binary(&self, scope: &str, id: impl Into<String>, source: BinarySource) {
        self.binaries.entry(scope.to_string()).or_default().insert(id.into(), source);
    }

    /// Remove and return the metadata registered for `id`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotCached`] if nothing was registered, or it has already
    /// been taken.
    pub fn take_metadata(&self, scope: &str, id: &str) -> Result<Metadata> {
        take(&self.metadata, scope, id)
    }

    /// Remove and return the binary source registered for `id`. Same pop
    /// semantics as [`take_metadata()`](Self::take_metadata).
    pub fn take_binary(&self, scope: &str, id: &str) -> Result<BinarySource> {
        take(&self.binaries, scope, id)
    }

    /// Forget everything registered under `scope`.
    pub fn clear_scope(&self, scope: &str) {
        let metadata = self.metadata.remove(scope).map(|(_, m)| m.len()).unwrap_or(0);
        let binaries = self.binaries.remove(scope).map(|(_, b)| b.len()).unwrap_or(0);
        if metadata + binaries > 0 {
            tracing::debug!(scope, metadata, binaries, "Dropped stale cache entries");
        }
    }

    /// Number of entries (metadata and binaries together) still waiting to be
    /// taken under `scope`.
    pub fn len(&self, scope: &str) -> usize {
        let metadata = self.metadata.get(scope).map(|m| m.len()).unwrap_or(0);
        let binaries = self.binaries.get(scope).map(|b| b.len()).unwrap_or(0);
        metadata + binaries
    }

    pub fn is_empty(&self, scope: &str) -> bool {
        self.len(scope) == 0
    }
}

fn take<T>(table: &Scoped<T>, scope: &str, id: &str) -> Result<T> {
    // The shard guard from `get` must be released before anything else
    // touches `table`, so the removal happens in its own statement.
    let taken = table.get(scope).and_then(|entries| entries.remove(id));
    match taken {
        Some((_, value)) => Ok(value),
        None => exn::bail!(ErrorKind::NotCached(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FILE_NAME, MetadataValue};
    use std::sync::Arc;

    fn metadata(name: &str) -> Metadata {
        Metadata::from([(FILE_NAME.to_string(), MetadataValue::String(name.to_string()).into())])
    }

    #[test]
    fn test_take_metadata_pops() {
        let cache = DocumentCache::new();
        cache.insert_metadata("/src", "/src/a.txt", metadata("a.txt"));
        assert_eq!(cache.len("/src"), 1);
        assert_eq!(cache.take_metadata("/src", "/src/a.txt").unwrap(), metadata("a.txt"));
        let err = cache.take_metadata("/src", "/src/a.txt").unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotCached(id) if id == "/src/a.txt"));
        assert!(cache.is_empty("/src"));
    }

    #[test]
    fn test_take_binary_pops() {
        let cache = DocumentCache::new();
        let source = BinarySource::Pending { path: PathBuf::from("/src/a.txt"), mime_type: "text/plain".into() };
        cache.insert_binary("/src", "/src/a.txt", source.clone());
        assert_eq!(cache.take_binary("/src", "/src/a.txt").unwrap(), source);
        assert!(cache.take_binary("/src", "/src/a.txt").is_err());
    }

    #[test]
    fn test_scopes_are_separate() {
        let cache = DocumentCache::new();
        cache.insert_metadata("/one", "doc", metadata("one"));
        cache.insert_metadata("/two", "doc", metadata("two"));
        assert!(cache.take_metadata("/three", "doc").is_err());
        assert_eq!(cache.take_metadata("/two", "doc").unwrap(), metadata("two"));
        assert_eq!(cache.take_metadata("/one", "doc").unwrap(), metadata("one"));
    }

    #[test]
    fn test_clear_scope() {
        let cache = DocumentCache::new();
        cache.insert_metadata("/src", "a", metadata("a"));
        cache.insert_binary("/src", "a", BinarySource::Pending { path: "a".into(), mime_type: "text/plain".into() });
        cache.insert_metadata("/other", "b", metadata("b"));
        assert_eq!(cache.len("/src"), 2);
        cache.clear_scope("/src");
        assert!(cache.is_empty("/src"));
        assert_eq!(cache.len("/other"), 1);
        // Clearing an unknown scope is a no-op.
        cache.clear_scope("/nowhere");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_takes_pop_once() {
        let cache = Arc::new(DocumentCache::new());
        for i in 0..100 {
            cache.insert_metadata("/src", format!("doc-{i}"), metadata("x"));
        }
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                (0..100).filter(|i| cache.take_metadata("/src", &format!("doc-{i}")).is_ok()).count()
            }));
        }
        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 100);
        assert!(cache.is_empty("/src"));
    }
}
