use crate::{StoreError, StoreResult};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

/// Visitor handed to [`DocumentBackend::scan`]. Returning `Break` stops the
/// scan early.
pub type ScanVisitor<'a> = dyn FnMut(&[u8]) -> StoreResult<ControlFlow<()>> + 'a;

/// Trait for a document storage backend.
/// Documents are opaque serialized bytes addressed by `(collection, id)`.
/// Implementations must be safe to share across threads; callers never add
/// their own locking on top.
pub trait DocumentBackend: Send + Sync {
    /// Insert a new document. Fails with [`StoreError::DuplicateId`] when the
    /// identity is already taken in that collection.
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<()>;
    /// Replace an existing document wholesale. Returns `false` and writes
    /// nothing when no document has that identity.
    fn replace(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<bool>;
    /// Retrieve a document by identity.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Vec<u8>>>;
    /// Delete a document. Returns whether anything was removed.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;
    /// Number of documents in the collection.
    fn count(&self, collection: &str) -> StoreResult<u64>;
    /// Visit every document in the collection, in no particular order.
    fn scan(&self, collection: &str, visitor: &mut ScanVisitor<'_>) -> StoreResult<()>;
    /// Flush any buffered writes to the backend.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use store::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // Redb file
/// let config = BackendConfig::redb("/data/docapi.redb");
///
/// // Parsed from a connection string
/// let config = BackendConfig::from_connection_string("memory://").unwrap();
/// assert!(matches!(config, BackendConfig::InMemory));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Persistent redb database at `path`.
    ///
    /// Requires the `backend-redb` feature (enabled by default).
    Redb { path: String },
    /// In-memory maps. Contents are lost when the process exits.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Interpret a connection string.
    ///
    /// `memory://` (or `memory`) selects the in-memory backend,
    /// `redb://<path>` selects redb; anything else is taken as a redb file
    /// path.
    pub fn from_connection_string(raw: &str) -> StoreResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(StoreError::backend("empty connection string"));
        }
        if raw == "memory" || raw == "memory://" {
            return Ok(BackendConfig::InMemory);
        }
        let path = raw.strip_prefix("redb://").unwrap_or(raw);
        if path.is_empty() {
            return Err(StoreError::backend("redb connection string has no path"));
        }
        Ok(BackendConfig::redb(path))
    }

    /// Build the backend. The returned handle is meant to be created once at
    /// startup and shared by every entity service.
    pub fn build(&self) -> StoreResult<Arc<dyn DocumentBackend>> {
        match self {
            BackendConfig::InMemory => Ok(Arc::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Arc::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

type Collection = HashMap<String, Vec<u8>>;

/// An in-memory backend using a `RwLock` around one map per collection.
#[derive(Default)]
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))
    }
}

impl DocumentBackend for InMemoryBackend {
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<()> {
        let mut guard = self.write()?;
        let docs = guard.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        docs.insert(id.to_string(), document.to_vec());
        Ok(())
    }

    fn replace(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<bool> {
        // Match and write under one lock so a concurrent delete can't slip in.
        let mut guard = self.write()?;
        match guard.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
            Some(slot) => {
                *slot = document.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Vec<u8>>> {
        let guard = self.read()?;
        Ok(guard.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut guard = self.write()?;
        Ok(guard
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }

    fn count(&self, collection: &str) -> StoreResult<u64> {
        let guard = self.read()?;
        Ok(guard.get(collection).map_or(0, |docs| docs.len() as u64))
    }

    fn scan(&self, collection: &str, visitor: &mut ScanVisitor<'_>) -> StoreResult<()> {
        let guard = self.read()?;
        if let Some(docs) = guard.get(collection) {
            for document in docs.values() {
                if visitor(document)?.is_break() {
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbBackend;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_parsing() {
        assert_eq!(
            BackendConfig::from_connection_string("memory://").unwrap(),
            BackendConfig::InMemory
        );
        assert_eq!(
            BackendConfig::from_connection_string("redb:///var/lib/docapi.redb").unwrap(),
            BackendConfig::redb("/var/lib/docapi.redb")
        );
        assert_eq!(
            BackendConfig::from_connection_string("data/docapi.redb").unwrap(),
            BackendConfig::redb("data/docapi.redb")
        );
        assert!(BackendConfig::from_connection_string("  ").is_err());
        assert!(BackendConfig::from_connection_string("redb://").is_err());
    }

    #[test]
    fn test_in_memory_insert_rejects_duplicate_id() {
        let backend = InMemoryBackend::new();
        backend.insert("users", "a", b"{}").unwrap();
        let err = backend.insert("users", "a", b"{}").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        // Same id in another collection is fine.
        backend.insert("logs", "a", b"{}").unwrap();
    }

    #[test]
    fn test_in_memory_replace_only_touches_existing() {
        let backend = InMemoryBackend::new();
        assert!(!backend.replace("users", "missing", b"1").unwrap());
        assert_eq!(backend.count("users").unwrap(), 0);

        backend.insert("users", "a", b"1").unwrap();
        assert!(backend.replace("users", "a", b"2").unwrap());
        assert_eq!(backend.get("users", "a").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_in_memory_scan_stops_on_break() {
        let backend = InMemoryBackend::new();
        for id in ["a", "b", "c"] {
            backend.insert("stats", id, id.as_bytes()).unwrap();
        }

        let mut seen = 0;
        backend
            .scan("stats", &mut |_| {
                seen += 1;
                Ok(ControlFlow::Break(()))
            })
            .unwrap();
        assert_eq!(seen, 1);

        let mut missing = 0;
        backend
            .scan("nothing-here", &mut |_| {
                missing += 1;
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();
        assert_eq!(missing, 0);
    }
}
