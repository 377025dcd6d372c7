//! Redb (Rust embedded database) backend for docapi document storage.
//!
//! Each collection maps to its own redb table (`&str` identity → JSON bytes).
//! Tables are created lazily by the first write; reads against a table that
//! does not exist yet behave like reads against an empty collection.
//!
//! # Configuration Example
//! ```yaml
//! database:
//!   connection_string: "redb:///data/docapi.redb"
//!   database_name: "docapi"
//! ```

use super::ScanVisitor;
use crate::{DocumentBackend, StoreError, StoreResult};
use redb::{
    Database, ReadOnlyTable, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition, TableError,
};
use std::path::Path;
use std::sync::Arc;

fn table(collection: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(collection)
}

fn backend_err(err: impl std::fmt::Display) -> StoreError {
    StoreError::backend(err.to_string())
}

/// Redb backend implementation for persistent document storage.
///
/// Every mutation runs in its own write transaction and is durable once the
/// call returns. The `Arc<Database>` is shared across threads; redb handles
/// its own locking and MVCC.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// # Example
    /// ```no_run
    /// use store::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/docapi.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path).map_err(backend_err)?;
        tracing::debug!("opened redb document store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open `collection` for reading; `None` when it was never written.
    fn read_table(
        &self,
        collection: &str,
    ) -> StoreResult<Option<ReadOnlyTable<&'static str, &'static [u8]>>> {
        let read_txn = self.db.begin_read().map_err(backend_err)?;
        match read_txn.open_table(table(collection)) {
            Ok(table) => Ok(Some(table)),
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(err) => Err(backend_err(err)),
        }
    }
}

impl DocumentBackend for RedbBackend {
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<()> {
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = write_txn.open_table(table(collection)).map_err(backend_err)?;
            let exists = table.get(id).map_err(backend_err)?.is_some();
            if exists {
                return Err(StoreError::DuplicateId {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            table.insert(id, document).map_err(backend_err)?;
        }
        write_txn.commit().map_err(backend_err)?;
        Ok(())
    }

    fn replace(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<bool> {
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        let matched = {
            let mut table = write_txn.open_table(table(collection)).map_err(backend_err)?;
            let exists = table.get(id).map_err(backend_err)?.is_some();
            if exists {
                table.insert(id, document).map_err(backend_err)?;
            }
            exists
        };
        if matched {
            write_txn.commit().map_err(backend_err)?;
        } else {
            write_txn.abort().map_err(backend_err)?;
        }
        Ok(matched)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Vec<u8>>> {
        let Some(table) = self.read_table(collection)? else {
            return Ok(None);
        };
        let value = table.get(id).map_err(backend_err)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        let removed = {
            let mut table = write_txn.open_table(table(collection)).map_err(backend_err)?;
            let removed = table.remove(id).map_err(backend_err)?.is_some();
            removed
        };
        write_txn.commit().map_err(backend_err)?;
        Ok(removed)
    }

    fn count(&self, collection: &str) -> StoreResult<u64> {
        match self.read_table(collection)? {
            Some(table) => table.len().map_err(backend_err),
            None => Ok(0),
        }
    }

    fn scan(&self, collection: &str, visitor: &mut ScanVisitor<'_>) -> StoreResult<()> {
        let Some(table) = self.read_table(collection)? else {
            return Ok(());
        };
        for item in table.iter().map_err(backend_err)? {
            let (_, value) = item.map_err(backend_err)?;
            if visitor(value.value())?.is_break() {
                break;
            }
        }
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        // Commits are synchronous; nothing is buffered between calls.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::ControlFlow;
    use tempfile::NamedTempFile;

    #[test]
    fn test_redb_backend_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.insert("users", "a", b"{\"n\":1}").unwrap();
        assert_eq!(
            backend.get("users", "a").unwrap(),
            Some(b"{\"n\":1}".to_vec())
        );
        assert_eq!(backend.get("users", "nope").unwrap(), None);
        assert_eq!(backend.get("never-written", "a").unwrap(), None);
    }

    #[test]
    fn test_redb_backend_duplicate_insert() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.insert("users", "a", b"1").unwrap();
        let err = backend.insert("users", "a", b"2").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(backend.get("users", "a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_redb_backend_replace_and_delete() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        assert!(!backend.replace("users", "a", b"1").unwrap());
        assert_eq!(backend.count("users").unwrap(), 0);

        backend.insert("users", "a", b"1").unwrap();
        assert!(backend.replace("users", "a", b"2").unwrap());
        assert_eq!(backend.get("users", "a").unwrap(), Some(b"2".to_vec()));

        assert!(backend.delete("users", "a").unwrap());
        assert!(!backend.delete("users", "a").unwrap());
        assert_eq!(backend.get("users", "a").unwrap(), None);
    }

    #[test]
    fn test_redb_backend_scan_and_count() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.insert("logs", "1", b"one").unwrap();
        backend.insert("logs", "2", b"two").unwrap();
        backend.insert("users", "1", b"other").unwrap();
        assert_eq!(backend.count("logs").unwrap(), 2);
        assert_eq!(backend.count("missing").unwrap(), 0);

        let mut collected = Vec::new();
        backend
            .scan("logs", &mut |value| {
                collected.push(value.to_vec());
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();

        assert_eq!(collected.len(), 2);
        assert!(collected.contains(&b"one".to_vec()));
        assert!(collected.contains(&b"two".to_vec()));
    }

    #[test]
    fn test_redb_backend_reopen_keeps_documents() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let backend = RedbBackend::open(temp_file.path()).unwrap();
            backend.insert("settings", "s", b"kept").unwrap();
        }
        let backend = RedbBackend::open(temp_file.path()).unwrap();
        assert_eq!(backend.get("settings", "s").unwrap(), Some(b"kept".to_vec()));
    }
}
