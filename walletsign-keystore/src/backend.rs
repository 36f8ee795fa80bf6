//! Storage engines for key stores.

use std::{
    fmt::{Debug, Formatter},
    path::{Path, PathBuf},
};

use log::{debug, error};
use zeroize::Zeroizing;

use crate::Error;

/// A set of insertions that is applied to a [`KeyValueStore`] as one unit.
#[derive(Default)]
pub struct WriteBatch {
    entries: Vec<(Vec<u8>, Zeroizing<Vec<u8>>)>,
}

impl WriteBatch {
    /// Creates a new, empty [`WriteBatch`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the insertion of `value` under `key`.
    ///
    /// A later insertion for the same `key` replaces an earlier one.
    pub fn insert(&mut self, key: Vec<u8>, value: Zeroizing<Vec<u8>>) {
        self.entries.push((key, value));
    }

    /// Returns the number of insertions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the batch contains no insertions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for WriteBatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBatch")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// A persistent mapping from byte keys to byte values.
pub trait KeyValueStore: Debug + Send + Sync {
    /// Inserts `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the storage engine fails.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error>;

    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the storage engine fails.
    fn get(&self, key: &[u8]) -> Result<Option<Zeroizing<Vec<u8>>>, Error>;

    /// Removes the value stored under `key`.
    ///
    /// Returns whether a value has been removed.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the storage engine fails.
    fn delete(&self, key: &[u8]) -> Result<bool, Error>;

    /// Applies all insertions of `batch` atomically.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the storage engine fails, in which case none of the
    /// insertions are applied.
    fn apply_batch(&self, batch: WriteBatch) -> Result<(), Error>;

    /// Persists all pending writes.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the storage engine fails.
    fn flush(&self) -> Result<(), Error>;
}

/// A [`KeyValueStore`] backed by a [`sled`] database.
///
/// The database directory is locked exclusively while the store is open.
pub struct SledStore {
    db: sled::Db,
    path: Option<PathBuf>,
}

impl SledStore {
    /// Opens the database at `path`, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the database can not be opened, e.g. because it is locked
    /// by another process.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|source| {
            error!("Opening key store at {} failed: {source}", path.display());
            Error::StoreIo {
                context: "opening the database",
                source,
            }
        })?;
        debug!("Opened key store at {}", path.display());

        Ok(Self {
            db,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a database that is removed when the store is dropped.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the database can not be created.
    pub fn temporary() -> Result<Self, Error> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|source| Error::StoreIo {
                context: "creating a temporary database",
                source,
            })?;

        Ok(Self { db, path: None })
    }

    /// Returns the database directory, unless the store is temporary.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Debug for SledStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("path", &self.path)
            .field("len", &self.db.len())
            .finish()
    }
}

impl KeyValueStore for SledStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.db
            .insert(key, value)
            .map(|_| ())
            .map_err(|source| Error::StoreIo {
                context: "inserting a value",
                source,
            })
    }

    fn get(&self, key: &[u8]) -> Result<Option<Zeroizing<Vec<u8>>>, Error> {
        self.db
            .get(key)
            .map(|value| value.map(|value| Zeroizing::new(value.to_vec())))
            .map_err(|source| Error::StoreIo {
                context: "reading a value",
                source,
            })
    }

    fn delete(&self, key: &[u8]) -> Result<bool, Error> {
        self.db
            .remove(key)
            .map(|value| value.is_some())
            .map_err(|source| Error::StoreIo {
                context: "removing a value",
                source,
            })
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<(), Error> {
        let mut sled_batch = sled::Batch::default();
        for (key, value) in batch.entries {
            sled_batch.insert(key, value.as_slice());
        }
        self.db
            .apply_batch(sled_batch)
            .map_err(|source| Error::StoreIo {
                context: "applying a batch",
                source,
            })
    }

    fn flush(&self) -> Result<(), Error> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|source| Error::StoreIo {
                context: "flushing the database",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn put_get_delete() -> TestResult {
        let store = SledStore::temporary()?;

        assert!(store.get(b"key")?.is_none());
        store.put(b"key", &[1, 2, 3])?;
        assert_eq!(store.get(b"key")?.as_deref(), Some(&vec![1, 2, 3]));
        store.put(b"key", &[4])?;
        assert_eq!(store.get(b"key")?.as_deref(), Some(&vec![4]));
        assert!(store.delete(b"key")?);
        assert!(!store.delete(b"key")?);
        assert!(store.get(b"key")?.is_none());
        Ok(())
    }

    #[test]
    fn batch_is_applied() -> TestResult {
        let store = SledStore::temporary()?;
        let mut batch = WriteBatch::new();
        batch.insert(b"a".to_vec(), Zeroizing::new(vec![1]));
        batch.insert(b"b".to_vec(), Zeroizing::new(vec![2]));
        assert_eq!(batch.len(), 2);

        store.apply_batch(batch)?;
        store.flush()?;

        assert_eq!(store.get(b"a")?.as_deref(), Some(&vec![1]));
        assert_eq!(store.get(b"b")?.as_deref(), Some(&vec![2]));
        Ok(())
    }

    #[test]
    fn reopened_store_keeps_values() -> TestResult {
        let dir = tempfile::tempdir()?;
        {
            let store = SledStore::open(dir.path())?;
            store.put(b"key", b"value")?;
            store.flush()?;
        }

        let store = SledStore::open(dir.path())?;
        assert_eq!(store.path(), Some(dir.path()));
        assert_eq!(store.get(b"key")?.as_deref(), Some(&b"value".to_vec()));
        Ok(())
    }
}
