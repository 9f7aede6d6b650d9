//! Durable storage for extraction records.

#[cfg(feature = "native")]
mod sqlite;

#[cfg(feature = "native")]
pub use sqlite::{SqliteStore, TABLE};

use crate::error::StoreError;
use crate::models::card::{ExtractionRecord, PersistedRow};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A keyed record store.
///
/// Implementations reject a record whose (name, designation) pair is already
/// stored, and the check must be atomic with the write.
pub trait RecordStore {
    /// Store a record and return its new id.
    fn insert(&self, record: &ExtractionRecord) -> Result<i64>;

    /// All stored rows ordered by id.
    fn list(&self) -> Result<Vec<PersistedRow>>;

    /// Remove the row with `id`.
    fn delete_by_id(&self, id: i64) -> Result<()>;

    /// Fetch a single row.
    fn get(&self, id: i64) -> Result<Option<PersistedRow>> {
        Ok(self.list()?.into_iter().find(|row| row.id == id))
    }

    /// Number of stored rows.
    fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn insert(&self, record: &ExtractionRecord) -> Result<i64> {
        (**self).insert(record)
    }

    fn list(&self) -> Result<Vec<PersistedRow>> {
        (**self).list()
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        (**self).delete_by_id(id)
    }

    fn get(&self, id: i64) -> Result<Option<PersistedRow>> {
        (**self).get(id)
    }

    fn count(&self) -> Result<usize> {
        (**self).count()
    }
}
