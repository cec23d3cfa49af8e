//! Record storage.
//!
//! The game never owns its persistent state; it reads and writes [Record]s
//! through a [Store]. Two stores ship with the crate: [MemoryStore] for tests
//! and throwaway games, and [JsonFileStore] which survives restarts.

mod file;
mod memory;

use std::fmt::{self, Display};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::common::{Record, RecordErr};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Games,
    SessionScores,
    Leaderboard,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Games => "games",
            Collection::SessionScores => "sessionScores",
            Collection::Leaderboard => "leaderboard",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Error)]
pub enum StoreError {
    #[error("store io failure: {0}")]
    Io(#[from] Arc<std::io::Error>),
    #[error("store serialization failure: {0}")]
    Serde(#[from] Arc<serde_json::Error>),
    #[error("malformed record in [{collection}]: {source}")]
    Record {
        collection: Collection,
        #[source]
        source: RecordErr,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(Arc::new(value))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Attaches the collection a record came from to record errors.
pub trait RecordErrUtils<T> {
    fn in_collection(self, collection: Collection) -> StoreResult<T>;
}

impl<T> RecordErrUtils<T> for Result<T, RecordErr> {
    fn in_collection(self, collection: Collection) -> StoreResult<T> {
        self.map_err(|source| StoreError::Record { collection, source })
    }
}

/// A keyed record store.
///
/// Filters are records too: a row matches when it has every field of the
/// filter with an equal value. Rows come back in creation order.
pub trait Store: Send + Sync {
    fn get(&self, collection: Collection, filter: &Record) -> StoreResult<Vec<Record>>;

    /// Stores `fields` as a new row and returns it with its assigned `id`.
    fn create(&self, collection: Collection, fields: Record) -> StoreResult<Record>;

    /// Merges `fields` into every row matching `filter`.
    fn set(&self, collection: Collection, filter: &Record, fields: Record) -> StoreResult<()>;

    fn remove(&self, collection: Collection, filter: &Record) -> StoreResult<()>;
}

impl<S: Store + ?Sized> Store for &S {
    fn get(&self, collection: Collection, filter: &Record) -> StoreResult<Vec<Record>> {
        (**self).get(collection, filter)
    }

    fn create(&self, collection: Collection, fields: Record) -> StoreResult<Record> {
        (**self).create(collection, fields)
    }

    fn set(&self, collection: Collection, filter: &Record, fields: Record) -> StoreResult<()> {
        (**self).set(collection, filter, fields)
    }

    fn remove(&self, collection: Collection, filter: &Record) -> StoreResult<()> {
        (**self).remove(collection, filter)
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, collection: Collection, filter: &Record) -> StoreResult<Vec<Record>> {
        (**self).get(collection, filter)
    }

    fn create(&self, collection: Collection, fields: Record) -> StoreResult<Record> {
        (**self).create(collection, fields)
    }

    fn set(&self, collection: Collection, filter: &Record, fields: Record) -> StoreResult<()> {
        (**self).set(collection, filter, fields)
    }

    fn remove(&self, collection: Collection, filter: &Record) -> StoreResult<()> {
        (**self).remove(collection, filter)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, collection: Collection, filter: &Record) -> StoreResult<Vec<Record>> {
        (**self).get(collection, filter)
    }

    fn create(&self, collection: Collection, fields: Record) -> StoreResult<Record> {
        (**self).create(collection, fields)
    }

    fn set(&self, collection: Collection, filter: &Record, fields: Record) -> StoreResult<()> {
        (**self).set(collection, filter, fields)
    }

    fn remove(&self, collection: Collection, filter: &Record) -> StoreResult<()> {
        (**self).remove(collection, filter)
    }
}
