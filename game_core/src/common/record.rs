use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use typed_key::Key;

/// A flat set of named JSON fields.
///
/// Records are what the [Store](crate::store::Store) deals in: the fields of a
/// stored row, the fields of an update, and the equality filter selecting rows
/// are all records. Fields are addressed with [typed_key] keys so callers get
/// their values back already deserialized.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

#[derive(Clone, Debug, Error)]
pub enum RecordErr {
    #[error("error from serde_json in record: {0}")]
    SerdeError(#[from] Arc<serde_json::error::Error>),
    #[error("required record field not found [{0}]")]
    RequiredKeyNotFound(String),
}

impl From<serde_json::error::Error> for RecordErr {
    fn from(value: serde_json::error::Error) -> Self {
        Self::SerdeError(Arc::new(value))
    }
}

type Result<T> = std::result::Result<T, RecordErr>;

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder form of [Record::put], for filters and literal records.
    pub fn with<T: Serialize, B: Borrow<T>>(mut self, key: Key<T>, data: B) -> Result<Self> {
        self.put(key, data)?;
        Ok(self)
    }

    pub fn get_optional<T: for<'de> Deserialize<'de>>(&self, key: Key<T>) -> Result<Option<T>> {
        match self.0.get(key.name()) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(T::deserialize(value)?)),
        }
    }

    pub fn get_or_default<T: for<'de> Deserialize<'de> + Default>(&self, key: Key<T>) -> Result<T> {
        self.get_optional(key).map(|opt| opt.unwrap_or_default())
    }

    pub fn get_required<T: for<'de> Deserialize<'de>>(&self, key: Key<T>) -> Result<T> {
        if let Some(value) = self.0.get(key.name()) {
            Ok(T::deserialize(value)?)
        } else {
            Err(RecordErr::RequiredKeyNotFound(key.name().to_owned()))
        }
    }

    pub fn put<T: Serialize, B: Borrow<T>>(&mut self, key: Key<T>, data: B) -> Result<()> {
        let value = serde_json::to_value(data.borrow())?;
        self.0.insert(key.name().to_string(), value);
        Ok(())
    }

    /// True when every field of `filter` is present in this record with an
    /// equal value. An empty filter matches everything.
    pub fn matches(&self, filter: &Record) -> bool {
        filter
            .0
            .iter()
            .all(|(field, value)| self.0.get(field) == Some(value))
    }

    /// Overwrites this record's fields with those of `update`.
    pub fn merge(&mut self, update: &Record) {
        self.0
            .extend(update.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
