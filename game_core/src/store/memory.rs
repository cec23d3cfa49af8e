use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use typed_key::{typed_key, Key};

use super::{Collection, RecordErrUtils, Store, StoreError, StoreResult};
use crate::common::Record;

const ID: Key<u64> = typed_key!("id");

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Table {
    next_id: u64,
    rows: Vec<Record>,
}

/// Every collection's rows, in creation order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(super) struct Tables(BTreeMap<Collection, Table>);

impl Tables {
    pub(super) fn get(&self, collection: Collection, filter: &Record) -> Vec<Record> {
        self.0
            .get(&collection)
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|row| row.matches(filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(super) fn create(&mut self, collection: Collection, mut fields: Record) -> StoreResult<Record> {
        let table = self.0.entry(collection).or_default();
        table.next_id += 1;
        fields.put(ID, table.next_id).in_collection(collection)?;
        table.rows.push(fields.clone());
        Ok(fields)
    }

    /// Returns how many rows were updated.
    pub(super) fn set(&mut self, collection: Collection, filter: &Record, fields: &Record) -> usize {
        let Some(table) = self.0.get_mut(&collection) else {
            return 0;
        };
        let mut updated = 0;
        for row in table.rows.iter_mut().filter(|row| row.matches(filter)) {
            row.merge(fields);
            updated += 1;
        }
        updated
    }

    /// Returns how many rows were removed.
    pub(super) fn remove(&mut self, collection: Collection, filter: &Record) -> usize {
        let Some(table) = self.0.get_mut(&collection) else {
            return 0;
        };
        let before = table.rows.len();
        table.rows.retain(|row| !row.matches(filter));
        before - table.rows.len()
    }
}

/// A [Store] that forgets everything when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, collection: Collection, filter: &Record) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.get(collection, filter))
    }

    fn create(&self, collection: Collection, fields: Record) -> StoreResult<Record> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        tables.create(collection, fields)
    }

    fn set(&self, collection: Collection, filter: &Record, fields: Record) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let updated = tables.set(collection, filter, &fields);
        log::trace!("Updated {updated} rows in [{collection}]");
        Ok(())
    }

    fn remove(&self, collection: Collection, filter: &Record) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let removed = tables.remove(collection, filter);
        log::trace!("Removed {removed} rows from [{collection}]");
        Ok(())
    }
}
