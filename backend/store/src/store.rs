use std::collections::BTreeMap;

use async_trait::async_trait;
use shelfcount_core::{AggregateRecord, RecordUpdate, StoreError};
use tokio::sync::RwLock;

/// Name-keyed running tallies with CRUD access.
///
/// Every method is atomic with respect to concurrent callers. `upsert`
/// accumulates; `update` overwrites.
#[async_trait]
pub trait TallyStore: Send + Sync {
    /// Add `count` to the record named exactly `object_name`, creating it if absent.
    async fn upsert(&self, object_name: &str, count: u32) -> Result<AggregateRecord, StoreError>;

    async fn get(&self, id: i64) -> Result<AggregateRecord, StoreError>;

    /// All records in insertion order.
    async fn get_all(&self) -> Result<Vec<AggregateRecord>, StoreError>;

    /// Overwrite the given fields. Renaming onto another record's name is a conflict.
    async fn update(&self, id: i64, update: RecordUpdate) -> Result<AggregateRecord, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Reject names that could never have come out of the answer parser.
pub(crate) fn validate_name(object_name: &str) -> Result<(), StoreError> {
    if object_name.trim().is_empty() {
        return Err(StoreError::Invalid("object_name must not be empty".into()));
    }
    Ok(())
}

#[derive(Default)]
struct Tallies {
    last_id: i64,
    records: BTreeMap<i64, AggregateRecord>,
}

/// Process-local store for tests and throwaway runs.
#[derive(Default)]
pub struct InMemoryTallyStore {
    inner: RwLock<Tallies>,
}

impl InMemoryTallyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TallyStore for InMemoryTallyStore {
    async fn upsert(&self, object_name: &str, count: u32) -> Result<AggregateRecord, StoreError> {
        validate_name(object_name)?;
        let mut tallies = self.inner.write().await;

        if let Some(record) = tallies
            .records
            .values_mut()
            .find(|r| r.object_name == object_name)
        {
            record.count = record
                .count
                .checked_add(count)
                .ok_or_else(|| StoreError::Backend(format!("count overflow for {object_name:?}")))?;
            return Ok(record.clone());
        }

        tallies.last_id += 1;
        let record = AggregateRecord {
            id: tallies.last_id,
            count,
            object_name: object_name.to_string(),
        };
        tallies.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<AggregateRecord, StoreError> {
        let tallies = self.inner.read().await;
        tallies.records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn get_all(&self) -> Result<Vec<AggregateRecord>, StoreError> {
        let tallies = self.inner.read().await;
        Ok(tallies.records.values().cloned().collect())
    }

    async fn update(&self, id: i64, update: RecordUpdate) -> Result<AggregateRecord, StoreError> {
        let mut tallies = self.inner.write().await;
        if !tallies.records.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }

        if let Some(name) = &update.object_name {
            validate_name(name)?;
            if tallies
                .records
                .values()
                .any(|r| r.id != id && &r.object_name == name)
            {
                return Err(StoreError::Conflict(name.clone()));
            }
        }

        let record = tallies.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(count) = update.count {
            record.count = count;
        }
        if let Some(name) = update.object_name {
            record.object_name = name;
        }
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tallies = self.inner.write().await;
        tallies
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
