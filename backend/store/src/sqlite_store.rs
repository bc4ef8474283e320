/// SQLite-backed durable tally store.
///
/// One `image_result` table, one row per distinct object name. The connection
/// sits behind an async mutex and every write runs in an IMMEDIATE transaction,
/// so the read-check-write of an upsert is a single atomic step even when other
/// processes share the database file.
use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use shelfcount_core::{AggregateRecord, RecordUpdate, StoreError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::store::{validate_name, TallyStore};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS image_result (
     id          INTEGER PRIMARY KEY AUTOINCREMENT,
     count       INTEGER NOT NULL CHECK (count >= 0),
     object_name TEXT NOT NULL UNIQUE
 );";

pub struct SqliteTallyStore {
    conn: Mutex<Connection>,
}

impl SqliteTallyStore {
    /// Create or open a database at the given path, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path.as_ref()).map_err(backend)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )
        .map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;

        info!("SqliteTallyStore opened at {:?}", path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _) if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<AggregateRecord> {
    Ok(AggregateRecord {
        id: row.get(0)?,
        count: row.get(1)?,
        object_name: row.get(2)?,
    })
}

#[async_trait]
impl TallyStore for SqliteTallyStore {
    async fn upsert(&self, object_name: &str, count: u32) -> Result<AggregateRecord, StoreError> {
        validate_name(object_name)?;
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(backend)?;

        let record = tx
            .query_row(
                "INSERT INTO image_result (object_name, count) VALUES (?1, ?2)
                 ON CONFLICT(object_name) DO UPDATE SET count = count + excluded.count
                 RETURNING id, count, object_name",
                params![object_name, count],
                row_to_record,
            )
            .map_err(backend)?;
        tx.commit().map_err(backend)?;

        debug!(id = record.id, object_name, total = record.count, "Upserted tally");
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<AggregateRecord, StoreError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, count, object_name FROM image_result WHERE id = ?1",
            params![id],
            row_to_record,
        )
        .optional()
        .map_err(backend)?
        .ok_or(StoreError::NotFound(id))
    }

    async fn get_all(&self) -> Result<Vec<AggregateRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id, count, object_name FROM image_result ORDER BY id ASC")
            .map_err(backend)?;
        let records = stmt
            .query_map([], row_to_record)
            .map_err(backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend)?;
        Ok(records)
    }

    async fn update(&self, id: i64, update: RecordUpdate) -> Result<AggregateRecord, StoreError> {
        if let Some(name) = &update.object_name {
            validate_name(name)?;
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(backend)?;

        let existing = tx
            .query_row(
                "SELECT id, count, object_name FROM image_result WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::NotFound(id))?;

        let record = AggregateRecord {
            id,
            count: update.count.unwrap_or(existing.count),
            object_name: update.object_name.unwrap_or(existing.object_name),
        };
        tx.execute(
            "UPDATE image_result SET count = ?1, object_name = ?2 WHERE id = ?3",
            params![record.count, record.object_name, id],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(record.object_name.clone())
            } else {
                backend(e)
            }
        })?;
        tx.commit().map_err(backend)?;

        debug!(id, "Updated tally");
        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM image_result WHERE id = ?1", params![id])
            .map_err(backend)?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!(id, "Deleted tally");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::conformance;

    fn store() -> SqliteTallyStore {
        SqliteTallyStore::in_memory().expect("in-memory db")
    }

    #[tokio::test]
    async fn test_accumulates_by_exact_name() {
        conformance::accumulates_by_exact_name(&store()).await;
    }

    #[tokio::test]
    async fn test_zero_count_creates_record() {
        conformance::zero_count_creates_record(&store()).await;
    }

    #[tokio::test]
    async fn test_update_overwrites() {
        conformance::update_overwrites(&store()).await;
    }

    #[tokio::test]
    async fn test_rename_conflict() {
        conformance::rename_into_existing_name_conflicts(&store()).await;
    }

    #[tokio::test]
    async fn test_missing_ids() {
        conformance::missing_ids_are_not_found(&store()).await;
    }

    #[tokio::test]
    async fn test_delete_is_final() {
        conformance::delete_is_final(&store()).await;
    }

    #[tokio::test]
    async fn test_rejects_empty_names() {
        conformance::rejects_empty_names(&store()).await;
    }

    #[tokio::test]
    async fn test_overflow_rolls_back() {
        conformance::overflow_leaves_record_untouched(&store()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts() {
        conformance::concurrent_upserts_do_not_lose_updates(Arc::new(store())).await;
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance").join("results.db");

        let deleted_id = {
            let store = SqliteTallyStore::open(&path).unwrap();
            store.upsert("Banana", 2).await.unwrap();
            store.upsert("Banana", 3).await.unwrap();
            let gone = store.upsert("Apple", 1).await.unwrap();
            store.delete(gone.id).await.unwrap();
            gone.id
        };

        let store = SqliteTallyStore::open(&path).unwrap();
        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!((all[0].object_name.as_str(), all[0].count), ("Banana", 5));

        // AUTOINCREMENT never hands a deleted id out again.
        let fresh = store.upsert("Apple", 1).await.unwrap();
        assert!(fresh.id > deleted_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_handles_on_one_file_share_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.db");
        let a = Arc::new(SqliteTallyStore::open(&path).unwrap());
        let b = Arc::new(SqliteTallyStore::open(&path).unwrap());

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = if i % 2 == 0 { a.clone() } else { b.clone() };
            handles.push(tokio::spawn(async move { store.upsert("Egg", 1).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = a.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].count, 20);
    }
}
