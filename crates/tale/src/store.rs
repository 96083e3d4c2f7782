// Counter Store - Function name counters persisted in a redb database
//
// Every increment runs in its own write transaction. redb serializes write
// transactions, so concurrent exports never receive the same counter value.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use tale_export::{CounterError, FunctionCounterStore};
use tracing::{debug, info};

// Key is "project_id/category", value is the last allocated counter
const COUNTER_TABLE: TableDefinition<&str, u64> = TableDefinition::new("function_counters");

/// Counter store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Counter overflow for {0}")]
    Overflow(String),
}

impl From<StoreError> for CounterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overflow(key) => CounterError::Overflow(key),
            other => CounterError::Unavailable(other.to_string()),
        }
    }
}

/// Function counters backed by redb
#[derive(Clone)]
pub struct RedbCounterStore {
    db: Arc<Database>,
}

impl RedbCounterStore {
    /// Open or create the database, creating parent directories as needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path).map_err(|e| StoreError::Database(format!("Failed to open database: {}", e)))?;

        // Ensure table exists
        let write_txn = db.begin_write().map_err(|e| StoreError::Database(e.to_string()))?;
        write_txn
            .open_table(COUNTER_TABLE)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        write_txn.commit().map_err(|e| StoreError::Database(e.to_string()))?;

        info!("Counter store opened (db: {})", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    /// Last allocated value of a counter, 0 if never incremented
    pub fn current(&self, project_id: &str, category: &str) -> Result<u64, StoreError> {
        let key = counter_key(project_id, category);
        let read_txn = self.db.begin_read().map_err(|e| StoreError::Database(e.to_string()))?;
        let table = read_txn
            .open_table(COUNTER_TABLE)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let value = table
            .get(key.as_str())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|v| v.value())
            .unwrap_or(0);
        Ok(value)
    }

    fn increment(db: &Database, key: &str) -> Result<u64, StoreError> {
        let write_txn = db.begin_write().map_err(|e| StoreError::Database(e.to_string()))?;
        let next = {
            let mut table = write_txn
                .open_table(COUNTER_TABLE)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            let current = table
                .get(key)
                .map_err(|e| StoreError::Database(e.to_string()))?
                .map(|v| v.value())
                .unwrap_or(0);
            let next = current
                .checked_add(1)
                .ok_or_else(|| StoreError::Overflow(key.to_string()))?;
            table
                .insert(key, next)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            next
        };
        write_txn.commit().map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(next)
    }
}

#[async_trait]
impl FunctionCounterStore for RedbCounterStore {
    async fn next_value(&self, project_id: &str, category: &str) -> Result<u64, CounterError> {
        let db = self.db.clone();
        let key = counter_key(project_id, category);

        let value = tokio::task::spawn_blocking(move || Self::increment(&db, &key))
            .await
            .map_err(|e| CounterError::Unavailable(e.to_string()))??;

        debug!(project_id, category, value, "Allocated counter value");
        Ok(value)
    }
}

fn counter_key(project_id: &str, category: &str) -> String {
    format!("{}/{}", project_id, category)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
