// src/store/memory.rs

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::result_record::ResultRecord,
    store::ResultsStore,
};

/// Keeps results as positional rows in process memory.
///
/// Rows go through the same 11-column encoding as the remote sheet, so a
/// malformed row behaves here exactly as it would there.
#[derive(Debug, Default)]
pub struct MemoryResultsStore {
    rows: RwLock<Vec<Vec<Value>>>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds raw rows, e.g. rows written by an older schema revision.
    pub fn with_rows(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ResultsStore for MemoryResultsStore {
    async fn append(&self, record: &ResultRecord) -> Result<(), StoreError> {
        self.rows.write().await.push(record.to_row());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ResultRecord>, StoreError> {
        let rows = self.rows.read().await;
        let records = rows
            .iter()
            .filter_map(|row| match ResultRecord::from_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping stored row: {}", e);
                    None
                }
            })
            .collect();
        Ok(records)
    }
}
