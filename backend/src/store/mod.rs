// src/store/mod.rs

pub mod memory;
pub mod postgres;
pub mod sheets;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::result_record::{LeaderboardEntry, ResultRecord},
};

pub use memory::MemoryResultsStore;
pub use postgres::PgResultsStore;
pub use sheets::SheetsResultsStore;

/// Append-only persistence for completed sessions, doubling as the
/// leaderboard source. No dedup key: replaying a session appends again.
#[async_trait]
pub trait ResultsStore: Send + Sync {
    async fn append(&self, record: &ResultRecord) -> Result<(), StoreError>;

    /// Every stored record in the store's natural (insertion) order.
    async fn read_all(&self) -> Result<Vec<ResultRecord>, StoreError>;
}

/// Boundary between the quiz and a [`ResultsStore`].
///
/// Store errors stop here: `append` reports a flag, `read_all` degrades to
/// an empty list. Nothing is retried.
#[derive(Clone)]
pub struct ResultsAdapter {
    store: Arc<dyn ResultsStore>,
}

impl ResultsAdapter {
    pub fn new(store: Arc<dyn ResultsStore>) -> Self {
        Self { store }
    }

    /// Returns `false` when the write failed; the record itself is untouched.
    pub async fn append(&self, record: &ResultRecord) -> bool {
        match self.store.append(record).await {
            Ok(()) => {
                tracing::info!(candidate = %record.candidate_name, xp = record.xp, "Result appended");
                true
            }
            Err(e) => {
                tracing::warn!(
                    candidate = %record.candidate_name,
                    "Failed to append result: {}",
                    e
                );
                false
            }
        }
    }

    pub async fn read_all(&self) -> Vec<ResultRecord> {
        match self.store.read_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to read results, showing empty leaderboard: {}", e);
                Vec::new()
            }
        }
    }

    /// Top `limit` records by XP, highest first. Ties keep store order.
    pub async fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        rank(self.read_all().await, limit)
    }
}

pub(crate) fn rank(mut records: Vec<ResultRecord>, limit: usize) -> Vec<LeaderboardEntry> {
    // sort_by is stable, so equal XP keeps insertion order.
    records.sort_by(|a, b| b.xp.total_cmp(&a.xp));
    records
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, record)| LeaderboardEntry { rank: i + 1, record })
        .collect()
}
