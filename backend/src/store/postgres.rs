// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::{
    error::StoreError,
    models::result_record::{ResultRecord, parse_skills},
    store::ResultsStore,
};

/// Represents the 'quiz_results' table. Columns follow the sheet row order.
#[derive(Debug, FromRow)]
struct ResultRow {
    name: String,
    score: i64,
    accuracy: f64,
    elapsed_seconds: i64,
    debug: i32,
    tracing: i32,
    concept: i32,
    ds: i32,
    xp: f64,
    achieved_skills: String,
    completed_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for ResultRecord {
    type Error = StoreError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let count = |value: i32, column: &str| {
            u32::try_from(value).map_err(|_| {
                StoreError::MalformedRow(format!("negative {} count: {}", column, value))
            })
        };

        Ok(ResultRecord {
            raw_score: u32::try_from(row.score)
                .map_err(|_| StoreError::MalformedRow(format!("invalid score: {}", row.score)))?,
            accuracy_percent: row.accuracy,
            elapsed_seconds: u64::try_from(row.elapsed_seconds).map_err(|_| {
                StoreError::MalformedRow(format!("invalid elapsed seconds: {}", row.elapsed_seconds))
            })?,
            debug: count(row.debug, "Debug")?,
            tracing: count(row.tracing, "Tracing")?,
            concept: count(row.concept, "Concept")?,
            ds: count(row.ds, "DS")?,
            xp: row.xp,
            achieved_skills: parse_skills(&row.achieved_skills)?,
            completed_at: row.completed_at,
            candidate_name: row.name,
        })
    }
}

/// Narrows a record count to its INT column.
fn count_column(value: u32, column: &str) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::MalformedRow(format!("{} count too large: {}", column, value)))
}

fn seconds_column(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::MalformedRow(format!("elapsed seconds too large: {}", value)))
}

/// Results store backed by a Postgres table.
#[derive(Debug, Clone)]
pub struct PgResultsStore {
    pool: PgPool,
}

impl PgResultsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultsStore for PgResultsStore {
    async fn append(&self, record: &ResultRecord) -> Result<(), StoreError> {
        let elapsed_seconds = seconds_column(record.elapsed_seconds)?;
        let debug = count_column(record.debug, "Debug")?;
        let tracing_count = count_column(record.tracing, "Tracing")?;
        let concept = count_column(record.concept, "Concept")?;
        let ds = count_column(record.ds, "DS")?;

        sqlx::query(
            r#"
            INSERT INTO quiz_results
                (name, score, accuracy, elapsed_seconds, debug, tracing, concept, ds, xp, achieved_skills, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&record.candidate_name)
        .bind(i64::from(record.raw_score))
        .bind(record.accuracy_percent)
        .bind(elapsed_seconds)
        .bind(debug)
        .bind(tracing_count)
        .bind(concept)
        .bind(ds)
        .bind(record.xp)
        .bind(record.achieved_skills_csv())
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert quiz result: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ResultRecord>, StoreError> {
        let rows: Vec<ResultRow> = sqlx::query_as(
            r#"
            SELECT
                name, score, accuracy, elapsed_seconds,
                debug, tracing, concept, ds,
                xp, achieved_skills, completed_at
            FROM quiz_results
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .filter_map(|row| match ResultRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping stored result: {}", e);
                    None
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_counts_are_rejected_not_saturated() {
        assert_eq!(count_column(6, "Debug").unwrap(), 6);
        assert!(matches!(
            count_column(u32::MAX, "Debug"),
            Err(StoreError::MalformedRow(_))
        ));
        assert_eq!(seconds_column(300).unwrap(), 300);
        assert!(matches!(
            seconds_column(u64::MAX),
            Err(StoreError::MalformedRow(_))
        ));
    }

    #[test]
    fn test_negative_stored_count_is_malformed() {
        let row = ResultRow {
            name: "Ada".to_string(),
            score: 30,
            accuracy: 3.85,
            elapsed_seconds: 12,
            debug: -1,
            tracing: 1,
            concept: 0,
            ds: 0,
            xp: 33.85,
            achieved_skills: "Tracing".to_string(),
            completed_at: Utc::now(),
        };
        assert!(matches!(
            ResultRecord::try_from(row),
            Err(StoreError::MalformedRow(_))
        ));
    }
}
