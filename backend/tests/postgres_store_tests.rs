// tests/postgres_store_tests.rs

use chrono::Utc;
use quiz_backend::{
    models::{question::Category, result_record::ResultRecord},
    store::{PgResultsStore, ResultsStore},
};
use sqlx::postgres::PgPoolOptions;

/// Connects to the database named by DATABASE_URL and applies migrations.
async fn connect() -> PgResultsStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    PgResultsStore::new(pool)
}

#[tokio::test]
#[ignore = "requires a Postgres database in DATABASE_URL"]
async fn append_then_read_all_keeps_insertion_order() {
    // Arrange
    let store = connect().await;
    let name = format!("ada_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let record = ResultRecord {
        candidate_name: name.clone(),
        raw_score: 30,
        accuracy_percent: 3.85,
        elapsed_seconds: 42,
        debug: 0,
        tracing: 1,
        concept: 0,
        ds: 0,
        xp: 33.85,
        achieved_skills: vec![Category::Tracing],
        completed_at: Utc::now(),
    };

    // Act
    store.append(&record).await.expect("append failed");
    store.append(&record).await.expect("second append failed");
    let all = store.read_all().await.expect("read_all failed");

    // Assert: no dedup, both rows come back last
    let mine: Vec<_> = all.iter().filter(|r| r.candidate_name == name).collect();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].raw_score, 30);
    assert_eq!(mine[0].achieved_skills, vec![Category::Tracing]);
    assert_eq!(all.last().map(|r| r.candidate_name.as_str()), Some(name.as_str()));
}
