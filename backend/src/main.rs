// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use quiz_backend::bank::QuestionBank;
use quiz_backend::config::{Config, StoreConfig};
use quiz_backend::routes;
use quiz_backend::state::AppState;
use quiz_backend::store::{MemoryResultsStore, PgResultsStore, ResultsStore, SheetsResultsStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let bank = match &config.question_bank_path {
        Some(path) => {
            tracing::info!("Loading question bank from {}", path.display());
            QuestionBank::from_json_file(path)?
        }
        None => QuestionBank::builtin()?,
    };
    tracing::info!("Question bank ready with {} questions", bank.size());

    let store = connect_store(&config.store).await?;

    let state = AppState::new(bank, store, config.clone());

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    // Start the server
    axum::serve(listener, app).await?;
    Ok(())
}

async fn connect_store(store: &StoreConfig) -> Result<Arc<dyn ResultsStore>, BoxError> {
    match store {
        StoreConfig::Memory => {
            tracing::warn!("No results store configured; results are kept in memory only");
            Ok(Arc::new(MemoryResultsStore::new()))
        }
        StoreConfig::Postgres { database_url } => {
            let pool = connect_pool(database_url).await?;

            // Run Migrations Automatically
            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied successfully.");

            Ok(Arc::new(PgResultsStore::new(pool)))
        }
        StoreConfig::Sheets(sheets) => {
            tracing::info!("Using spreadsheet {} as results store", sheets.spreadsheet_id);
            Ok(Arc::new(SheetsResultsStore::new(sheets)?))
        }
    }
}

/// Connects to Postgres, retrying while the database comes up.
async fn connect_pool(database_url: &str) -> Result<PgPool, BoxError> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return Ok(pool);
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    return Err(format!(
                        "Failed to connect to database after 5 retries: {}",
                        e
                    )
                    .into());
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
