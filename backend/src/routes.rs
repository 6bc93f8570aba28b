// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{health, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Nests the quiz routes under `/api/quiz`.
/// * Applies global middleware (Trace, CORS).
/// * Injects the shared state (engine, session, results store).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_session))
        .route("/session", get(quiz::get_session))
        .route("/question", get(quiz::current_question))
        .route("/answer", post(quiz::submit_answer))
        .route("/result", get(quiz::get_result))
        .route("/reset", post(quiz::reset_session))
        .route("/leaderboard", get(quiz::get_leaderboard));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/quiz", quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
