// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::{
    config::{Config, MAX_LEADERBOARD_LIMIT},
    engine::SubmitOutcome,
    error::AppError,
    models::{
        question::PublicQuestion,
        result_record::{LeaderboardParams, ResultRecord, StartRequest, SubmitAnswerRequest},
        session::SessionSnapshot,
    },
    state::AppState,
    store::ResultsAdapter,
};

/// Response body for an answer submission.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub session: SessionSnapshot,
    /// Present only when this answer completed the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultRecord>,
    /// Whether the result reached the results store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Starts a session for the named candidate and starts the clock.
///
/// Returns 400 for an empty name, 409 if a session is already running.
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut session = state.session.lock().await;
    let now = Utc::now();
    state.engine.start(&mut session, &payload.name, now)?;

    Ok((
        StatusCode::CREATED,
        Json(session.snapshot(state.engine.total_questions(), now)),
    ))
}

/// Current progress and elapsed time. Polled by the client timer.
pub async fn get_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.session.lock().await;
    Ok(Json(
        session.snapshot(state.engine.total_questions(), Utc::now()),
    ))
}

/// The question awaiting an answer, without its correct answer.
pub async fn current_question(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.session.lock().await;
    let item = state.engine.current_question(&session)?;

    Ok(Json(PublicQuestion::from_item(
        session.current_index(),
        state.engine.total_questions(),
        item,
    )))
}

/// Submits an answer for the current question.
///
/// * Rejects a missing selection before touching the session.
/// * Only one submission may be in flight; a concurrent one gets 409.
/// * On the last question, appends the result to the results store. A
///   failed append is reported as a warning; the session stays complete.
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let choice = payload
        .choice
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Select an answer first.".to_string()))?;

    let _in_flight = state
        .submit_gate
        .try_lock()
        .map_err(|_| AppError::Conflict("An answer is already being submitted.".to_string()))?;

    let (outcome, snapshot) = {
        let mut session = state.session.lock().await;
        let now = Utc::now();
        let outcome = state.engine.submit_answer(&mut session, &choice, now)?;
        (outcome, session.snapshot(state.engine.total_questions(), now))
    };

    let (result, synced) = match outcome {
        SubmitOutcome::Advanced { .. } => (None, None),
        SubmitOutcome::Completed(record) => {
            let results = state.results.clone();
            let to_store = record.clone();
            // Runs detached so neither a reset nor a dropped client aborts the write.
            let synced = tokio::spawn(async move { results.append(&to_store).await })
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Result append task failed: {:?}", e);
                    false
                });
            (Some(record), Some(synced))
        }
    };

    let warning = match synced {
        Some(false) => Some("sync failed".to_string()),
        _ => None,
    };

    Ok(Json(SubmitAnswerResponse {
        session: snapshot,
        result,
        synced,
        warning,
    }))
}

/// The record of the completed session.
pub async fn get_result(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.session.lock().await;
    let record = session
        .result()
        .cloned()
        .ok_or(AppError::Conflict("Session is not complete".to_string()))?;

    Ok(Json(record))
}

/// Discards the session unconditionally. Does not wait for in-flight appends.
pub async fn reset_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut session = state.session.lock().await;
    state.engine.reset(&mut session);
    tracing::info!("Session reset");

    Ok(Json(
        session.snapshot(state.engine.total_questions(), Utc::now()),
    ))
}

/// Retrieves the top results by XP. An unreachable store yields an empty list.
pub async fn get_leaderboard(
    State(results): State<ResultsAdapter>,
    State(config): State<Config>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(config.leaderboard_limit)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    Ok(Json(results.leaderboard(limit).await))
}
