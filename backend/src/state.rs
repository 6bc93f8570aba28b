// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::Mutex;

use crate::{
    bank::QuestionBank,
    config::Config,
    engine::QuizEngine,
    models::session::SessionState,
    store::{ResultsAdapter, ResultsStore},
};

/// Shared handler state.
///
/// One process serves one candidate session at a time, so the session is a
/// single owned value behind a lock. `submit_gate` is the single-flight guard
/// for answer submission; reset never takes it.
#[derive(Clone)]
pub struct AppState {
    pub engine: QuizEngine,
    pub session: Arc<Mutex<SessionState>>,
    pub submit_gate: Arc<Mutex<()>>,
    pub results: ResultsAdapter,
    pub config: Config,
}

impl AppState {
    pub fn new(bank: QuestionBank, store: Arc<dyn ResultsStore>, config: Config) -> Self {
        Self {
            engine: QuizEngine::new(Arc::new(bank)),
            session: Arc::new(Mutex::new(SessionState::new())),
            submit_gate: Arc::new(Mutex::new(())),
            results: ResultsAdapter::new(store),
            config,
        }
    }
}

impl FromRef<AppState> for ResultsAdapter {
    fn from_ref(state: &AppState) -> Self {
        state.results.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
