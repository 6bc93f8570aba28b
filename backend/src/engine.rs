// src/engine.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    bank::QuestionBank,
    error::QuizError,
    models::{
        question::{Category, QuestionItem},
        result_record::ResultRecord,
        session::{Phase, SessionState},
    },
};

/// What happened after an answer was accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The session moved on to the question at `next_index`.
    Advanced { next_index: usize },
    /// The last question was answered; the record is emitted exactly once.
    Completed(ResultRecord),
}

/// Accuracy as a percentage of the bank size, rounded to 2 decimals.
pub fn accuracy_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = 100.0 * correct as f64 / total as f64;
    (raw * 100.0).round() / 100.0
}

/// Whole seconds between `started` and `now`, floored and clamped at zero.
pub fn elapsed_seconds(started: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (now - started).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis / 1000) as u64
}

/// Pure transition logic over an explicitly passed [`SessionState`].
///
/// The engine owns no session; callers hold the state and thread it through
/// `start`, `submit_answer` and `reset`. A failed transition never modifies
/// the state.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    bank: Arc<QuestionBank>,
}

impl QuizEngine {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self { bank }
    }

    pub fn total_questions(&self) -> usize {
        self.bank.size()
    }

    /// The question the session is waiting on.
    pub fn current_question<'a>(
        &'a self,
        session: &SessionState,
    ) -> Result<&'a QuestionItem, QuizError> {
        if session.phase != Phase::InProgress {
            return Err(QuizError::InvalidState(format!(
                "no current question in phase {:?}",
                session.phase
            )));
        }
        self.bank.item_at(session.current_index)
    }

    pub fn start(
        &self,
        session: &mut SessionState,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), QuizError> {
        if session.phase != Phase::NotStarted {
            return Err(QuizError::InvalidState(format!(
                "cannot start a session in phase {:?}",
                session.phase
            )));
        }
        if name.is_empty() {
            return Err(QuizError::InvalidInput("Identity required.".to_string()));
        }

        *session = SessionState {
            candidate_name: name.to_string(),
            started_at: Some(now),
            phase: Phase::InProgress,
            ..SessionState::default()
        };

        tracing::info!(candidate = %name, total = self.bank.size(), "Session started");
        Ok(())
    }

    /// Scores `choice` against the current question and advances.
    ///
    /// An empty choice is scored as a miss.
    pub fn submit_answer(
        &self,
        session: &mut SessionState,
        choice: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, QuizError> {
        let question = self.current_question(session)?;
        let correct = question.is_correct(choice);

        if correct {
            session.raw_score += question.points();
            session.correct_count += 1;
            session.skill_tally.increment(question.category());
        }

        tracing::debug!(
            index = session.current_index,
            correct,
            raw_score = session.raw_score,
            "Answer submitted"
        );

        session.current_index += 1;

        if session.current_index == self.bank.size() {
            session.phase = Phase::Complete;
            let record = self.finalize(session, now);
            session.result = Some(record.clone());
            tracing::info!(
                candidate = %record.candidate_name,
                xp = record.xp,
                "Session complete"
            );
            return Ok(SubmitOutcome::Completed(record));
        }

        Ok(SubmitOutcome::Advanced {
            next_index: session.current_index,
        })
    }

    /// Discards every field, back to the pristine pre-start state.
    pub fn reset(&self, session: &mut SessionState) {
        *session = SessionState::default();
    }

    fn finalize(&self, session: &SessionState, now: DateTime<Utc>) -> ResultRecord {
        let accuracy = accuracy_percent(session.correct_count, self.bank.size());
        let tally = &session.skill_tally;
        let elapsed = session
            .started_at
            .map(|started| elapsed_seconds(started, now))
            .unwrap_or(0);

        ResultRecord {
            candidate_name: session.candidate_name.clone(),
            raw_score: session.raw_score,
            accuracy_percent: accuracy,
            elapsed_seconds: elapsed,
            debug: tally.get(Category::Debug),
            tracing: tally.get(Category::Tracing),
            concept: tally.get(Category::Concept),
            ds: tally.get(Category::Ds),
            xp: session.raw_score as f64 + accuracy,
            achieved_skills: tally.achieved(),
            completed_at: now,
        }
    }
}
