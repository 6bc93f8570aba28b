// src/models/session.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{question::Category, result_record::ResultRecord};
use crate::utils::time::format_clock;

/// Lifecycle of one candidate attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

/// Per-category count of correct answers.
///
/// Every category is always present, so the tally serializes with a fixed
/// shape and key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SkillTally(BTreeMap<Category, u32>);

impl Default for SkillTally {
    fn default() -> Self {
        Self(Category::ALL.iter().map(|c| (*c, 0)).collect())
    }
}

impl SkillTally {
    pub fn get(&self, category: Category) -> u32 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub(crate) fn increment(&mut self, category: Category) {
        *self.0.entry(category).or_insert(0) += 1;
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// Categories with at least one correct answer, in category order.
    pub fn achieved(&self) -> Vec<Category> {
        self.0
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(cat, _)| *cat)
            .collect()
    }
}

/// Mutable progress record of one candidate attempt.
///
/// Fields are only written by the quiz engine; everything else reads them
/// through accessors or a [`SessionSnapshot`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub(crate) candidate_name: String,
    pub(crate) current_index: usize,
    pub(crate) raw_score: u32,
    pub(crate) correct_count: usize,
    pub(crate) skill_tally: SkillTally,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) phase: Phase,
    pub(crate) result: Option<ResultRecord>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate_name(&self) -> &str {
        &self.candidate_name
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn raw_score(&self) -> u32 {
        self.raw_score
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn skill_tally(&self) -> &SkillTally {
        &self.skill_tally
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The record emitted when the session completed, if it has.
    pub fn result(&self) -> Option<&ResultRecord> {
        self.result.as_ref()
    }

    /// Whole seconds since the session started.
    ///
    /// Frozen at the recorded value once the session is complete, zero before start.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        if let Some(result) = &self.result {
            return result.elapsed_seconds;
        }
        self.started_at
            .map(|started| crate::engine::elapsed_seconds(started, now))
            .unwrap_or(0)
    }

    pub fn snapshot(&self, total: usize, now: DateTime<Utc>) -> SessionSnapshot {
        let elapsed = self.elapsed_seconds(now);
        let progress = if total == 0 {
            0.0
        } else {
            self.current_index as f64 / total as f64
        };

        SessionSnapshot {
            phase: self.phase,
            candidate_name: self.candidate_name.clone(),
            current_index: self.current_index,
            total_questions: total,
            progress,
            raw_score: self.raw_score,
            correct_count: self.correct_count,
            skill_tally: self.skill_tally.clone(),
            elapsed_seconds: elapsed,
            clock: format_clock(elapsed),
        }
    }
}

/// Read-only view of the session for progress and timer display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub candidate_name: String,
    pub current_index: usize,
    pub total_questions: usize,
    pub progress: f64,
    pub raw_score: u32,
    pub correct_count: usize,
    pub skill_tally: SkillTally,
    pub elapsed_seconds: u64,
    /// `MM:SS` rendering of `elapsed_seconds`.
    pub clock: String,
}
