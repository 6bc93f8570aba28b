// src/models/question.rs

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::BankError;

/// Skill dimension a question tests.
///
/// Declaration order is significant: it is the order of the skill tally
/// and of the achieved-skills list written with each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Tracing,
    Debug,
    Concept,
    #[serde(rename = "DS")]
    Ds,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Tracing,
        Category::Debug,
        Category::Concept,
        Category::Ds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tracing => "Tracing",
            Category::Debug => "Debug",
            Category::Concept => "Concept",
            Category::Ds => "DS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single multiple-choice item of the question bank.
///
/// Only constructed through [`QuestionItem::new`] (or a validated seed), so
/// `correct_answer` is always one of `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionItem {
    category: Category,
    difficulty: u32,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl QuestionItem {
    pub fn new(
        category: Category,
        difficulty: u32,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, BankError> {
        let seed = QuestionSeed {
            category,
            difficulty,
            prompt: prompt.into(),
            options,
            answer: correct_answer.into(),
        };
        seed.try_into()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Points awarded for a correct answer.
    pub fn points(&self) -> u32 {
        10 * self.difficulty
    }

    /// Exact, case-sensitive comparison against the correct answer.
    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.correct_answer
    }
}

/// On-disk shape of a question, as found in a question bank JSON file.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionSeed {
    #[serde(rename = "type", alias = "category")]
    pub category: Category,
    #[validate(range(min = 1, message = "Difficulty must be a positive weight."))]
    pub difficulty: u32,
    #[serde(alias = "q")]
    #[validate(length(min = 1, message = "Prompt cannot be empty."))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, message = "Answer cannot be empty."))]
    pub answer: String,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if !(2..=4).contains(&options.len()) {
        return Err(validator::ValidationError::new("options_count_out_of_range"));
    }
    if options.iter().any(|o| o.is_empty()) {
        return Err(validator::ValidationError::new("option_cannot_be_empty"));
    }
    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Err(validator::ValidationError::new("options_must_be_distinct"));
    }
    Ok(())
}

impl TryFrom<QuestionSeed> for QuestionItem {
    type Error = BankError;

    fn try_from(seed: QuestionSeed) -> Result<Self, Self::Error> {
        seed.validate()
            .map_err(|e| BankError::InvalidQuestion(e.to_string()))?;

        if !seed.options.contains(&seed.answer) {
            return Err(BankError::InvalidQuestion(format!(
                "answer '{}' is not one of the options",
                seed.answer
            )));
        }

        Ok(Self {
            category: seed.category,
            difficulty: seed.difficulty,
            prompt: seed.prompt,
            options: seed.options,
            correct_answer: seed.answer,
        })
    }
}

/// DTO for sending the current question to the client (excludes the answer).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    /// Zero-based position in the bank.
    pub index: usize,
    pub total: usize,
    #[serde(rename = "type")]
    pub category: Category,
    pub difficulty: u32,
    pub prompt: String,
    pub options: Vec<String>,
}

impl PublicQuestion {
    pub fn from_item(index: usize, total: usize, item: &QuestionItem) -> Self {
        Self {
            index,
            total,
            category: item.category,
            difficulty: item.difficulty,
            prompt: item.prompt.clone(),
            options: item.options.clone(),
        }
    }
}
