// src/models/result_record.rs

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{error::StoreError, models::question::Category};

/// Header row of the results sheet. Column positions are fixed.
pub const ROW_HEADERS: [&str; 11] = [
    "Name",
    "Score",
    "Accuracy",
    "ElapsedSeconds",
    "Debug",
    "Tracing",
    "Concept",
    "DS",
    "XP",
    "AchievedSkills",
    "Timestamp",
];

pub const ROW_WIDTH: usize = ROW_HEADERS.len();

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Final outcome of one completed session. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub candidate_name: String,
    pub raw_score: u32,
    pub accuracy_percent: f64,
    pub elapsed_seconds: u64,
    pub debug: u32,
    pub tracing: u32,
    pub concept: u32,
    pub ds: u32,
    /// `raw_score + accuracy_percent`.
    pub xp: f64,
    pub achieved_skills: Vec<Category>,
    pub completed_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Comma-joined achieved skills, as stored in the `AchievedSkills` column.
    pub fn achieved_skills_csv(&self) -> String {
        self.achieved_skills
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn timestamp_text(&self) -> String {
        self.completed_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Positional row in the fixed 11-column schema.
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.candidate_name.clone()),
            Value::from(self.raw_score),
            Value::from(self.accuracy_percent),
            Value::from(self.elapsed_seconds),
            Value::from(self.debug),
            Value::from(self.tracing),
            Value::from(self.concept),
            Value::from(self.ds),
            Value::from(self.xp),
            Value::from(self.achieved_skills_csv()),
            Value::from(self.timestamp_text()),
        ]
    }

    /// Parses a positional row. Numeric cells may arrive as numbers or text.
    pub fn from_row(row: &[Value]) -> Result<Self, StoreError> {
        if row.len() != ROW_WIDTH {
            return Err(StoreError::MalformedRow(format!(
                "expected {} columns, found {}",
                ROW_WIDTH,
                row.len()
            )));
        }

        Ok(Self {
            candidate_name: cell_text(&row[0]),
            raw_score: cell_u32(&row[1], "Score")?,
            accuracy_percent: cell_f64(&row[2], "Accuracy")?,
            elapsed_seconds: cell_u64(&row[3], "ElapsedSeconds")?,
            debug: cell_u32(&row[4], "Debug")?,
            tracing: cell_u32(&row[5], "Tracing")?,
            concept: cell_u32(&row[6], "Concept")?,
            ds: cell_u32(&row[7], "DS")?,
            xp: cell_f64(&row[8], "XP")?,
            achieved_skills: parse_skills(&cell_text(&row[9]))?,
            completed_at: cell_timestamp(&row[10])?,
        })
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn cell_f64(cell: &Value, column: &str) -> Result<f64, StoreError> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| StoreError::MalformedRow(format!("column {} is not numeric: {}", column, cell)))
}

fn cell_u64(cell: &Value, column: &str) -> Result<u64, StoreError> {
    let value = cell_f64(cell, column)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(StoreError::MalformedRow(format!(
            "column {} is not a non-negative integer: {}",
            column, cell
        )));
    }
    Ok(value as u64)
}

fn cell_u32(cell: &Value, column: &str) -> Result<u32, StoreError> {
    let value = cell_u64(cell, column)?;
    u32::try_from(value)
        .map_err(|_| StoreError::MalformedRow(format!("column {} out of range: {}", column, value)))
}

/// Timestamp cells are text, or a spreadsheet date serial when the sheet
/// has stored them as dates.
fn cell_timestamp(cell: &Value) -> Result<DateTime<Utc>, StoreError> {
    match cell {
        Value::Number(n) => n
            .as_f64()
            .and_then(from_date_serial)
            .ok_or_else(|| StoreError::MalformedRow(format!("invalid date serial: {}", n))),
        other => parse_timestamp(&cell_text(other)),
    }
}

/// Days since 1899-12-30, fraction is time of day. Rounded to the millisecond.
fn from_date_serial(serial: f64) -> Option<DateTime<Utc>> {
    // Serial of 9999-12-31.
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch
        .checked_add_signed(Duration::milliseconds(millis))
        .map(|naive| naive.and_utc())
}

pub(crate) fn parse_skills(csv: &str) -> Result<Vec<Category>, StoreError> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Category::ALL
                .into_iter()
                .find(|c| c.as_str() == s)
                .ok_or_else(|| StoreError::MalformedRow(format!("unknown skill '{}'", s)))
        })
        .collect()
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::MalformedRow(format!("invalid timestamp '{}'", text)))
}

/// A stored result as shown on the leaderboard.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position after sorting by XP.
    pub rank: usize,
    #[serde(flatten)]
    pub record: ResultRecord,
}

/// DTO for starting a session.
#[derive(Debug, Deserialize, Validate)]
pub struct StartRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters."))]
    pub name: String,
}

/// DTO for answering the current question. `None` means nothing was selected.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub choice: Option<String>,
}

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}
