//! CSV readers for assignment exports and weekly schedule templates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use super::domain::{
    Assignment, AssignmentId, BlockDay, BlockType, CompletionStatus, Family, ScheduleBlock,
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read CSV export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

pub fn assignments_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Assignment>, ImportError> {
    let file = std::fs::File::open(path)?;
    assignments_from_reader(file)
}

/// Reads an assignment export. Headers follow the record field names.
pub fn assignments_from_reader<R: Read>(reader: R) -> Result<Vec<Assignment>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut assignments = Vec::new();

    for (index, record) in csv_reader.deserialize::<AssignmentRow>().enumerate() {
        let row = record?;
        assignments.push(row.into_assignment(index + 2)?);
    }

    Ok(assignments)
}

pub fn schedule_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ScheduleBlock>, ImportError> {
    let file = std::fs::File::open(path)?;
    schedule_from_reader(file)
}

/// Reads a schedule-template export, one block per row.
pub fn schedule_from_reader<R: Read>(reader: R) -> Result<Vec<ScheduleBlock>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut blocks = Vec::new();

    for (index, record) in csv_reader.deserialize::<ScheduleRow>().enumerate() {
        let row = record?;
        blocks.push(row.into_block(index + 2)?);
    }

    Ok(blocks)
}

#[derive(Debug, Deserialize)]
struct AssignmentRow {
    id: String,
    #[serde(default)]
    owner: String,
    title: String,
    #[serde(default)]
    subject: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    course_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    due_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    scheduled_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    scheduled_block: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    completion_status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    completed_at: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    detected_family: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    actual_estimated_minutes: Option<String>,
}

impl AssignmentRow {
    fn into_assignment(self, row: usize) -> Result<Assignment, ImportError> {
        if self.id.trim().is_empty() {
            return Err(invalid(row, "missing assignment id"));
        }

        Ok(Assignment {
            id: AssignmentId(self.id),
            owner: self.owner,
            title: self.title,
            subject: self.subject,
            course_name: self.course_name,
            due_date: parse_optional_date(self.due_date.as_deref(), row, "due_date")?,
            scheduled_date: parse_optional_date(
                self.scheduled_date.as_deref(),
                row,
                "scheduled_date",
            )?,
            scheduled_block: parse_optional_number(
                self.scheduled_block.as_deref(),
                row,
                "scheduled_block",
            )?,
            completion_status: self
                .completion_status
                .as_deref()
                .map(CompletionStatus::from_label)
                .unwrap_or_default(),
            completed_at: self
                .completed_at
                .as_deref()
                .and_then(parse_timestamp),
            detected_family: self.detected_family.as_deref().and_then(Family::from_label),
            actual_estimated_minutes: parse_optional_number(
                self.actual_estimated_minutes.as_deref(),
                row,
                "actual_estimated_minutes",
            )?,
            parent_id: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleRow {
    id: String,
    student_name: String,
    weekday: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    block_number: Option<String>,
    start_time: String,
    end_time: String,
    #[serde(default)]
    subject: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    block_name: Option<String>,
    block_type: String,
}

impl ScheduleRow {
    fn into_block(self, row: usize) -> Result<ScheduleBlock, ImportError> {
        let weekday = BlockDay::parse(&self.weekday)
            .ok_or_else(|| invalid(row, format!("unrecognized weekday '{}'", self.weekday)))?;

        Ok(ScheduleBlock {
            id: self.id,
            student_name: self.student_name,
            weekday,
            block_number: parse_optional_number(self.block_number.as_deref(), row, "block_number")?,
            start_time: self.start_time,
            end_time: self.end_time,
            subject: self.subject,
            block_name: self.block_name,
            block_type: BlockType::parse(&self.block_type),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_optional_date(
    value: Option<&str>,
    row: usize,
    field: &str,
) -> Result<Option<NaiveDate>, ImportError> {
    value
        .map(|raw| {
            parse_date(raw).ok_or_else(|| invalid(row, format!("{field} '{raw}' is not a date")))
        })
        .transpose()
}

fn parse_optional_number<T: std::str::FromStr>(
    value: Option<&str>,
    row: usize,
    field: &str,
) -> Result<Option<T>, ImportError> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| invalid(row, format!("{field} '{raw}' is not a number")))
        })
        .transpose()
}

/// Accepts plain dates and full timestamps (the date part is kept).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(trimmed).map(|timestamp| timestamp.date_naive()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn invalid(row: usize, message: impl Into<String>) -> ImportError {
    ImportError::InvalidRow {
        row,
        message: message.into(),
    }
}
