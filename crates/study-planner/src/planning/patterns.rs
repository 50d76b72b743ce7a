//! Per-student weekly family rotation, priority overrides, and study-hall detection.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::classifier::mentions_any;
use super::domain::{minutes_since_midnight, Assignment, BlockType, Family, ScheduleBlock};

/// Ordered families for one student's assignable blocks on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyPattern {
    pub student: String,
    pub weekday: Weekday,
    pub families: Vec<Family>,
}

/// Named exception letting one subject claim specific block positions first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityOverride {
    pub name: String,
    pub student: String,
    pub weekdays: Vec<Weekday>,
    pub block_numbers: Vec<u8>,
    /// Matched against title, subject, and course name.
    pub keywords: Vec<String>,
}

impl PriorityOverride {
    pub fn applies(&self, student: &str, weekday: Weekday, block_number: u8) -> bool {
        same_student(&self.student, student)
            && self.weekdays.contains(&weekday)
            && self.block_numbers.contains(&block_number)
    }

    pub fn targets(&self, assignment: &Assignment) -> bool {
        let haystack = format!(
            "{} {} {}",
            assignment.title,
            assignment.subject,
            assignment.course_name.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        mentions_any(&haystack, &self.keywords)
    }
}

/// Static rotation table: which family each numbered block carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationTable {
    pub patterns: Vec<FamilyPattern>,
    #[serde(default)]
    pub overrides: Vec<PriorityOverride>,
}

impl RotationTable {
    pub fn pattern(&self, student: &str, weekday: Weekday) -> Option<&FamilyPattern> {
        self.patterns
            .iter()
            .find(|pattern| pattern.weekday == weekday && same_student(&pattern.student, student))
    }

    /// Family for a 1-based block ordinal, or `None` for a pass-through block.
    pub fn resolve_family(&self, student: &str, weekday: Weekday, block_number: u8) -> Option<Family> {
        let index = usize::from(block_number).checked_sub(1)?;
        self.pattern(student, weekday)?.families.get(index).copied()
    }

    pub fn priority_override(
        &self,
        student: &str,
        weekday: Weekday,
        block_number: u8,
    ) -> Option<&PriorityOverride> {
        self.overrides
            .iter()
            .find(|rule| rule.applies(student, weekday, block_number))
    }

    pub fn should_prioritize(&self, student: &str, weekday: Weekday, block_number: u8) -> bool {
        self.priority_override(student, weekday, block_number)
            .is_some()
    }

    pub fn students(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for pattern in &self.patterns {
            if !names
                .iter()
                .any(|name| same_student(name, &pattern.student))
            {
                names.push(&pattern.student);
            }
        }
        names
    }
}

/// Clock window (`HH:MM`..`HH:MM`, end exclusive) that always counts as study hall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyHallWindow {
    pub start: String,
    pub end: String,
}

impl StudyHallWindow {
    fn contains(&self, minutes: u32) -> bool {
        match (
            minutes_since_midnight(&self.start),
            minutes_since_midnight(&self.end),
        ) {
            (Some(start), Some(end)) => minutes >= start && minutes < end,
            _ => false,
        }
    }
}

/// Detection and task-selection rules for study-hall blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyHallRules {
    pub short_task_keywords: Vec<String>,
    pub special_resource_keywords: Vec<String>,
    pub max_unsupervised_minutes: u32,
    #[serde(default)]
    pub windows: Vec<StudyHallWindow>,
}

impl StudyHallRules {
    pub fn standard() -> Self {
        Self {
            short_task_keywords: [
                "quiz",
                "check",
                "review",
                "practice",
                "worksheet",
                "exercise",
                "question",
                "problem",
                "drill",
                "vocab",
                "vocabulary",
            ]
            .iter()
            .map(|word| word.to_string())
            .collect(),
            special_resource_keywords: [
                "video",
                "online",
                "computer",
                "internet",
                "canvas",
                "zoom",
                "lab",
                "experiment",
                "presentation",
            ]
            .iter()
            .map(|word| word.to_string())
            .collect(),
            max_unsupervised_minutes: 25,
            windows: Vec::new(),
        }
    }

    pub fn is_study_hall(
        &self,
        block_type: &BlockType,
        start_time: &str,
        subject: &str,
        block_name: Option<&str>,
    ) -> bool {
        if *block_type == BlockType::StudyHall {
            return true;
        }

        let labelled = [Some(subject), block_name]
            .into_iter()
            .flatten()
            .any(|label| label.to_lowercase().contains("study hall"));
        if labelled {
            return true;
        }

        minutes_since_midnight(start_time)
            .map(|minutes| self.windows.iter().any(|window| window.contains(minutes)))
            .unwrap_or(false)
    }

    pub fn is_study_hall_block(&self, block: &ScheduleBlock) -> bool {
        self.is_study_hall(
            &block.block_type,
            &block.start_time,
            &block.subject,
            block.block_name.as_deref(),
        )
    }

    /// Display-time heuristic: the title names a quick task.
    pub fn is_short_task(&self, assignment: &Assignment) -> bool {
        mentions_any(&assignment.title.to_lowercase(), &self.short_task_keywords)
    }

    /// Weekly auto-fill filter: short by estimate and doable without special equipment.
    pub fn is_unsupervised_task(&self, assignment: &Assignment) -> bool {
        let short_enough = assignment
            .actual_estimated_minutes
            .is_some_and(|minutes| minutes <= self.max_unsupervised_minutes);
        short_enough
            && !mentions_any(
                &assignment.title.to_lowercase(),
                &self.special_resource_keywords,
            )
    }
}

impl Default for StudyHallRules {
    fn default() -> Self {
        Self::standard()
    }
}

fn same_student(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}
