use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for assignment records owned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

impl AssignmentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cognitive-mode category used to keep a school day varied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Analytical,
    Humanities,
    Composition,
    Creative,
    #[serde(rename = "Study Hall", alias = "StudyHall", alias = "study_hall")]
    StudyHall,
}

impl Family {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Analytical,
            Self::Humanities,
            Self::Composition,
            Self::Creative,
            Self::StudyHall,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Analytical => "Analytical",
            Self::Humanities => "Humanities",
            Self::Composition => "Composition",
            Self::Creative => "Creative",
            Self::StudyHall => "Study Hall",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "analytical" => Some(Self::Analytical),
            "humanities" => Some(Self::Humanities),
            "composition" => Some(Self::Composition),
            "creative" => Some(Self::Creative),
            "studyhall" => Some(Self::StudyHall),
            _ => None,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parsed leniently on the wire: any casing of "completed", "complete" or
/// "done" counts as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompletionStatus {
    #[default]
    Pending,
    Completed,
    Other,
}

impl CompletionStatus {
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "pending" => Self::Pending,
            "completed" | "complete" | "done" => Self::Completed,
            _ => Self::Other,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Other => "Other",
        }
    }
}

impl From<String> for CompletionStatus {
    fn from(raw: String) -> Self {
        Self::from_label(&raw)
    }
}

impl From<CompletionStatus> for String {
    fn from(status: CompletionStatus) -> Self {
        match status {
            CompletionStatus::Pending => "pending",
            CompletionStatus::Completed => "completed",
            CompletionStatus::Other => "other",
        }
        .to_string()
    }
}

/// Canonical homework record consumed by placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    #[serde(default)]
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_block: Option<u8>,
    #[serde(default)]
    pub completion_status: CompletionStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub detected_family: Option<Family>,
    #[serde(default)]
    pub actual_estimated_minutes: Option<u32>,
    /// Set on the per-day pieces of a multi-day module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AssignmentId>,
}

impl Assignment {
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        title: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            id: AssignmentId::new(id),
            owner: owner.into(),
            title: title.into(),
            subject: subject.into(),
            course_name: None,
            due_date: None,
            scheduled_date: None,
            scheduled_block: None,
            completion_status: CompletionStatus::Pending,
            completed_at: None,
            detected_family: None,
            actual_estimated_minutes: None,
            parent_id: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completion_status == CompletionStatus::Completed
    }

    /// A record only counts as placed once both the date and the block are set.
    pub fn is_placed(&self) -> bool {
        self.scheduled_date.is_some() && self.scheduled_block.is_some()
    }

    pub fn is_unplaced(&self) -> bool {
        !self.is_completed() && !self.is_placed()
    }

    /// Course name when present, otherwise the subject.
    pub fn course_or_subject(&self) -> &str {
        match self.course_name.as_deref() {
            Some(course) if !course.trim().is_empty() => course,
            _ => &self.subject,
        }
    }
}

/// Which day(s) of the week a template block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlockDay {
    On(Weekday),
    EveryDay,
}

impl BlockDay {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "full week" | "fullweek" | "full_week" | "daily" | "every day" | "all" => {
                Some(Self::EveryDay)
            }
            other => parse_weekday(other).map(Self::On),
        }
    }

    pub fn applies_to(self, weekday: Weekday) -> bool {
        match self {
            Self::On(day) => day == weekday,
            Self::EveryDay => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::On(day) => weekday_name(day),
            Self::EveryDay => "Full Week",
        }
    }
}

impl TryFrom<String> for BlockDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unrecognized weekday '{value}'"))
    }
}

impl From<BlockDay> for String {
    fn from(value: BlockDay) -> Self {
        value.label().to_string()
    }
}

/// Fixed set of template block kinds; anything unrecognized keeps its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Assignment,
    StudyHall,
    Bible,
    Lunch,
    CoOp,
    Movement,
    Travel,
    PrepLoad,
    Other(String),
}

impl BlockType {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "assignment" => Self::Assignment,
            "studyhall" => Self::StudyHall,
            "bible" => Self::Bible,
            "lunch" => Self::Lunch,
            "coop" => Self::CoOp,
            "movement" => Self::Movement,
            "travel" => Self::Travel,
            "prepload" => Self::PrepLoad,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Assignment => "Assignment",
            Self::StudyHall => "Study Hall",
            Self::Bible => "Bible",
            Self::Lunch => "Lunch",
            Self::CoOp => "Co-op",
            Self::Movement => "Movement",
            Self::Travel => "Travel",
            Self::PrepLoad => "Prep/Load",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for BlockType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<BlockType> for String {
    fn from(value: BlockType) -> Self {
        value.label().to_string()
    }
}

/// One slot of a student's daily template. Read-only to placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub id: String,
    pub student_name: String,
    pub weekday: BlockDay,
    #[serde(default)]
    pub block_number: Option<u8>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub block_name: Option<String>,
    pub block_type: BlockType,
}

impl ScheduleBlock {
    pub fn start_minutes(&self) -> Option<u32> {
        minutes_since_midnight(&self.start_time)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        minutes_since_midnight(&self.end_time)
    }

    /// Length of the block; `None` when either bound is malformed or reversed.
    pub fn duration_minutes(&self) -> Option<u32> {
        let start = self.start_minutes()?;
        let end = self.end_minutes()?;
        end.checked_sub(start)
    }

    /// Sort key: malformed start times go last.
    pub(crate) fn sort_key(&self) -> u32 {
        self.start_minutes().unwrap_or(u32::MAX)
    }

    pub fn display_name(&self) -> &str {
        match self.block_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.subject.trim().is_empty() => &self.subject,
            _ => self.block_type.label(),
        }
    }
}

/// Filler activity for a block that has no real work available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackContent {
    pub title: String,
    pub minutes: u32,
    pub family: Family,
    pub is_fallback: bool,
}

/// Which selection path claimed an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimRule {
    /// Already written to this date and block by an earlier run.
    Scheduled,
    PriorityOverride,
    StudyHallShortTask,
    FamilyMatch,
}

impl ClaimRule {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Already scheduled",
            Self::PriorityOverride => "Priority override",
            Self::StudyHallShortTask => "Study hall short task",
            Self::FamilyMatch => "Family match",
        }
    }
}

/// What a block ended up holding. Real work and filler are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockFill {
    Assignment {
        assignment: Assignment,
        rule: ClaimRule,
    },
    Fallback {
        fallback: FallbackContent,
    },
    Empty,
}

/// Engine output unit: the untouched template block plus its placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulatedBlock {
    pub block: ScheduleBlock,
    pub family: Option<Family>,
    pub fill: BlockFill,
}

impl PopulatedBlock {
    pub fn pass_through(block: ScheduleBlock) -> Self {
        Self {
            block,
            family: None,
            fill: BlockFill::Empty,
        }
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match &self.fill {
            BlockFill::Assignment { assignment, .. } => Some(assignment),
            _ => None,
        }
    }

    pub fn claim_rule(&self) -> Option<ClaimRule> {
        match &self.fill {
            BlockFill::Assignment { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    pub fn fallback(&self) -> Option<&FallbackContent> {
        match &self.fill {
            BlockFill::Fallback { fallback } => Some(fallback),
            _ => None,
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parses `HH:MM` (seconds tolerated) into minutes since midnight.
pub fn minutes_since_midnight(raw: &str) -> Option<u32> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    if let Some(seconds) = parts.next() {
        seconds.trim().parse::<u32>().ok()?;
    }
    if parts.next().is_some() || hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}
