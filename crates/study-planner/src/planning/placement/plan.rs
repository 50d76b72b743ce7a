use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::planning::domain::{weekday_name, BlockFill, PopulatedBlock};

/// One student's populated day, ordered by block start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub student: String,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub blocks: Vec<PopulatedBlock>,
    /// Unplaced assignments still waiting after this run.
    pub unscheduled_count: usize,
}

/// Counts for dashboards and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DayPlanSummary {
    pub with_assignment: usize,
    pub with_fallback: usize,
    pub awaiting_work: usize,
    pub pass_through: usize,
    pub unscheduled_count: usize,
}

impl DayPlan {
    pub fn weekday_label(&self) -> &'static str {
        weekday_name(self.weekday)
    }

    pub fn summary(&self) -> DayPlanSummary {
        let mut summary = DayPlanSummary {
            unscheduled_count: self.unscheduled_count,
            ..DayPlanSummary::default()
        };

        for block in &self.blocks {
            match (&block.fill, block.family) {
                (BlockFill::Assignment { .. }, _) => summary.with_assignment += 1,
                (BlockFill::Fallback { .. }, _) => summary.with_fallback += 1,
                (BlockFill::Empty, Some(_)) => summary.awaiting_work += 1,
                (BlockFill::Empty, None) => summary.pass_through += 1,
            }
        }

        summary
    }

    /// Ids of every assignment placed in this plan, in block order.
    pub fn assigned_ids(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| block.assignment())
            .map(|assignment| assignment.id.as_str())
            .collect()
    }
}
