//! Display-time placement of unplaced work into one day's assignable blocks.
//!
//! The engine is pure: it reads the assignments and blocks it is handed and
//! returns a fresh [`DayPlan`]. The set of claimed assignments is local to a
//! single call, so concurrent calls for different day cards never interact.
//!
//! Per block, in start-time order:
//!
//! 1. Fixed blocks (anything not "Assignment" and not detected as study hall)
//!    pass through untouched.
//! 2. The rotation table supplies the block's family; a numbered assignment
//!    block with no rotation entry passes through.
//! 3. Work already scheduled into this date and block number is shown as is
//!    and the block takes no new claim.
//! 4. A matching priority override claims its first target in input order.
//! 5. Study hall takes the first short task of a fitting family, else filler.
//! 6. Ordinary blocks take the earliest-due assignment of the same family, or
//!    stay empty with the family set.

mod plan;
pub(crate) mod pool;

pub use plan::{DayPlan, DayPlanSummary};

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::catalog::PlannerCatalog;
use super::domain::{
    Assignment, BlockFill, BlockType, ClaimRule, Family, PopulatedBlock, ScheduleBlock,
};
use pool::{Candidate, CandidatePool};

/// Stateless placement engine over a shared catalog.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    catalog: Arc<PlannerCatalog>,
}

impl PlacementEngine {
    pub fn new(catalog: Arc<PlannerCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PlannerCatalog {
        &self.catalog
    }

    /// Populates `blocks` for `student` on `date`. Never fails; bad data only
    /// leaves blocks empty.
    pub fn place(
        &self,
        assignments: &[Assignment],
        blocks: &[ScheduleBlock],
        student: &str,
        date: NaiveDate,
    ) -> DayPlan {
        self.place_with_rng(assignments, blocks, student, date, &mut rand::rng())
    }

    /// Same as [`place`](Self::place) with a caller-supplied generator for filler picks.
    pub fn place_with_rng<R: Rng + ?Sized>(
        &self,
        assignments: &[Assignment],
        blocks: &[ScheduleBlock],
        student: &str,
        date: NaiveDate,
        rng: &mut R,
    ) -> DayPlan {
        let weekday = date.weekday();
        let classifier = self.catalog.classifier();

        let candidates = assignments
            .iter()
            .filter(|assignment| assignment.is_unplaced())
            .map(|assignment| Candidate {
                assignment,
                family: classifier.family_of(assignment),
            })
            .collect();
        let mut pool = CandidatePool::new(candidates);
        let scheduled = scheduled_on(assignments, date);

        let mut ordered: Vec<&ScheduleBlock> = blocks.iter().collect();
        ordered.sort_by_key(|block| block.sort_key());

        let populated: Vec<PopulatedBlock> = ordered
            .into_iter()
            .map(|block| self.populate(block, student, weekday, &scheduled, &mut pool, rng))
            .collect();

        let unscheduled_count = pool.len().saturating_sub(pool.claimed());
        debug!(
            student,
            %date,
            blocks = populated.len(),
            claimed = pool.claimed(),
            unscheduled_count,
            "placed assignments for day"
        );

        DayPlan {
            student: student.to_string(),
            date,
            weekday,
            blocks: populated,
            unscheduled_count,
        }
    }

    fn populate<R: Rng + ?Sized>(
        &self,
        block: &ScheduleBlock,
        student: &str,
        weekday: Weekday,
        scheduled: &HashMap<u8, &Assignment>,
        pool: &mut CandidatePool<'_>,
        rng: &mut R,
    ) -> PopulatedBlock {
        let catalog = &*self.catalog;
        let Some(Slot { family, study_hall }) = resolve_slot(catalog, block, student, weekday)
        else {
            return PopulatedBlock::pass_through(block.clone());
        };

        if let Some(&existing) = block.block_number.and_then(|number| scheduled.get(&number)) {
            let candidate = Candidate {
                assignment: existing,
                family: catalog.classifier().family_of(existing),
            };
            return assigned(block, family, candidate, ClaimRule::Scheduled);
        }

        let override_rule = block
            .block_number
            .and_then(|number| catalog.rotation.priority_override(student, weekday, number));
        if let Some(rule) = override_rule {
            if let Some(candidate) = pool.claim_override(rule) {
                return assigned(block, family, candidate, ClaimRule::PriorityOverride);
            }
        }

        if study_hall {
            if let Some(candidate) = pool.claim_short_task(family, &catalog.study_hall) {
                return assigned(block, family, candidate, ClaimRule::StudyHallShortTask);
            }
            let fallback = catalog.fallbacks.fallback_with(Family::StudyHall, rng);
            return PopulatedBlock {
                block: block.clone(),
                family: Some(family),
                fill: BlockFill::Fallback { fallback },
            };
        }

        match pool.claim_by_due_date(family) {
            Some(candidate) => assigned(block, family, candidate, ClaimRule::FamilyMatch),
            None => PopulatedBlock {
                block: block.clone(),
                family: Some(family),
                fill: BlockFill::Empty,
            },
        }
    }
}

/// Family and kind of an assignable block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) family: Family,
    pub(crate) study_hall: bool,
}

/// `None` for fixed blocks and for numbered blocks the rotation does not cover.
/// Study hall without a rotation entry still counts, as a family-agnostic slot.
pub(crate) fn resolve_slot(
    catalog: &PlannerCatalog,
    block: &ScheduleBlock,
    student: &str,
    weekday: Weekday,
) -> Option<Slot> {
    let study_hall = catalog.study_hall.is_study_hall_block(block);
    if !study_hall && block.block_type != BlockType::Assignment {
        return None;
    }

    let resolved = block
        .block_number
        .and_then(|number| catalog.rotation.resolve_family(student, weekday, number));
    match (resolved, study_hall) {
        (Some(family), _) => Some(Slot { family, study_hall }),
        (None, true) => Some(Slot {
            family: Family::StudyHall,
            study_hall,
        }),
        (None, false) => None,
    }
}

/// Open work already written to `date`, keyed by block number. A module day
/// replaces the parent record sharing its slot; otherwise the first record wins.
fn scheduled_on(assignments: &[Assignment], date: NaiveDate) -> HashMap<u8, &Assignment> {
    let mut by_block: HashMap<u8, &Assignment> = HashMap::new();
    for assignment in assignments
        .iter()
        .filter(|assignment| !assignment.is_completed() && assignment.scheduled_date == Some(date))
    {
        let Some(number) = assignment.scheduled_block else {
            continue;
        };
        match by_block.entry(number) {
            Entry::Vacant(slot) => {
                slot.insert(assignment);
            }
            Entry::Occupied(mut slot) => {
                if assignment.parent_id.as_ref() == Some(&slot.get().id) {
                    slot.insert(assignment);
                }
            }
        }
    }
    by_block
}

fn assigned(
    block: &ScheduleBlock,
    family: Family,
    candidate: Candidate<'_>,
    rule: ClaimRule,
) -> PopulatedBlock {
    let mut assignment = candidate.assignment.clone();
    assignment.detected_family = Some(candidate.family);
    PopulatedBlock {
        block: block.clone(),
        family: Some(family),
        fill: BlockFill::Assignment { assignment, rule },
    }
}
