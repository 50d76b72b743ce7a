use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::planning::domain::{Assignment, AssignmentId};

pub(crate) const MODULE_DAYS: u32 = 5;

/// A history module spans a school week and is placed one day at a time.
pub(crate) fn is_multi_day_module(assignment: &Assignment) -> bool {
    let course = format!(
        "{} {}",
        assignment.course_name.as_deref().unwrap_or_default(),
        assignment.subject
    )
    .to_lowercase();
    assignment.title.to_lowercase().contains("module") && course.contains("history")
}

/// Replaces each multi-day module with its daily pieces; other work passes through.
///
/// Pieces are ordered Day 1..Day 5 right where the parent stood so they keep
/// the parent's position for input-order tie-breaks. Only the computation is
/// split; the stored parent record stays whole.
pub(crate) fn expand_modules(assignments: Vec<Assignment>) -> Vec<Assignment> {
    let mut expanded = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        if is_multi_day_module(&assignment) {
            expanded.extend(split_module(&assignment));
        } else {
            expanded.push(assignment);
        }
    }
    expanded
}

pub(crate) fn split_module(parent: &Assignment) -> Vec<Assignment> {
    let minutes = parent
        .actual_estimated_minutes
        .map(|total| total.div_ceil(MODULE_DAYS));

    (1..=MODULE_DAYS)
        .map(|day| {
            let mut piece = parent.clone();
            piece.id = AssignmentId(format!("{}-day-{day}", parent.id));
            piece.title = format!("{} - Day {day}", parent.title);
            piece.actual_estimated_minutes = minutes;
            piece.parent_id = Some(parent.id.clone());
            piece
        })
        .collect()
}

/// Keeps each module's days in order and at most one per date.
#[derive(Debug, Default)]
pub(crate) struct ModuleProgress<'a> {
    /// Piece id to (parent id, 1-based day).
    days: HashMap<&'a AssignmentId, (&'a AssignmentId, u32)>,
    /// Parent id to (days placed so far, date of the latest one).
    placed: HashMap<&'a AssignmentId, (u32, NaiveDate)>,
}

impl<'a> ModuleProgress<'a> {
    pub(crate) fn new(pending: &'a [Assignment]) -> Self {
        let mut counters: HashMap<&AssignmentId, u32> = HashMap::new();
        let mut days = HashMap::new();
        for piece in pending {
            let Some(parent) = &piece.parent_id else {
                continue;
            };
            let day = counters.entry(parent).or_default();
            *day += 1;
            days.insert(&piece.id, (parent, *day));
        }
        Self {
            days,
            placed: HashMap::new(),
        }
    }

    /// Pieces that may not be claimed on `date`: anything past the next
    /// unplaced day, and the next day itself when its module already has a
    /// piece on `date` or later.
    pub(crate) fn waiting(&self, date: NaiveDate) -> HashSet<&'a AssignmentId> {
        self.days
            .iter()
            .filter(|(_, (parent, day))| !self.is_ready(parent, *day, date))
            .map(|(piece, _)| *piece)
            .collect()
    }

    fn is_ready(&self, parent: &AssignmentId, day: u32, date: NaiveDate) -> bool {
        match self.placed.get(parent) {
            None => day == 1,
            Some(&(count, last)) => day == count + 1 && last < date,
        }
    }

    /// Notes a written piece; ids that are not module days are ignored.
    pub(crate) fn record(&mut self, piece: &AssignmentId, date: NaiveDate) {
        let Some(&(parent, _)) = self.days.get(piece) else {
            return;
        };
        let progress = self.placed.entry(parent).or_insert((0, date));
        progress.0 += 1;
        progress.1 = date;
    }
}
