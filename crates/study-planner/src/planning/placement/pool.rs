use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::planning::domain::{Assignment, AssignmentId, Family};
use crate::planning::patterns::{PriorityOverride, StudyHallRules};

/// An unplaced assignment annotated with its family, in input order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<'a> {
    pub(crate) assignment: &'a Assignment,
    pub(crate) family: Family,
}

/// Claimable work for one run. The used set lives only as long as the pool.
#[derive(Debug)]
pub(crate) struct CandidatePool<'a> {
    candidates: Vec<Candidate<'a>>,
    used: HashSet<&'a AssignmentId>,
    held: HashSet<&'a AssignmentId>,
}

impl<'a> CandidatePool<'a> {
    pub(crate) fn new(candidates: Vec<Candidate<'a>>) -> Self {
        Self {
            candidates,
            used: HashSet::new(),
            held: HashSet::new(),
        }
    }

    /// Replaces the set of ids that stay unclaimable until the next call.
    pub(crate) fn hold(&mut self, ids: HashSet<&'a AssignmentId>) {
        self.held = ids;
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }

    pub(crate) fn claimed(&self) -> usize {
        self.used.len()
    }

    fn available(&self) -> impl Iterator<Item = &Candidate<'a>> + '_ {
        self.candidates
            .iter()
            .filter(|candidate| {
                let id = &candidate.assignment.id;
                !self.used.contains(id) && !self.held.contains(id)
            })
    }

    fn claim(&mut self, picked: Option<Candidate<'a>>) -> Option<Candidate<'a>> {
        let picked = picked?;
        self.used.insert(&picked.assignment.id);
        Some(picked)
    }

    /// First unused assignment in input order the override targets, regardless of family.
    pub(crate) fn claim_override(&mut self, rule: &PriorityOverride) -> Option<Candidate<'a>> {
        let picked = self
            .available()
            .find(|candidate| rule.targets(candidate.assignment))
            .copied();
        self.claim(picked)
    }

    /// First unused short task in input order whose family fits the slot.
    pub(crate) fn claim_short_task(
        &mut self,
        slot: Family,
        rules: &StudyHallRules,
    ) -> Option<Candidate<'a>> {
        let picked = self
            .available()
            .find(|candidate| {
                study_hall_accepts(slot, candidate.family) && rules.is_short_task(candidate.assignment)
            })
            .copied();
        self.claim(picked)
    }

    /// Shortest unsupervised task that fits the slot; due date then input order break ties.
    pub(crate) fn claim_unsupervised(
        &mut self,
        slot: Family,
        rules: &StudyHallRules,
    ) -> Option<Candidate<'a>> {
        let picked = self
            .available()
            .filter(|candidate| {
                study_hall_accepts(slot, candidate.family)
                    && rules.is_unsupervised_task(candidate.assignment)
            })
            .min_by(|a, b| {
                a.assignment
                    .actual_estimated_minutes
                    .cmp(&b.assignment.actual_estimated_minutes)
                    .then_with(|| by_due_date(a.assignment, b.assignment))
            })
            .copied();
        self.claim(picked)
    }

    /// Earliest-due unused assignment of exactly `family`.
    pub(crate) fn claim_by_due_date(&mut self, family: Family) -> Option<Candidate<'a>> {
        let picked = self
            .available()
            .filter(|candidate| candidate.family == family)
            .min_by(|a, b| by_due_date(a.assignment, b.assignment))
            .copied();
        self.claim(picked)
    }
}

/// A study-hall slot whose rotation entry is itself "Study Hall" takes any family.
fn study_hall_accepts(slot: Family, candidate: Family) -> bool {
    slot == Family::StudyHall || slot == candidate
}

/// Ascending due date with undated work last. `min_by` keeps the first of equal
/// elements, so ties resolve to input order.
pub(crate) fn by_due_date(a: &Assignment, b: &Assignment) -> Ordering {
    due_key(a.due_date).cmp(&due_key(b.due_date))
}

fn due_key(due: Option<NaiveDate>) -> (bool, Option<NaiveDate>) {
    (due.is_none(), due)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(id: &str, due: Option<(i32, u32, u32)>) -> Assignment {
        let mut assignment = Assignment::new(id, "u1", format!("Item {id}"), "History");
        assignment.due_date = due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assignment
    }

    #[test]
    fn undated_work_sorts_after_dated_work() {
        let undated = dated("a", None);
        let dated_late = dated("b", Some((2030, 1, 1)));
        assert_eq!(by_due_date(&dated_late, &undated), Ordering::Less);
        assert_eq!(by_due_date(&undated, &undated.clone()), Ordering::Equal);
    }

    #[test]
    fn equal_due_dates_keep_input_order() {
        let first = dated("first", Some((2025, 1, 3)));
        let second = dated("second", Some((2025, 1, 3)));
        let mut pool = CandidatePool::new(vec![
            Candidate {
                assignment: &first,
                family: Family::Humanities,
            },
            Candidate {
                assignment: &second,
                family: Family::Humanities,
            },
        ]);

        let picked = pool.claim_by_due_date(Family::Humanities).expect("claims one");
        assert_eq!(picked.assignment.id.as_str(), "first");
        let picked = pool.claim_by_due_date(Family::Humanities).expect("claims the other");
        assert_eq!(picked.assignment.id.as_str(), "second");
        assert!(pool.claim_by_due_date(Family::Humanities).is_none());
        assert_eq!(pool.claimed(), 2);
    }

    #[test]
    fn duplicate_ids_are_claimed_once() {
        let original = dated("dup", Some((2025, 1, 3)));
        let copy = original.clone();
        let mut pool = CandidatePool::new(vec![
            Candidate {
                assignment: &original,
                family: Family::Humanities,
            },
            Candidate {
                assignment: &copy,
                family: Family::Humanities,
            },
        ]);

        assert!(pool.claim_by_due_date(Family::Humanities).is_some());
        assert!(pool.claim_by_due_date(Family::Humanities).is_none());
    }
}
