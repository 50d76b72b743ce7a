//! Daily homeschool planning: family rotation, display-time placement, and the
//! weekly auto-fill that writes placements back to storage.

pub mod autofill;
pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod domain;
pub mod fallback;
pub mod import;
pub mod patterns;
pub mod placement;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use autofill::{AutoFillError, AutoFillReport, AutoFillScheduler, WeeklyPlacement};
pub use cache::CachedScheduleStore;
pub use catalog::{CatalogError, PlannerCatalog};
pub use classifier::{ClassifierRules, FamilyClassifier};
pub use domain::{
    Assignment, AssignmentId, BlockDay, BlockFill, BlockType, ClaimRule, CompletionStatus,
    FallbackContent, Family, PopulatedBlock, ScheduleBlock,
};
pub use fallback::FallbackTable;
pub use import::ImportError;
pub use patterns::{FamilyPattern, PriorityOverride, RotationTable, StudyHallRules};
pub use placement::{DayPlan, DayPlanSummary, PlacementEngine};
pub use repository::{AssignmentStore, PlacementUpdate, RepositoryError, ScheduleStore};
pub use router::planner_router;
pub use service::{PlannerService, PlannerServiceError};
