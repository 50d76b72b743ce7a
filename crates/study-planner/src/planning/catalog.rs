use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::classifier::{ClassifierRules, FamilyClassifier};
use super::domain::Family;
use super::fallback::FallbackTable;
use super::patterns::{FamilyPattern, PriorityOverride, RotationTable, StudyHallRules};

/// All static planning tables in one place: keyword lists, rotations, overrides, fillers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerCatalog {
    #[serde(default)]
    pub classifier: ClassifierRules,
    pub rotation: RotationTable,
    #[serde(default)]
    pub study_hall: StudyHallRules,
    #[serde(default)]
    pub fallbacks: FallbackTable,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read planner catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid planner catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate family pattern for {student} on {weekday}")]
    DuplicatePattern { student: String, weekday: Weekday },
}

impl PlannerCatalog {
    pub fn standard() -> Self {
        Self {
            classifier: ClassifierRules::standard(),
            rotation: standard_rotation(),
            study_hall: StudyHallRules::standard(),
            fallbacks: FallbackTable::standard(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_reader(reader)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for pattern in &self.rotation.patterns {
            let key = (pattern.student.trim().to_ascii_lowercase(), pattern.weekday);
            if !seen.insert(key) {
                return Err(CatalogError::DuplicatePattern {
                    student: pattern.student.clone(),
                    weekday: pattern.weekday,
                });
            }
        }
        Ok(())
    }

    pub fn classifier(&self) -> FamilyClassifier<'_> {
        FamilyClassifier::new(&self.classifier)
    }
}

impl Default for PlannerCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_rotation() -> RotationTable {
    use Family::{Analytical as A, Composition as W, Creative as C, Humanities as H, StudyHall as S};

    let abigail = [
        (Weekday::Mon, vec![A, H, W, S, C]),
        (Weekday::Tue, vec![H, A, C, S, W]),
        (Weekday::Wed, vec![A, W, H, S, C]),
        (Weekday::Thu, vec![W, A, H, S, C]),
        (Weekday::Fri, vec![H, C, A, S, W]),
    ];
    let khalil = [
        (Weekday::Mon, vec![H, A, S, C]),
        (Weekday::Tue, vec![A, W, S, H]),
        (Weekday::Wed, vec![H, A, S, W]),
        (Weekday::Thu, vec![A, C, S, H]),
        (Weekday::Fri, vec![W, A, S, C]),
    ];

    let mut patterns = Vec::new();
    for (student, week) in [("Abigail", abigail), ("Khalil", khalil)] {
        for (weekday, families) in week {
            patterns.push(FamilyPattern {
                student: student.to_string(),
                weekday,
                families,
            });
        }
    }

    RotationTable {
        patterns,
        overrides: vec![PriorityOverride {
            name: "Algebra before other analytical work".to_string(),
            student: "Abigail".to_string(),
            weekdays: vec![Weekday::Mon, Weekday::Wed],
            block_numbers: vec![1, 2],
            keywords: vec!["algebra".to_string()],
        }],
    }
}
