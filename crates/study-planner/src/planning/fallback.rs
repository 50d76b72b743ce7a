use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::domain::{FallbackContent, Family};

/// One filler activity a block can show when no real work is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackOption {
    pub title: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyFallbacks {
    pub family: Family,
    pub options: Vec<FallbackOption>,
}

/// Per-family filler table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackTable {
    pub families: Vec<FamilyFallbacks>,
}

const LAST_RESORT_TITLE: &str = "Quiet reading from a book of your choice";
const LAST_RESORT_MINUTES: u32 = 20;

impl FallbackTable {
    pub fn standard() -> Self {
        Self {
            families: vec![
                entry(
                    Family::Analytical,
                    &[
                        ("Math facts practice (flash cards or app-free drill)", 15),
                        ("Logic puzzle from the puzzle binder", 20),
                        ("Review yesterday's math corrections", 15),
                    ],
                ),
                entry(
                    Family::Humanities,
                    &[
                        ("Free reading from the current novel", 25),
                        ("Read a chapter from the history shelf", 25),
                        ("Map review: label the current unit's map", 15),
                    ],
                ),
                entry(
                    Family::Composition,
                    &[
                        ("Journal entry: one page on today's reading", 20),
                        ("Copywork: a favorite passage in your best handwriting", 15),
                    ],
                ),
                entry(
                    Family::Creative,
                    &[
                        ("Nature sketch from the window or yard", 20),
                        ("Practice an instrument", 20),
                        ("Free drawing or craft time", 25),
                    ],
                ),
                entry(
                    Family::StudyHall,
                    &[("Organize binder, check planner, and read quietly", 20)],
                ),
            ],
        }
    }

    pub fn options(&self, family: Family) -> &[FallbackOption] {
        self.families
            .iter()
            .find(|entry| entry.family == family)
            .map(|entry| entry.options.as_slice())
            .unwrap_or_default()
    }

    /// Picks a filler for `family` using the thread-local generator.
    pub fn fallback(&self, family: Family) -> FallbackContent {
        self.fallback_with(family, &mut rand::rng())
    }

    /// Uniform choice among the family's options; a single option is returned as-is.
    pub fn fallback_with<R: Rng + ?Sized>(&self, family: Family, rng: &mut R) -> FallbackContent {
        let options = self.options(family);
        let picked = match options {
            [only] => Some(only),
            _ => options.choose(rng),
        };

        match picked {
            Some(option) => FallbackContent {
                title: option.title.clone(),
                minutes: option.minutes,
                family,
                is_fallback: true,
            },
            None => FallbackContent {
                title: LAST_RESORT_TITLE.to_string(),
                minutes: LAST_RESORT_MINUTES,
                family,
                is_fallback: true,
            },
        }
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn entry(family: Family, options: &[(&str, u32)]) -> FamilyFallbacks {
    FamilyFallbacks {
        family,
        options: options
            .iter()
            .map(|(title, minutes)| FallbackOption {
                title: title.to_string(),
                minutes: *minutes,
            })
            .collect(),
    }
}
