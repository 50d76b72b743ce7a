//! Keyword and course heuristics that map an assignment onto a [`Family`].
//!
//! Title keywords win over the course default so that, for example, a poster
//! project inside a history course still lands in a creative block.

use serde::{Deserialize, Serialize};

use super::domain::{Assignment, Family};

/// Course-name fragment mapped to the family used when no title keyword fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseFamily {
    pub pattern: String,
    pub family: Family,
}

impl CourseFamily {
    fn new(pattern: &str, family: Family) -> Self {
        Self {
            pattern: pattern.to_string(),
            family,
        }
    }
}

/// Keyword lists for each classifier rule, checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRules {
    pub creative: Vec<String>,
    pub composition: Vec<String>,
    pub reading: Vec<String>,
    pub analytical: Vec<String>,
    pub course_families: Vec<CourseFamily>,
    #[serde(default = "default_family")]
    pub default_family: Family,
}

fn default_family() -> Family {
    Family::Analytical
}

impl ClassifierRules {
    pub fn standard() -> Self {
        Self {
            creative: words(&[
                "create", "sketch", "draw", "map", "diagram", "poster", "slides", "build",
                "design", "art", "paint", "photo",
            ]),
            composition: words(&[
                "essay",
                "write",
                "draft",
                "response",
                "dbq",
                "outline",
                "paragraph",
                "compose",
                "letter",
                "report",
            ]),
            reading: words(&[
                "read",
                "chapter",
                "pages",
                "book",
                "novel",
                "story",
                "literature",
                "poem",
            ]),
            analytical: words(&[
                "solve",
                "calculate",
                "problem",
                "quiz",
                "test",
                "exam",
                "formula",
                "equation",
                "lab",
                "experiment",
            ]),
            course_families: vec![
                CourseFamily::new("algebra", Family::Analytical),
                CourseFamily::new("geometry", Family::Analytical),
                CourseFamily::new("math", Family::Analytical),
                CourseFamily::new("science", Family::Analytical),
                CourseFamily::new("biology", Family::Analytical),
                CourseFamily::new("chemistry", Family::Analytical),
                CourseFamily::new("physics", Family::Analytical),
                CourseFamily::new("logic", Family::Analytical),
                CourseFamily::new("history", Family::Humanities),
                CourseFamily::new("literature", Family::Humanities),
                CourseFamily::new("reading", Family::Humanities),
                CourseFamily::new("geography", Family::Humanities),
                CourseFamily::new("government", Family::Humanities),
                CourseFamily::new("civics", Family::Humanities),
                CourseFamily::new("bible", Family::Humanities),
                CourseFamily::new("spanish", Family::Humanities),
                CourseFamily::new("latin", Family::Humanities),
                CourseFamily::new("english", Family::Composition),
                CourseFamily::new("writing", Family::Composition),
                CourseFamily::new("composition", Family::Composition),
                CourseFamily::new("grammar", Family::Composition),
                CourseFamily::new("art", Family::Creative),
                CourseFamily::new("music", Family::Creative),
                CourseFamily::new("drama", Family::Creative),
                CourseFamily::new("photography", Family::Creative),
            ],
            default_family: Family::Analytical,
        }
    }

    pub fn course_family(&self, course: &str) -> Option<Family> {
        let course = course.to_lowercase();
        self.course_families
            .iter()
            .find(|entry| keyword_matches(&course, &entry.pattern))
            .map(|entry| entry.family)
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Stateless classifier over a borrowed rule set.
#[derive(Debug, Clone, Copy)]
pub struct FamilyClassifier<'a> {
    rules: &'a ClassifierRules,
}

impl<'a> FamilyClassifier<'a> {
    pub fn new(rules: &'a ClassifierRules) -> Self {
        Self { rules }
    }

    /// Classifies from the record's text alone, ignoring any cached family.
    pub fn classify(&self, assignment: &Assignment) -> Family {
        self.classify_parts(
            &assignment.title,
            &assignment.subject,
            assignment.course_name.as_deref(),
        )
    }

    pub fn classify_parts(&self, title: &str, subject: &str, course_name: Option<&str>) -> Family {
        let title = title.to_lowercase();
        let rules = self.rules;

        if mentions_any(&title, &rules.creative) {
            return Family::Creative;
        }
        if mentions_any(&title, &rules.composition) {
            return Family::Composition;
        }
        if mentions_any(&title, &rules.reading) {
            return Family::Humanities;
        }
        if mentions_any(&title, &rules.analytical) {
            return Family::Analytical;
        }

        course_name
            .filter(|course| !course.trim().is_empty())
            .and_then(|course| rules.course_family(course))
            .or_else(|| rules.course_family(subject))
            .unwrap_or(rules.default_family)
    }

    /// Family used for placement: a cached academic family wins, otherwise recompute.
    pub fn family_of(&self, assignment: &Assignment) -> Family {
        match assignment.detected_family {
            Some(family) if family != Family::StudyHall => family,
            _ => self.classify(assignment),
        }
    }
}

/// Case-insensitive substring match; `haystack` must already be lowercase.
pub(crate) fn mentions_any(haystack: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| keyword_matches(haystack, keyword))
}

fn keyword_matches(haystack: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    !keyword.is_empty() && haystack.contains(&keyword.to_lowercase())
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| word.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(title: &str, subject: &str, course: Option<&str>) -> Family {
        let rules = ClassifierRules::standard();
        FamilyClassifier::new(&rules).classify_parts(title, subject, course)
    }

    #[test]
    fn creative_keyword_beats_course_default() {
        assert_eq!(
            classify("Create a timeline poster", "History", Some("American History")),
            Family::Creative
        );
    }

    #[test]
    fn keyword_rules_apply_in_priority_order() {
        // "draft" (composition) and "chapter" (reading) both match; composition is checked first.
        assert_eq!(classify("Draft chapter summary", "Science", None), Family::Composition);
        assert_eq!(classify("Read chapter 4", "Math", None), Family::Humanities);
        assert_eq!(classify("Solve equations 1-20", "History", None), Family::Analytical);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("ESSAY on the Civil War", "History", None), Family::Composition);
    }

    #[test]
    fn course_name_then_subject_then_default() {
        assert_eq!(classify("Lesson 12", "Math", Some("World History")), Family::Humanities);
        assert_eq!(classify("Lesson 12", "Biology", None), Family::Analytical);
        assert_eq!(classify("Lesson 12", "Grammar", Some("Unknown Elective")), Family::Composition);
        assert_eq!(classify("Lesson 12", "Homeroom", None), Family::Analytical);
    }

    #[test]
    fn cached_family_is_used_unless_it_is_study_hall() {
        let rules = ClassifierRules::standard();
        let classifier = FamilyClassifier::new(&rules);
        let mut assignment = Assignment::new("a1", "u1", "Solve set 3", "Math");
        assignment.detected_family = Some(Family::Humanities);
        assert_eq!(classifier.family_of(&assignment), Family::Humanities);

        assignment.detected_family = Some(Family::StudyHall);
        assert_eq!(classifier.family_of(&assignment), Family::Analytical);
    }

    #[test]
    fn blank_keywords_never_match() {
        assert!(!mentions_any("anything", &["  ".to_string()]));
        assert!(mentions_any("weekly vocab drill", &["Vocab".to_string()]));
    }
}
