use indexmap::IndexMap;
use serde::Serialize;

use crate::error::GradebookError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student_id: String,
    pub student_name: String,
}

impl RosterEntry {
    pub fn new(student_id: impl Into<String>, student_name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            student_name: student_name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub name: String,
    pub student_count: usize,
}

/// Reference data for one session: class rosters plus the subject and term pickers.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rosters: IndexMap<String, Vec<RosterEntry>>,
    subjects: Vec<String>,
    terms: Vec<String>,
}

impl Catalog {
    pub fn new(subjects: Vec<String>, terms: Vec<String>) -> Self {
        Self {
            rosters: IndexMap::new(),
            subjects,
            terms,
        }
    }

    pub fn with_class(mut self, name: impl Into<String>, roster: Vec<RosterEntry>) -> Self {
        self.rosters.insert(name.into(), roster);
        self
    }

    pub fn roster(&self, class: &str) -> Result<&[RosterEntry], GradebookError> {
        self.rosters
            .get(class)
            .map(|r| r.as_slice())
            .ok_or_else(|| GradebookError::UnknownClass(class.to_string()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.rosters.contains_key(class)
    }

    pub fn classes(&self) -> Vec<ClassSummary> {
        self.rosters
            .iter()
            .map(|(name, roster)| ClassSummary {
                name: name.clone(),
                student_count: roster.len(),
            })
            .collect()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.rosters.keys().map(|k| k.as_str())
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

const SEED_SUBJECTS: [&str; 5] = ["Mathematics", "English", "Science", "History", "Geography"];
const SEED_TERMS: [&str; 3] = ["Term 1", "Term 2", "Term 3"];

const SEED_CLASSES: [(&str, &str, &[&str]); 3] = [
    (
        "Grade 10A",
        "10A",
        &[
            "Amara Okafor",
            "Ben Carter",
            "Chloe Nguyen",
            "Daniel Mensah",
            "Eva Rossi",
            "Farid Haddad",
            "Grace Liu",
            "Hugo Martin",
            "Isla Brown",
            "Jonah Patel",
            "Keira Walsh",
            "Liam Osei",
        ],
    ),
    (
        "Grade 10B",
        "10B",
        &[
            "Maya Schmidt",
            "Noah Kim",
            "Olivia Santos",
            "Priya Sharma",
            "Quinn Murphy",
            "Rafael Costa",
            "Sara Ahmed",
            "Tomas Novak",
            "Uma Reddy",
            "Victor Dubois",
        ],
    ),
    (
        "Grade 11A",
        "11A",
        &[
            "Wen Zhao",
            "Xavier Lopez",
            "Yara Haddad",
            "Zoe Fischer",
            "Adam Byrne",
            "Bella Moreau",
            "Caleb Wright",
            "Dina Kovac",
        ],
    ),
];

/// The built-in school roster every session starts from.
pub fn seed_catalog() -> Catalog {
    let mut catalog = Catalog::new(
        SEED_SUBJECTS.iter().map(|s| s.to_string()).collect(),
        SEED_TERMS.iter().map(|s| s.to_string()).collect(),
    );
    for (class, code, names) in SEED_CLASSES {
        let roster = names
            .iter()
            .enumerate()
            .map(|(i, name)| RosterEntry::new(format!("STU-{code}-{:03}", i + 1), *name))
            .collect();
        catalog = catalog.with_class(class, roster);
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_catalog_keeps_class_order_and_unique_ids() {
        let catalog = seed_catalog();
        let names: Vec<&str> = catalog.class_names().collect();
        assert_eq!(names, vec!["Grade 10A", "Grade 10B", "Grade 11A"]);

        let roster = catalog.roster("Grade 10A").expect("roster");
        assert_eq!(roster[0].student_id, "STU-10A-001");
        assert_eq!(roster.len(), 12);

        let mut ids: Vec<&str> = names
            .iter()
            .flat_map(|c| catalog.roster(c).unwrap().iter().map(|r| r.student_id.as_str()))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn unknown_class_is_an_error() {
        let err = seed_catalog().roster("Grade 12Z").unwrap_err();
        assert_eq!(err, GradebookError::UnknownClass("Grade 12Z".into()));
    }
}
