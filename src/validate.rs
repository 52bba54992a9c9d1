//! Row validation: checks an uploaded mark sheet against the class roster.
//!
//! The output always lists every roster member once, in roster order, followed
//! by the upload rows that matched nobody. Nothing here fails; every problem
//! becomes a verdict with a reason.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::RosterEntry;
use crate::grade;

/// One decoded upload row. `mark_text` is kept verbatim for audit display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMark {
    pub student_id: String,
    pub mark_text: String,
}

impl RawMark {
    pub fn new(student_id: impl Into<String>, mark_text: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            mark_text: mark_text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkStatus {
    Valid,
    Invalid,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowIssue {
    MissingMark,
    OutOfRangeMark,
    NonNumericMark,
    NotWholeNumber,
    UnmatchedStudent,
    DuplicateRow,
}

impl RowIssue {
    pub fn message(self) -> &'static str {
        match self {
            RowIssue::MissingMark => "mark missing",
            RowIssue::OutOfRangeMark => "mark out of range",
            RowIssue::NonNumericMark => "mark not numeric",
            RowIssue::NotWholeNumber => "mark must be a whole number",
            RowIssue::UnmatchedStudent => "student not found",
            RowIssue::DuplicateRow => "duplicate row for student",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMark {
    pub student_id: String,
    pub student_name: String,
    pub mark: Option<f64>,
    pub status: MarkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<RowIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ParsedMark {
    fn valid(entry: &RosterEntry, mark: f64) -> Self {
        Self {
            student_id: entry.student_id.clone(),
            student_name: entry.student_name.clone(),
            mark: Some(mark),
            status: MarkStatus::Valid,
            issue: None,
            error_message: None,
        }
    }

    fn rejected(
        student_id: &str,
        student_name: &str,
        mark: Option<f64>,
        status: MarkStatus,
        issue: RowIssue,
    ) -> Self {
        Self {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            mark,
            status,
            issue: Some(issue),
            error_message: Some(issue.message().to_string()),
        }
    }

    /// Whole mark for rows that passed validation.
    pub fn valid_mark(&self) -> Option<u8> {
        match (self.status, self.mark) {
            (MarkStatus::Valid, Some(m)) => Some(m as u8),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRow {
    pub student_id: String,
    pub mark_text: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationCounts {
    pub valid: usize,
    pub missing: usize,
    pub invalid: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub rows: Vec<ParsedMark>,
    pub duplicates: Vec<DuplicateRow>,
    pub counts: ValidationCounts,
}

impl ValidationReport {
    pub fn valid_rows(&self) -> impl Iterator<Item = &ParsedMark> {
        self.rows.iter().filter(|r| r.status == MarkStatus::Valid)
    }
}

fn id_key(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

enum MarkVerdict {
    Valid(f64),
    Blank,
    Rejected(Option<f64>, RowIssue),
}

fn classify_mark(text: &str) -> MarkVerdict {
    let t = text.trim();
    if t.is_empty() {
        return MarkVerdict::Blank;
    }
    let Ok(v) = t.parse::<f64>() else {
        return MarkVerdict::Rejected(None, RowIssue::NonNumericMark);
    };
    if !v.is_finite() {
        return MarkVerdict::Rejected(None, RowIssue::NonNumericMark);
    }
    if !grade::in_range(v) {
        return MarkVerdict::Rejected(Some(v), RowIssue::OutOfRangeMark);
    }
    if v.fract() != 0.0 {
        return MarkVerdict::Rejected(Some(v), RowIssue::NotWholeNumber);
    }
    MarkVerdict::Valid(v)
}

pub fn validate_rows(roster: &[RosterEntry], raw: &[RawMark]) -> ValidationReport {
    let roster_keys: HashSet<String> = roster.iter().map(|r| id_key(&r.student_id)).collect();

    // First row per student wins; later ones are reported, never re-verdicted.
    let mut by_student: HashMap<String, &RawMark> = HashMap::new();
    let mut duplicates = Vec::new();
    let mut unmatched = Vec::new();
    for row in raw {
        let key = id_key(&row.student_id);
        if !roster_keys.contains(&key) {
            unmatched.push(row);
            continue;
        }
        if by_student.contains_key(&key) {
            duplicates.push(DuplicateRow {
                student_id: row.student_id.clone(),
                mark_text: row.mark_text.clone(),
                error_message: RowIssue::DuplicateRow.message().to_string(),
            });
            continue;
        }
        by_student.insert(key, row);
    }

    let mut counts = ValidationCounts::default();
    let mut rows = Vec::with_capacity(roster.len() + unmatched.len());

    for entry in roster {
        let verdict = match by_student.get(&id_key(&entry.student_id)) {
            None => MarkVerdict::Blank,
            Some(row) => classify_mark(&row.mark_text),
        };
        let parsed = match verdict {
            MarkVerdict::Valid(v) => {
                counts.valid += 1;
                ParsedMark::valid(entry, v)
            }
            MarkVerdict::Blank => {
                counts.missing += 1;
                ParsedMark::rejected(
                    &entry.student_id,
                    &entry.student_name,
                    None,
                    MarkStatus::Missing,
                    RowIssue::MissingMark,
                )
            }
            MarkVerdict::Rejected(mark, issue) => {
                counts.invalid += 1;
                ParsedMark::rejected(
                    &entry.student_id,
                    &entry.student_name,
                    mark,
                    MarkStatus::Invalid,
                    issue,
                )
            }
        };
        rows.push(parsed);
    }

    for row in unmatched {
        counts.unmatched += 1;
        let mark = row.mark_text.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        rows.push(ParsedMark::rejected(
            row.student_id.trim(),
            "",
            mark,
            MarkStatus::Invalid,
            RowIssue::UnmatchedStudent,
        ));
    }

    ValidationReport {
        rows,
        duplicates,
        counts,
    }
}
