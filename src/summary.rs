use serde::Serialize;

use crate::grade::{derive, Grade, PassFail};
use crate::validate::ValidationReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSummary {
    pub student_id: String,
    pub student_name: String,
    pub mark: u8,
    pub grade: Grade,
    pub status: PassFail,
}

impl TermSummary {
    pub fn new(student_id: impl Into<String>, student_name: impl Into<String>, mark: u8) -> Self {
        let (grade, status) = derive(mark);
        Self {
            student_id: student_id.into(),
            student_name: student_name.into(),
            mark,
            grade,
            status,
        }
    }
}

/// Only rows that validated cleanly make it into a summary; roster order is kept.
pub fn summarize(report: &ValidationReport) -> Vec<TermSummary> {
    report
        .valid_rows()
        .filter_map(|row| {
            row.valid_mark()
                .map(|m| TermSummary::new(row.student_id.clone(), row.student_name.clone(), m))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RosterEntry;
    use crate::validate::{validate_rows, RawMark};

    #[test]
    fn only_valid_rows_are_summarized() {
        let roster = vec![
            RosterEntry::new("S1", "Ada"),
            RosterEntry::new("S2", "Bo"),
            RosterEntry::new("S3", "Cy"),
        ];
        let report = validate_rows(
            &roster,
            &[RawMark::new("S1", "72"), RawMark::new("S3", "40")],
        );
        let summary = summarize(&report);
        assert_eq!(
            summary,
            vec![
                TermSummary {
                    student_id: "S1".into(),
                    student_name: "Ada".into(),
                    mark: 72,
                    grade: Grade::B,
                    status: PassFail::Pass,
                },
                TermSummary {
                    student_id: "S3".into(),
                    student_name: "Cy".into(),
                    mark: 40,
                    grade: Grade::F,
                    status: PassFail::Fail,
                },
            ]
        );
    }
}
