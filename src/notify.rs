use serde::Serialize;

use crate::grade::{Grade, PassFail};
use crate::validate::ValidationCounts;

/// Outcome events for the UI's toast/banner layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    #[serde(rename_all = "camelCase")]
    FileAccepted { file_name: String, row_count: usize },
    #[serde(rename_all = "camelCase")]
    InvalidFileType { file_name: String, message: String },
    #[serde(rename_all = "camelCase")]
    ImportValidated { counts: ValidationCounts },
    #[serde(rename_all = "camelCase")]
    ImportCommitted {
        batch_id: String,
        committed: usize,
        excluded: usize,
    },
    #[serde(rename_all = "camelCase")]
    GradeUpdated {
        id: u64,
        mark: u8,
        grade: Grade,
        status: PassFail,
    },
    #[serde(rename_all = "camelCase")]
    InvalidMark { id: u64, message: String },
    #[serde(rename_all = "camelCase")]
    RecordDeleted { id: u64, student_name: String },
}
