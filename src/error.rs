use serde_json::json;
use thiserror::Error;

/// Recoverable pipeline failures. None of them touch committed state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    #[error("unsupported file type for {file_name}; upload a CSV or Excel file")]
    InvalidFileType {
        file_name: String,
        mime_type: Option<String>,
    },
    #[error("mark must be a whole number between 0 and 100")]
    InvalidMark { raw: String },
    #[error("select a term, class and subject before uploading")]
    SelectionIncomplete,
    #[error("unknown class: {0}")]
    UnknownClass(String),
    #[error("could not read {file_name}: {reason}")]
    UnreadableFile { file_name: String, reason: String },
    #[error("no file attached")]
    NoFileAttached,
    #[error("validation has not finished")]
    NotValidated,
    #[error("no valid marks to commit")]
    NothingToCommit,
    #[error("record {0} not found")]
    RecordNotFound(u64),
    #[error("record {0} is not being edited")]
    NotEditing(u64),
    #[error("record {0} is being edited")]
    EditInProgress(u64),
}

impl GradebookError {
    pub fn code(&self) -> &'static str {
        match self {
            GradebookError::InvalidFileType { .. } => "invalid_file_type",
            GradebookError::InvalidMark { .. } => "invalid_mark",
            GradebookError::SelectionIncomplete => "selection_incomplete",
            GradebookError::UnknownClass(_) => "unknown_class",
            GradebookError::UnreadableFile { .. } => "unreadable_file",
            GradebookError::NoFileAttached => "no_file",
            GradebookError::NotValidated => "not_validated",
            GradebookError::NothingToCommit => "nothing_to_commit",
            GradebookError::RecordNotFound(_) => "not_found",
            GradebookError::NotEditing(_) => "not_editing",
            GradebookError::EditInProgress(_) => "edit_in_progress",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            GradebookError::InvalidFileType {
                file_name,
                mime_type,
            } => Some(json!({ "fileName": file_name, "mimeType": mime_type })),
            GradebookError::InvalidMark { raw } => Some(json!({ "value": raw })),
            GradebookError::UnknownClass(class) => Some(json!({ "class": class })),
            GradebookError::UnreadableFile { file_name, .. } => {
                Some(json!({ "fileName": file_name }))
            }
            GradebookError::RecordNotFound(id)
            | GradebookError::NotEditing(id)
            | GradebookError::EditInProgress(id) => Some(json!({ "id": id })),
            _ => None,
        }
    }
}
