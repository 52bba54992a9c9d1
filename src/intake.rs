use std::path::Path;

use serde::Deserialize;

use crate::error::GradebookError;

pub const ACCEPTED_MIME_TYPES: [&str; 3] = [
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// What the UI tells us about a picked file before any bytes are read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub file_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

pub fn can_upload(term: &str, class: &str, subject: &str) -> bool {
    [term, class, subject].iter().all(|s| !s.trim().is_empty())
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

fn mime(file: &FileDescriptor) -> Option<String> {
    file.mime_type
        .as_deref()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
}

pub fn is_acceptable_file(file: &FileDescriptor) -> bool {
    let mime_ok = mime(file)
        .map(|m| ACCEPTED_MIME_TYPES.contains(&m.as_str()))
        .unwrap_or(false);
    let ext_ok = extension(&file.file_name)
        .map(|e| ACCEPTED_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false);
    mime_ok || ext_ok
}

pub fn check_file(file: &FileDescriptor) -> Result<(), GradebookError> {
    if is_acceptable_file(file) {
        Ok(())
    } else {
        Err(GradebookError::InvalidFileType {
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
        })
    }
}

/// Extension decides; MIME type only breaks the tie when the name has none we know.
pub fn sheet_format(file: &FileDescriptor) -> Option<SheetFormat> {
    match extension(&file.file_name).as_deref() {
        Some("csv") => return Some(SheetFormat::Csv),
        Some("xlsx") | Some("xls") => return Some(SheetFormat::Workbook),
        _ => {}
    }
    match mime(file).as_deref() {
        Some("text/csv") => Some(SheetFormat::Csv),
        Some(m) if ACCEPTED_MIME_TYPES.contains(&m) => Some(SheetFormat::Workbook),
        _ => None,
    }
}
