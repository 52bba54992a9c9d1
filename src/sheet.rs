//! Mark sheet decoding. CSV goes through `csv`, Excel workbooks through
//! `calamine`; both end up as a grid of strings so the header handling is shared.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use sha2::{Digest, Sha256};

use crate::error::GradebookError;
use crate::intake::{sheet_format, FileDescriptor, SheetFormat};
use crate::validate::RawMark;

const ID_HEADERS: [&str; 4] = ["studentid", "id", "studentno", "studentnumber"];
const MARK_HEADERS: [&str; 3] = ["mark", "marks", "score"];

/// A decoded upload plus the content hash recorded against the import.
#[derive(Debug, Clone)]
pub struct DecodedSheet {
    pub rows: Vec<RawMark>,
    pub sha256: String,
}

pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn unreadable(file: &FileDescriptor, reason: impl Into<String>) -> GradebookError {
    GradebookError::UnreadableFile {
        file_name: file.file_name.clone(),
        reason: reason.into(),
    }
}

fn normalize_header(h: &str) -> String {
    h.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Finds (student id column, mark column) in a header row.
pub fn locate_columns(headers: &[String]) -> Option<(usize, usize)> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let find = |wanted: &[&str]| {
        normalized
            .iter()
            .position(|h| wanted.contains(&h.as_str()))
    };
    Some((find(&ID_HEADERS)?, find(&MARK_HEADERS)?))
}

fn grid_to_rows(
    file: &FileDescriptor,
    grid: Vec<Vec<String>>,
) -> Result<Vec<RawMark>, GradebookError> {
    let mut lines = grid.into_iter();
    let Some(headers) = lines.next() else {
        return Err(unreadable(file, "file is empty"));
    };
    let Some((id_col, mark_col)) = locate_columns(&headers) else {
        return Err(unreadable(
            file,
            "header row needs a student id column and a mark column",
        ));
    };

    let mut rows = Vec::new();
    for line in lines {
        let id = line.get(id_col).map(|s| s.trim()).unwrap_or("");
        let mark = line.get(mark_col).map(|s| s.trim()).unwrap_or("");
        // A row with a mark but no id still reaches the validator as unmatched.
        if id.is_empty() && mark.is_empty() {
            continue;
        }
        rows.push(RawMark::new(id, mark));
    }
    Ok(rows)
}

fn csv_grid(file: &FileDescriptor, bytes: &[u8]) -> Result<Vec<Vec<String>>, GradebookError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    // Windows-1252 exports decode lossily instead of failing.
    let mut grid = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| unreadable(file, e.to_string()))?;
        grid.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(grid)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

fn workbook_grid(
    file: &FileDescriptor,
    bytes: &[u8],
) -> Result<Vec<Vec<String>>, GradebookError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| unreadable(file, format!("failed to open workbook: {e}")))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let Some(first_sheet) = sheet_names.first() else {
        return Err(unreadable(file, "workbook has no sheets"));
    };
    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| unreadable(file, format!("failed to read sheet: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

pub fn decode(file: &FileDescriptor, bytes: &[u8]) -> Result<DecodedSheet, GradebookError> {
    let grid = match sheet_format(file) {
        Some(SheetFormat::Csv) => csv_grid(file, bytes)?,
        Some(SheetFormat::Workbook) => workbook_grid(file, bytes)?,
        None => {
            return Err(GradebookError::InvalidFileType {
                file_name: file.file_name.clone(),
                mime_type: file.mime_type.clone(),
            })
        }
    };
    Ok(DecodedSheet {
        rows: grid_to_rows(file, grid)?,
        sha256: fingerprint(bytes),
    })
}

pub fn read_file(file: &FileDescriptor, path: &Path) -> Result<DecodedSheet, GradebookError> {
    let bytes = std::fs::read(path).map_err(|e| unreadable(file, e.to_string()))?;
    decode(file, &bytes)
}
