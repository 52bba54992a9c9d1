use anyhow::{Context, Result};

use crate::catalog::RosterEntry;
use crate::store::GradeRecord;

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Blank mark sheet for a class: one row per roster member, mark left empty.
pub fn roster_template_csv(roster: &[RosterEntry]) -> Result<String> {
    let mut wtr = writer();
    wtr.write_record(["studentId", "studentName", "mark"])
        .context("Failed to write CSV headers")?;
    for entry in roster {
        wtr.write_record([entry.student_id.as_str(), entry.student_name.as_str(), ""])
            .context("Failed to write CSV record")?;
    }
    finish(wtr)
}

/// Export grade records to CSV text
pub fn records_csv<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    let mut wtr = writer();
    wtr.write_record([
        "id",
        "studentId",
        "studentName",
        "class",
        "subject",
        "term",
        "mark",
        "grade",
        "status",
    ])
    .context("Failed to write CSV headers")?;

    for r in records {
        wtr.write_record([
            r.id.to_string(),
            r.student_id.clone(),
            r.student_name.clone(),
            r.class.clone(),
            r.subject.clone(),
            r.term.clone(),
            r.mark.to_string(),
            r.grade.to_string(),
            r.status.to_string(),
        ])
        .context("Failed to write CSV record")?;
    }
    finish(wtr)
}
