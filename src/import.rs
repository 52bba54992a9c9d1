//! The upload workflow for one term/class/subject selection:
//! select → attach → poll until processed → commit.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::GradebookError;
use crate::intake::{can_upload, check_file, FileDescriptor};
use crate::sheet;
use crate::stats::{mark_stats, MarkStats};
use crate::store::{OverviewStore, Placement};
use crate::summary::{summarize, TermSummary};
use crate::validate::{validate_rows, RawMark, ValidationReport};

pub const PROGRESS_STEP: u8 = 25;
pub const PROGRESS_DONE: u8 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub term: String,
    pub class: String,
    pub subject: String,
}

impl Selection {
    pub fn is_complete(&self) -> bool {
        can_upload(&self.term, &self.class, &self.subject)
    }
}

/// Where the marks of an attached file come from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Rows(Vec<RawMark>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedFile {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub row_count: usize,
    #[serde(skip)]
    rows: Vec<RawMark>,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Processing { progress: u8 },
    Validated { report: ValidationReport },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub batch_id: String,
    pub term: String,
    pub class: String,
    pub subject: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_sha256: Option<String>,
    pub committed_at: String,
    pub summaries: Vec<TermSummary>,
    pub stats: MarkStats,
    /// Earlier batches for the same term/class/subject; nothing is deduplicated.
    pub supersedes_batch_ids: Vec<String>,
    pub excluded: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome<'a> {
    pub progress: u8,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a ValidationReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatus<'a> {
    pub selection: &'a Selection,
    pub can_upload: bool,
    pub phase: &'static str,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<&'a AttachedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'a ImportBatch>,
}

#[derive(Debug, Clone)]
pub struct ImportSession {
    selection: Selection,
    file: Option<AttachedFile>,
    phase: Phase,
    last_batch: Option<usize>,
    batches: Vec<ImportBatch>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            file: None,
            phase: Phase::Idle,
            last_batch: None,
            batches: Vec::new(),
        }
    }
}

impl ImportSession {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn batches(&self) -> &[ImportBatch] {
        &self.batches
    }

    /// Drops the attached file, any validation result and the shown summary.
    pub fn reset(&mut self) {
        self.file = None;
        self.phase = Phase::Idle;
        self.last_batch = None;
    }

    /// Updates the selectors that are given. Returns true when the class changed,
    /// which discards everything derived from the previous class.
    pub fn select(
        &mut self,
        catalog: &Catalog,
        term: Option<&str>,
        class: Option<&str>,
        subject: Option<&str>,
    ) -> Result<bool, GradebookError> {
        let class = class.map(|c| c.trim().to_string());
        if let Some(c) = class.as_deref() {
            if !c.is_empty() && !catalog.has_class(c) {
                return Err(GradebookError::UnknownClass(c.to_string()));
            }
        }

        if let Some(t) = term {
            self.selection.term = t.trim().to_string();
        }
        if let Some(s) = subject {
            self.selection.subject = s.trim().to_string();
        }
        let mut class_changed = false;
        if let Some(c) = class {
            if c != self.selection.class {
                self.selection.class = c;
                self.reset();
                class_changed = true;
            }
        }
        Ok(class_changed)
    }

    /// Runs the intake gate and, if the file passes, replaces whatever was
    /// attached before. A rejected file leaves the session untouched.
    pub fn attach(
        &mut self,
        file: FileDescriptor,
        source: UploadSource,
    ) -> Result<&AttachedFile, GradebookError> {
        if !self.selection.is_complete() {
            return Err(GradebookError::SelectionIncomplete);
        }
        check_file(&file)?;

        let (rows, sha256) = match source {
            UploadSource::Path(path) => {
                let decoded = sheet::read_file(&file, &path)?;
                (decoded.rows, Some(decoded.sha256))
            }
            UploadSource::Rows(rows) => (rows, None),
        };

        self.reset();
        self.phase = Phase::Processing { progress: 0 };
        Ok(&*self.file.insert(AttachedFile {
            file_name: file.file_name,
            mime_type: file.mime_type,
            sha256,
            row_count: rows.len(),
            rows,
        }))
    }

    /// Cancels processing (if still running) and forgets the file.
    pub fn remove_file(&mut self) -> bool {
        let had_file = self.file.is_some();
        self.reset();
        had_file
    }

    /// Advances the simulated processing delay by one step; at 100 the
    /// verdicts are computed and become visible.
    pub fn poll(&mut self, catalog: &Catalog) -> Result<PollOutcome<'_>, GradebookError> {
        let Some(file) = self.file.as_ref() else {
            return Err(GradebookError::NoFileAttached);
        };

        if let Phase::Processing { progress } = self.phase {
            let next = progress.saturating_add(PROGRESS_STEP).min(PROGRESS_DONE);
            if next < PROGRESS_DONE {
                self.phase = Phase::Processing { progress: next };
            } else {
                let roster = catalog.roster(&self.selection.class)?;
                let report = validate_rows(roster, &file.rows);
                tracing::info!(
                    class = %self.selection.class,
                    valid = report.counts.valid,
                    missing = report.counts.missing,
                    invalid = report.counts.invalid,
                    unmatched = report.counts.unmatched,
                    "mark sheet validated"
                );
                self.phase = Phase::Validated { report };
            }
        }

        Ok(match &self.phase {
            Phase::Processing { progress } => PollOutcome {
                progress: *progress,
                done: false,
                report: None,
            },
            Phase::Validated { report } => PollOutcome {
                progress: PROGRESS_DONE,
                done: true,
                report: Some(report),
            },
            Phase::Idle => PollOutcome {
                progress: 0,
                done: false,
                report: None,
            },
        })
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match &self.phase {
            Phase::Validated { report } => Some(report),
            _ => None,
        }
    }

    /// Turns the valid rows into a term summary and appends it to the overview.
    /// Committing the same validation twice appends two independent batches.
    pub fn commit(&mut self, store: &mut OverviewStore) -> Result<&ImportBatch, GradebookError> {
        // A selector may have been blanked after validation.
        if !self.selection.is_complete() {
            return Err(GradebookError::SelectionIncomplete);
        }
        let Some(file) = self.file.as_ref() else {
            return Err(GradebookError::NoFileAttached);
        };
        let Phase::Validated { report } = &self.phase else {
            return Err(GradebookError::NotValidated);
        };

        let summaries = summarize(report);
        if summaries.is_empty() {
            return Err(GradebookError::NothingToCommit);
        }

        let sel = &self.selection;
        let supersedes_batch_ids: Vec<String> = self
            .batches
            .iter()
            .filter(|b| b.term == sel.term && b.class == sel.class && b.subject == sel.subject)
            .map(|b| b.batch_id.clone())
            .collect();
        if !supersedes_batch_ids.is_empty() {
            tracing::warn!(
                term = %sel.term,
                class = %sel.class,
                subject = %sel.subject,
                earlier = supersedes_batch_ids.len(),
                "re-import appends a second summary for the same selection"
            );
        }

        let batch_id = Uuid::new_v4().to_string();
        store.append_summaries(
            &summaries,
            &Placement {
                class: sel.class.clone(),
                subject: sel.subject.clone(),
                term: sel.term.clone(),
                batch_id: Some(batch_id.clone()),
            },
        );

        let batch = ImportBatch {
            batch_id,
            term: sel.term.clone(),
            class: sel.class.clone(),
            subject: sel.subject.clone(),
            file_name: file.file_name.clone(),
            file_sha256: file.sha256.clone(),
            committed_at: Utc::now().to_rfc3339(),
            stats: mark_stats(summaries.iter().map(|s| s.mark)),
            excluded: report.rows.len() - summaries.len(),
            summaries,
            supersedes_batch_ids,
        };
        tracing::info!(
            batch_id = %batch.batch_id,
            committed = batch.summaries.len(),
            excluded = batch.excluded,
            "term summary committed"
        );

        self.batches.push(batch);
        self.last_batch = Some(self.batches.len() - 1);
        Ok(&self.batches[self.batches.len() - 1])
    }

    pub fn status(&self) -> ImportStatus<'_> {
        let (phase, progress) = match &self.phase {
            Phase::Idle => ("idle", 0),
            Phase::Processing { progress } => ("processing", *progress),
            Phase::Validated { .. } => ("validated", PROGRESS_DONE),
        };
        ImportStatus {
            selection: &self.selection,
            can_upload: self.selection.is_complete(),
            phase,
            progress,
            file: self.file.as_ref(),
            report: self.report(),
            summary: self.last_batch.and_then(|i| self.batches.get(i)),
        }
    }
}
