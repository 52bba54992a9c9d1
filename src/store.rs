//! The overview: every committed grade record of the session, with a single
//! inline mark editor and a filtered, paginated view.

use serde::Serialize;

use crate::error::GradebookError;
use crate::grade::{derive, parse_mark, Grade, PassFail};
use crate::summary::TermSummary;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub id: u64,
    pub student_id: String,
    pub student_name: String,
    pub class: String,
    pub subject: String,
    pub term: String,
    pub mark: u8,
    pub grade: Grade,
    pub status: PassFail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl GradeRecord {
    fn set_mark(&mut self, mark: u8) {
        let (grade, status) = derive(mark);
        self.mark = mark;
        self.grade = grade;
        self.status = status;
    }
}

/// Where a record goes: which class/subject/term it belongs to and which import made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub class: String,
    pub subject: String,
    pub term: String,
    pub batch_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Viewing,
    Editing { draft: String },
}

#[derive(Debug, Clone)]
struct Entry {
    record: GradeRecord,
    state: RowState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewFilters {
    pub class: Option<String>,
    pub subject: Option<String>,
    pub term: Option<String>,
    pub search: Option<String>,
}

/// `None`, blank and the `"all"` sentinel all mean "no predicate".
fn normalize_choice(raw: Option<&str>) -> Option<String> {
    let t = raw?.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(t.to_string())
    }
}

impl OverviewFilters {
    pub fn new(
        class: Option<&str>,
        subject: Option<&str>,
        term: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        // Surrounding spaces are part of the query; blank disables it.
        let search = search
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_lowercase());
        Self {
            class: normalize_choice(class),
            subject: normalize_choice(subject),
            term: normalize_choice(term),
            search,
        }
    }

    pub fn from_params(raw: Option<&serde_json::Value>) -> Result<Self, String> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        if raw.is_null() {
            return Ok(Self::default());
        }
        let Some(obj) = raw.as_object() else {
            return Err("filters must be an object".to_string());
        };

        let field = |name: &str| -> Result<Option<&str>, String> {
            match obj.get(name) {
                None => Ok(None),
                Some(v) if v.is_null() => Ok(None),
                Some(v) => v
                    .as_str()
                    .map(Some)
                    .ok_or_else(|| format!("filters.{name} must be string or null")),
            }
        };

        Ok(Self::new(
            field("class")?,
            field("subject")?,
            field("term")?,
            field("search")?,
        ))
    }

    pub fn matches(&self, r: &GradeRecord) -> bool {
        if let Some(c) = &self.class {
            if &r.class != c {
                return false;
            }
        }
        if let Some(s) = &self.subject {
            if &r.subject != s {
                return false;
            }
        }
        if let Some(t) = &self.term {
            if &r.term != t {
                return false;
            }
        }
        if let Some(q) = &self.search {
            if !r.student_name.to_lowercase().contains(q.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// 1-indexed. Out-of-range pages are clamped so a view never lands past the end.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, page: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_pages(total_items, page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start = ((page - 1) * page_size).min(total_items);
    let end = (start + page_size).min(total_items);
    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_items,
        total_pages,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    #[serde(flatten)]
    pub record: GradeRecord,
    pub editing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OverviewStore {
    entries: Vec<Entry>,
    next_id: u64,
    filters: OverviewFilters,
    page: usize,
    page_size: usize,
}

impl Default for OverviewStore {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl OverviewStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            filters: OverviewFilters::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, summary: &TermSummary, placement: &Placement) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            record: GradeRecord {
                id,
                student_id: summary.student_id.clone(),
                student_name: summary.student_name.clone(),
                class: placement.class.clone(),
                subject: placement.subject.clone(),
                term: placement.term.clone(),
                mark: summary.mark,
                grade: summary.grade,
                status: summary.status,
                batch_id: placement.batch_id.clone(),
            },
            state: RowState::Viewing,
        });
        id
    }

    /// Appends a committed batch. Ids are fresh and never reused within the session.
    pub fn append_summaries(
        &mut self,
        summaries: &[TermSummary],
        placement: &Placement,
    ) -> Vec<u64> {
        summaries
            .iter()
            .map(|s| self.insert(s, placement))
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &GradeRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn get(&self, id: u64) -> Option<&GradeRecord> {
        self.entries.iter().find(|e| e.record.id == id).map(|e| &e.record)
    }

    pub fn state_of(&self, id: u64) -> Option<&RowState> {
        self.entries.iter().find(|e| e.record.id == id).map(|e| &e.state)
    }

    pub fn editing_id(&self) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| matches!(e.state, RowState::Editing { .. }))
            .map(|e| e.record.id)
    }

    fn entry_mut(&mut self, id: u64) -> Result<&mut Entry, GradebookError> {
        self.entries
            .iter_mut()
            .find(|e| e.record.id == id)
            .ok_or(GradebookError::RecordNotFound(id))
    }

    pub fn filter(&self, filters: &OverviewFilters) -> Vec<&GradeRecord> {
        self.records().filter(|r| filters.matches(r)).collect()
    }

    pub fn filters(&self) -> &OverviewFilters {
        &self.filters
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns true when the filters changed, in which case the view is back on page 1.
    pub fn set_filters(&mut self, filters: OverviewFilters) -> bool {
        if filters == self.filters {
            return false;
        }
        self.filters = filters;
        self.page = 1;
        true
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        let count = self.filter(&self.filters).len();
        self.page = page.clamp(1, total_pages(count, self.page_size).max(1));
    }

    pub fn current_view(&self) -> Page<RecordView> {
        let rows: Vec<RecordView> = self
            .entries
            .iter()
            .filter(|e| self.filters.matches(&e.record))
            .map(|e| RecordView {
                record: e.record.clone(),
                editing: matches!(e.state, RowState::Editing { .. }),
                draft: match &e.state {
                    RowState::Editing { draft } => Some(draft.clone()),
                    RowState::Viewing => None,
                },
            })
            .collect();
        paginate(&rows, self.page_size, self.page)
    }

    /// Opens the mark editor on `id`, closing any editor already open elsewhere.
    pub fn begin_edit(&mut self, id: u64) -> Result<&GradeRecord, GradebookError> {
        self.entry_mut(id)?;
        for e in self.entries.iter_mut() {
            if e.record.id != id {
                e.state = RowState::Viewing;
            }
        }
        let entry = self.entry_mut(id)?;
        if entry.state == RowState::Viewing {
            entry.state = RowState::Editing {
                draft: entry.record.mark.to_string(),
            };
        }
        Ok(&entry.record)
    }

    pub fn commit_edit(&mut self, id: u64, raw_mark: &str) -> Result<&GradeRecord, GradebookError> {
        let entry = self.entry_mut(id)?;
        if entry.state == RowState::Viewing {
            return Err(GradebookError::NotEditing(id));
        }
        match parse_mark(raw_mark) {
            Ok(mark) => {
                entry.record.set_mark(mark);
                entry.state = RowState::Viewing;
                Ok(&entry.record)
            }
            Err(e) => {
                entry.state = RowState::Editing {
                    draft: raw_mark.to_string(),
                };
                Err(e)
            }
        }
    }

    pub fn cancel_edit(&mut self, id: u64) -> Result<&GradeRecord, GradebookError> {
        let entry = self.entry_mut(id)?;
        if entry.state == RowState::Viewing {
            return Err(GradebookError::NotEditing(id));
        }
        entry.state = RowState::Viewing;
        Ok(&entry.record)
    }

    /// Removes the record for good. Callers confirm with the user first.
    pub fn delete(&mut self, id: u64) -> Result<GradeRecord, GradebookError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.record.id == id)
            .ok_or(GradebookError::RecordNotFound(id))?;
        if self.entries[idx].state != RowState::Viewing {
            return Err(GradebookError::EditInProgress(id));
        }
        let removed = self.entries.remove(idx);
        self.set_page(self.page);
        Ok(removed.record)
    }
}
