//! Home-page listing: filter, order and paginate resume records.

use chrono::NaiveDate;

use crate::models::resume::{ResumeRecord, Stage};

/// Filters applied to the resume list. Unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeFilter {
    /// Case-insensitive substring of the candidate name.
    pub name: Option<String>,
    /// UTC calendar day of `issued_at`.
    pub date: Option<NaiveDate>,
    pub stage: Option<Stage>,
}

impl ResumeFilter {
    pub fn matches(&self, record: &ResumeRecord) -> bool {
        let name_ok = match self.name.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => record
                .candidate_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle.to_lowercase())),
        };
        let date_ok = self
            .date
            .map_or(true, |day| record.issued_at.date_naive() == day);
        let stage_ok = self.stage.map_or(true, |stage| record.stage == stage);

        name_ok && date_ok && stage_ok
    }
}

/// Applies `filter` and orders the result newest first.
pub fn filter_records(records: Vec<ResumeRecord>, filter: &ResumeFilter) -> Vec<ResumeRecord> {
    let mut matched: Vec<ResumeRecord> = records.into_iter().filter(|r| filter.matches(r)).collect();
    matched.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
    matched
}

/// 1-indexed page slice. Pages past the end (and page 0) are empty, not errors.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}
