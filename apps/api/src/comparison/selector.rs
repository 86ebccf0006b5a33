//! Comparison Selector: at most two resumes, always for the same posting.
//!
//! Whenever the selection holds two records they share `(job_title, company_name)`.
//! Rejected toggles leave the selection untouched.

use serde::Serialize;
use thiserror::Error;

use crate::models::resume::ResumeRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("only resumes for the same job title and company can be compared")]
    IncompatiblePair,

    #[error("only two resumes can be compared at a time")]
    SelectionFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Selected,
    Deselected,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    picks: Vec<ResumeRecord>,
}

impl Selection {
    /// Rebuilds a selection from `records` in order, skipping any that the
    /// toggle rules would reject.
    pub fn from_records(records: impl IntoIterator<Item = ResumeRecord>) -> Self {
        let mut selection = Self::default();
        for record in records {
            let _ = selection.toggle(record);
        }
        selection
    }

    /// Deselects `candidate` if already picked, otherwise tries to add it.
    pub fn toggle(&mut self, candidate: ResumeRecord) -> Result<Toggle, SelectionError> {
        if let Some(pos) = self.picks.iter().position(|r| r.id == candidate.id) {
            self.picks.remove(pos);
            return Ok(Toggle::Deselected);
        }

        match self.picks.as_slice() {
            [] => {}
            [first] if first.same_posting(&candidate) => {}
            [_] => return Err(SelectionError::IncompatiblePair),
            _ => return Err(SelectionError::SelectionFull),
        }

        self.picks.push(candidate);
        Ok(Toggle::Selected)
    }

    pub fn ids(&self) -> Vec<String> {
        self.picks.iter().map(|r| r.id.clone()).collect()
    }

    pub fn records(&self) -> &[ResumeRecord] {
        &self.picks
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.picks.iter().any(|r| r.id == id)
    }

    /// Drops `id` from the selection, returning whether it was picked.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.picks.len();
        self.picks.retain(|r| r.id != id);
        self.picks.len() != before
    }

    pub fn clear(&mut self) {
        self.picks.clear();
    }

    /// Both picks in selection order, once the selection is full.
    pub fn pair(&self) -> Option<(&ResumeRecord, &ResumeRecord)> {
        match self.picks.as_slice() {
            [left, right] => Some((left, right)),
            _ => None,
        }
    }

    pub fn recommend(&self) -> Option<&ResumeRecord> {
        recommend(&self.picks)
    }
}

/// The higher-scoring of exactly two records; ties go to the first selected.
/// `None` for any other selection size.
pub fn recommend(selection: &[ResumeRecord]) -> Option<&ResumeRecord> {
    match selection {
        [left, right] if left.feedback.overall_score >= right.feedback.overall_score => Some(left),
        [_, right] => Some(right),
        _ => None,
    }
}
