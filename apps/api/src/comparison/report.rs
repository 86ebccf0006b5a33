//! Side-by-side score table for a compared pair.

use serde::Serialize;

use crate::comparison::selector::Selection;
use crate::models::resume::{CategoryKey, FeedbackCategory, ResumeRecord, ScoreBand, Tip};

/// Tips shown per candidate per category.
pub const TIPS_PER_SIDE: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateColumn {
    pub id: String,
    pub candidate_name: Option<String>,
    pub overall_score: f64,
    pub band: ScoreBand,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCell {
    pub score: f64,
    pub band: ScoreBand,
    pub tips: Vec<Tip>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub category: CategoryKey,
    pub label: &'static str,
    pub left: CategoryCell,
    pub right: CategoryCell,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub left: CandidateColumn,
    pub right: CandidateColumn,
    pub rows: Vec<CategoryRow>,
    pub recommended_id: String,
}

impl ComparisonReport {
    pub fn recommended(&self) -> &CandidateColumn {
        if self.recommended_id == self.left.id {
            &self.left
        } else {
            &self.right
        }
    }
}

/// Builds the table once the selection holds a pair; `None` otherwise.
pub fn build_comparison(selection: &Selection) -> Option<ComparisonReport> {
    let (left, right) = selection.pair()?;
    let recommended = selection.recommend()?;

    let rows = CategoryKey::ALL
        .into_iter()
        .map(|key| CategoryRow {
            category: key,
            label: key.label(),
            left: cell(left.feedback.category(key)),
            right: cell(right.feedback.category(key)),
        })
        .collect();

    Some(ComparisonReport {
        job_title: left.job_title.clone(),
        company_name: left.company_name.clone(),
        left: column(left),
        right: column(right),
        rows,
        recommended_id: recommended.id.clone(),
    })
}

fn column(record: &ResumeRecord) -> CandidateColumn {
    CandidateColumn {
        id: record.id.clone(),
        candidate_name: record.candidate_name.clone(),
        overall_score: record.feedback.overall_score,
        band: ScoreBand::of(record.feedback.overall_score),
    }
}

fn cell(category: &FeedbackCategory) -> CategoryCell {
    CategoryCell {
        score: category.score,
        band: ScoreBand::of(category.score),
        tips: category.tips.iter().take(TIPS_PER_SIDE).cloned().collect(),
    }
}
