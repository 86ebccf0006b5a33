//! Resume Record: the single unit of persistence for one candidate application.
//!
//! The JSON shape (camelCase field names, `type`/`tip` tip keys, lowercase stage
//! names) is shared with records already written by existing clients and must stay
//! bit-compatible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::pipeline::feedback::normalize_feedback;

/// Store keys for resume records are `resume:<id>`.
pub const RESUME_KEY_PREFIX: &str = "resume:";

/// Pattern matching every resume record key.
pub const RESUME_KEY_PATTERN: &str = "resume:*";

pub fn resume_key(id: &str) -> String {
    format!("{RESUME_KEY_PREFIX}{id}")
}

// ────────────────────────────────────────────────────────────────────────────
// Stage
// ────────────────────────────────────────────────────────────────────────────

/// Hiring-pipeline position. No transition graph is enforced: every stage is
/// reachable from every other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Received,
    Preselection,
    Test,
    Interview,
    Decision,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Received,
        Stage::Preselection,
        Stage::Test,
        Stage::Interview,
        Stage::Decision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Preselection => "preselection",
            Stage::Test => "test",
            Stage::Interview => "interview",
            Stage::Decision => "decision",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Stage::ALL.into_iter().find(|stage| stage.as_str() == s.trim())
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absent, null, or unrecognised stage values read as `received`.
fn lenient_stage<'de, D>(deserializer: D) -> Result<Stage, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(Stage::parse)
        .unwrap_or_default())
}

// ────────────────────────────────────────────────────────────────────────────
// Feedback
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    #[serde(rename = "tip")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackCategory {
    #[serde(serialize_with = "serialize_score")]
    pub score: f64,
    pub tips: Vec<Tip>,
}

/// AI-produced scoring structure. Deserialization never fails: any missing or
/// malformed field is normalized to `score = 0, tips = []`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feedback {
    #[serde(rename = "overallScore", serialize_with = "serialize_score")]
    pub overall_score: f64,
    #[serde(rename = "ATS")]
    pub ats: FeedbackCategory,
    #[serde(rename = "toneAndStyle")]
    pub tone_and_style: FeedbackCategory,
    pub content: FeedbackCategory,
    pub structure: FeedbackCategory,
    pub skills: FeedbackCategory,
}

impl<'de> Deserialize<'de> for Feedback {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(normalize_feedback(&raw))
    }
}

/// The five scored categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CategoryKey {
    #[serde(rename = "ATS")]
    Ats,
    #[serde(rename = "toneAndStyle")]
    ToneAndStyle,
    #[serde(rename = "content")]
    Content,
    #[serde(rename = "structure")]
    Structure,
    #[serde(rename = "skills")]
    Skills,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 5] = [
        CategoryKey::Ats,
        CategoryKey::ToneAndStyle,
        CategoryKey::Content,
        CategoryKey::Structure,
        CategoryKey::Skills,
    ];

    /// JSON field name inside `Feedback`.
    pub fn field(&self) -> &'static str {
        match self {
            CategoryKey::Ats => "ATS",
            CategoryKey::ToneAndStyle => "toneAndStyle",
            CategoryKey::Content => "content",
            CategoryKey::Structure => "structure",
            CategoryKey::Skills => "skills",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryKey::Ats => "ATS",
            CategoryKey::ToneAndStyle => "Tone & Style",
            CategoryKey::Content => "Content",
            CategoryKey::Structure => "Structure",
            CategoryKey::Skills => "Skills",
        }
    }
}

impl Feedback {
    pub fn category(&self, key: CategoryKey) -> &FeedbackCategory {
        match key {
            CategoryKey::Ats => &self.ats,
            CategoryKey::ToneAndStyle => &self.tone_and_style,
            CategoryKey::Content => &self.content,
            CategoryKey::Structure => &self.structure,
            CategoryKey::Skills => &self.skills,
        }
    }
}

/// Colour band used when presenting a score: ≥80 good, ≥50 fair, otherwise poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Good
        } else if score >= 50.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

/// Writes whole scores as JSON integers (`85`, not `85.0`).
fn serialize_score<S>(score: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if score.is_finite() && score.fract() == 0.0 && score.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*score as i64)
    } else {
        serializer.serialize_f64(*score)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Comments
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Older clients wrote numeric user ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Resume Record
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    /// Locator of the original document blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<String>,
    /// Locator of the rendered preview image blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub feedback: Feedback,
    pub issued_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_stage")]
    pub stage: Stage,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
}

impl ResumeRecord {
    pub fn key(&self) -> String {
        resume_key(&self.id)
    }

    /// Whether two records belong to the same posting (job title and company).
    pub fn same_posting(&self, other: &ResumeRecord) -> bool {
        self.job_title == other.job_title && self.company_name == other.company_name
    }

    /// Clears both blob locators, returning the ones that were set.
    pub fn take_locators(&mut self) -> Vec<String> {
        [self.resume_path.take(), self.image_path.take()]
            .into_iter()
            .flatten()
            .collect()
    }
}
