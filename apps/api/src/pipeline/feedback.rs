//! Feedback normalization: a total, pure mapping from arbitrary JSON (or raw AI
//! reply text) to a structurally complete `Feedback`.
//!
//! Every field access has an explicit default: missing or malformed scores read
//! as `0`, missing or malformed tip lists read as `[]`. Nothing here can fail.

use serde_json::Value;
use tracing::warn;

use crate::models::resume::{Feedback, FeedbackCategory, Tip, TipKind};

/// Normalizes a raw feedback value. Accepts anything, including `null`,
/// non-objects and partial objects.
pub fn normalize_feedback(raw: &Value) -> Feedback {
    Feedback {
        overall_score: read_score(raw.get("overallScore")),
        ats: read_category(raw.get("ATS")),
        tone_and_style: read_category(raw.get("toneAndStyle")),
        content: read_category(raw.get("content")),
        structure: read_category(raw.get("structure")),
        skills: read_category(raw.get("skills")),
    }
}

/// Pulls the embedded JSON object out of a free-form AI reply and normalizes it.
///
/// The candidate object spans from the first `{` to the last `}`. Replies with no
/// such span, or whose span does not parse, normalize as `{}`.
pub fn extract_feedback(reply: &str) -> Feedback {
    let candidate = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => "{}",
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(raw) => normalize_feedback(&raw),
        Err(e) => {
            warn!("AI feedback reply is not valid JSON, using empty feedback: {e}");
            normalize_feedback(&Value::Null)
        }
    }
}

fn read_score(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite())
        .unwrap_or(0.0)
}

fn read_category(value: Option<&Value>) -> FeedbackCategory {
    match value {
        // Some replies collapse a category to its bare score.
        Some(Value::Number(_)) => FeedbackCategory {
            score: read_score(value),
            tips: vec![],
        },
        Some(Value::Object(block)) => FeedbackCategory {
            score: read_score(block.get("score")),
            tips: read_tips(block.get("tips")),
        },
        _ => FeedbackCategory::default(),
    }
}

fn read_tips(value: Option<&Value>) -> Vec<Tip> {
    value
        .and_then(Value::as_array)
        .map(|tips| tips.iter().filter_map(read_tip).collect())
        .unwrap_or_default()
}

/// Tips without text are dropped; an unrecognised `type` reads as `improve`.
fn read_tip(value: &Value) -> Option<Tip> {
    let text = value.get("tip").and_then(Value::as_str)?;
    let kind = match value.get("type").and_then(Value::as_str) {
        Some("good") => TipKind::Good,
        _ => TipKind::Improve,
    };
    let explanation = value
        .get("explanation")
        .and_then(Value::as_str)
        .map(String::from);

    Some(Tip {
        kind,
        text: text.to_string(),
        explanation,
    })
}
