//! Printable Markdown renderings of a single review and of a compared pair.

use crate::comparison::report::{CategoryCell, ComparisonReport};
use crate::models::resume::{CategoryKey, ResumeRecord, ScoreBand, Tip, TipKind};

pub fn render_resume_md(record: &ResumeRecord) -> String {
    let name = record.candidate_name.as_deref().unwrap_or("Unnamed candidate");
    let mut md = format!("# Resume Review — {name}\n\n");

    md.push_str(&format!("- **Job:** {}\n", posting_line(record)));
    md.push_str(&format!("- **Stage:** {}\n", record.stage));
    md.push_str(&format!(
        "- **Submitted:** {}\n",
        record.issued_at.format("%Y-%m-%d %H:%M UTC")
    ));
    md.push_str(&format!(
        "- **Overall score:** {}/100 ({})\n\n",
        score_text(record.feedback.overall_score),
        band_label(ScoreBand::of(record.feedback.overall_score))
    ));

    for key in CategoryKey::ALL {
        let category = record.feedback.category(key);
        md.push_str(&format!(
            "## {} — {}/100\n\n",
            key.label(),
            score_text(category.score)
        ));
        if category.tips.is_empty() {
            md.push_str("_No tips._\n\n");
            continue;
        }
        for tip in &category.tips {
            md.push_str(&format!("- {}\n", tip_line(tip)));
        }
        md.push('\n');
    }

    if !record.comments.is_empty() {
        md.push_str("## Comments\n\n");
        for comment in &record.comments {
            md.push_str(&format!(
                "- **{}** ({}): {}\n",
                comment.username,
                comment.created_at.format("%Y-%m-%d"),
                comment.text
            ));
        }
        md.push('\n');
    }

    md
}

pub fn render_comparison_md(report: &ComparisonReport) -> String {
    let left = report.left.candidate_name.as_deref().unwrap_or("Candidate A");
    let right = report.right.candidate_name.as_deref().unwrap_or("Candidate B");

    let mut md = String::from("# Resume Comparison\n\n");
    md.push_str(&format!(
        "- **Job:** {}\n",
        report.job_title.as_deref().unwrap_or("Untitled role")
    ));
    md.push_str(&format!(
        "- **Company:** {}\n\n",
        report.company_name.as_deref().unwrap_or("Unknown company")
    ));

    md.push_str(&format!(
        "| Category | {} | {} |\n",
        table_cell(left),
        table_cell(right)
    ));
    md.push_str("|---|---|---|\n");
    md.push_str(&format!(
        "| Overall | {} | {} |\n",
        score_text(report.left.overall_score),
        score_text(report.right.overall_score)
    ));
    for row in &report.rows {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            row.label,
            score_text(row.left.score),
            score_text(row.right.score)
        ));
    }
    md.push('\n');

    for row in &report.rows {
        md.push_str(&format!("## {}\n\n", row.label));
        push_tips(&mut md, left, &row.left);
        push_tips(&mut md, right, &row.right);
    }

    let recommended = report.recommended();
    md.push_str(&format!(
        "## Recommendation\n\n**{}** with an overall score of {}/100.\n",
        recommended.candidate_name.as_deref().unwrap_or(&recommended.id),
        score_text(recommended.overall_score)
    ));

    md
}

fn push_tips(md: &mut String, name: &str, cell: &CategoryCell) {
    md.push_str(&format!("### {name}\n\n"));
    if cell.tips.is_empty() {
        md.push_str("_No tips._\n\n");
        return;
    }
    for tip in &cell.tips {
        md.push_str(&format!("- {}\n", tip_line(tip)));
    }
    md.push('\n');
}

fn tip_line(tip: &Tip) -> String {
    let mark = match tip.kind {
        TipKind::Good => "✔",
        TipKind::Improve => "⚠",
    };
    match tip.explanation.as_deref() {
        Some(explanation) if !explanation.trim().is_empty() => {
            format!("{mark} {} ({explanation})", tip.text)
        }
        _ => format!("{mark} {}", tip.text),
    }
}

/// Keeps a value inside one Markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn posting_line(record: &ResumeRecord) -> String {
    match (record.job_title.as_deref(), record.company_name.as_deref()) {
        (Some(title), Some(company)) => format!("{title} at {company}"),
        (Some(title), None) => title.to_string(),
        (None, Some(company)) => company.to_string(),
        (None, None) => "Unspecified".to_string(),
    }
}

fn score_text(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Good => "good",
        ScoreBand::Fair => "fair",
        ScoreBand::Poor => "poor",
    }
}
