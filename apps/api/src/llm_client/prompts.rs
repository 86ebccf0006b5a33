// Resume scoring prompt templates.

pub const SCORING_SYSTEM: &str = "\
You are an expert in ATS (Applicant Tracking System) and resume analysis. \
Rate resumes honestly: low scores are fine when the resume is weak. \
Respond with a single JSON object only, with no markdown fences and no commentary.";

pub const RESPONSE_FORMAT: &str = r#"{
  "overallScore": 0,
  "ATS": {"score": 0, "tips": [{"type": "good", "tip": "string"}]},
  "toneAndStyle": {"score": 0, "tips": [{"type": "improve", "tip": "string", "explanation": "string"}]},
  "content": {"score": 0, "tips": []},
  "structure": {"score": 0, "tips": []},
  "skills": {"score": 0, "tips": []}
}"#;

/// User text is substituted once and never re-scanned for placeholders.
pub fn scoring_prompt(job_title: &str, job_description: &str) -> String {
    format!(
        "Analyze the attached resume and rate it against the job below.

JOB TITLE: {job_title}
JOB DESCRIPTION:
{job_description}

Score every category from 0 to 100 and give 3-4 tips per category.
Use type \"good\" for strengths and \"improve\" for weaknesses; \"improve\" tips need an explanation.

Return the feedback using this format:
{response_format}",
        response_format = RESPONSE_FORMAT,
    )
}
