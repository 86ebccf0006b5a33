//! Feedback scoring: pluggable backend that turns a resume document into the
//! model's raw reply. Parsing and normalization happen in `pipeline::feedback`.
//!
//! `AppState` holds an `Arc<dyn FeedbackScorer>`; tests swap in a stub.

use async_trait::async_trait;

use crate::llm_client::prompts::{scoring_prompt, SCORING_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};

/// The posting a resume is scored against.
#[derive(Debug, Clone, Default)]
pub struct JobPosting {
    pub job_title: String,
    pub job_description: String,
}

#[async_trait]
pub trait FeedbackScorer: Send + Sync {
    /// Returns free-form text expected to embed one Feedback JSON object.
    async fn score(&self, document: &[u8], job: &JobPosting) -> Result<String, LlmError>;
}

/// Default scorer: sends the PDF to Claude as a document block.
pub struct LlmFeedbackScorer {
    llm: LlmClient,
}

impl LlmFeedbackScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FeedbackScorer for LlmFeedbackScorer {
    async fn score(&self, document: &[u8], job: &JobPosting) -> Result<String, LlmError> {
        let prompt = scoring_prompt(&job.job_title, &job.job_description);
        self.llm
            .call_with_document(document, "application/pdf", &prompt, SCORING_SYSTEM)
            .await
    }
}
