use std::sync::Arc;

use crate::blobs::BlobStore;
use crate::config::Config;
use crate::llm_client::scorer::FeedbackScorer;
use crate::pipeline::engine::PipelineEngine;
use crate::resumes::repository::ResumeRepository;
use crate::session::SessionRegistry;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    /// Pluggable feedback scorer. Default: LlmFeedbackScorer.
    pub scorer: Arc<dyn FeedbackScorer>,
    pub sessions: SessionRegistry,
    pub config: Config,
}

impl AppState {
    pub fn repository(&self) -> ResumeRepository<'_> {
        ResumeRepository::new(self.store.as_ref(), self.blobs.as_ref())
    }

    pub fn engine(&self) -> PipelineEngine<'_> {
        PipelineEngine::new(&self.config.policy)
    }
}
