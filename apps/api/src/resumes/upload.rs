//! Upload flow: store the document and preview, persist a record with empty
//! feedback, score the document, then persist the normalized feedback.

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blobs::BlobStore;
use crate::errors::AppError;
use crate::llm_client::scorer::{FeedbackScorer, JobPosting};
use crate::models::resume::{Feedback, ResumeRecord, Stage};
use crate::pipeline::feedback::extract_feedback;
use crate::resumes::repository::ResumeRepository;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some("application/pdf")
            || self.file_name.to_lowercase().ends_with(".pdf")
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub company_name: Option<String>,
    pub candidate_name: Option<String>,
    pub job_title: Option<String>,
    pub job_description: String,
    pub resume: UploadedFile,
    pub preview: Option<UploadedFile>,
}

impl UploadRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.resume.data.is_empty() {
            return Err(AppError::Validation("resume file is empty".to_string()));
        }
        if !self.resume.is_pdf() {
            return Err(AppError::Validation("resume must be a PDF".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    Complete,
    /// The record was kept with zeroed feedback.
    ScoringFailed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub resume: ResumeRecord,
    #[serde(flatten)]
    pub status: UploadStatus,
}

pub async fn process_upload(
    repo: &ResumeRepository<'_>,
    scorer: &dyn FeedbackScorer,
    request: UploadRequest,
) -> Result<UploadOutcome, AppError> {
    request.validate()?;

    let mut uploaded = Vec::new();
    let mut record = match store_new_record(repo, &request, &mut uploaded).await {
        Ok(record) => record,
        Err(e) => {
            warn!("Upload failed, releasing {} blob(s): {e}", uploaded.len());
            repo.release_blobs(&uploaded).await;
            return Err(e);
        }
    };
    info!("Stored resume {} ({:?})", record.id, record.candidate_name);

    let job = JobPosting {
        job_title: record.job_title.clone().unwrap_or_default(),
        job_description: request.job_description,
    };

    let status = match scorer.score(&request.resume.data, &job).await {
        Ok(reply) => {
            record.feedback = extract_feedback(&reply);
            repo.save(&record).await?;
            info!(
                "Scored resume {}: overall {}",
                record.id, record.feedback.overall_score
            );
            UploadStatus::Complete
        }
        Err(e) => {
            warn!("Scoring failed for resume {}: {e}", record.id);
            UploadStatus::ScoringFailed {
                message: e.to_string(),
            }
        }
    };

    Ok(UploadOutcome {
        resume: record,
        status,
    })
}

/// Writes the blobs and the zeroed record. Every blob written is pushed to
/// `uploaded` so the caller can release them if a later step fails.
async fn store_new_record(
    repo: &ResumeRepository<'_>,
    request: &UploadRequest,
    uploaded: &mut Vec<String>,
) -> Result<ResumeRecord, AppError> {
    let blobs = repo.blobs();
    let resume_path = blobs
        .upload(
            &request.resume.file_name,
            request.resume.data.clone(),
            Some("application/pdf"),
        )
        .await?;
    uploaded.push(resume_path.clone());

    let image_path = match &request.preview {
        Some(preview) => {
            let path = blobs
                .upload(
                    &preview.file_name,
                    preview.data.clone(),
                    preview.content_type.as_deref(),
                )
                .await?;
            uploaded.push(path.clone());
            Some(path)
        }
        None => None,
    };

    let record = ResumeRecord {
        id: Uuid::new_v4().to_string(),
        candidate_name: request.candidate_name.clone(),
        company_name: request.company_name.clone(),
        job_title: request.job_title.clone(),
        resume_path: Some(resume_path),
        image_path,
        feedback: Feedback::default(),
        issued_at: Utc::now(),
        stage: Stage::Received,
        comments: vec![],
        internal_notes: None,
    };
    repo.save(&record).await?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs::{BlobError, MemoryBlobStore};
    use crate::llm_client::LlmError;
    use crate::store::{KvItem, MemoryStore, RecordStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubScorer(Result<&'static str, u16>);

    #[async_trait]
    impl FeedbackScorer for StubScorer {
        async fn score(&self, _document: &[u8], _job: &JobPosting) -> Result<String, LlmError> {
            match self.0 {
                Ok(reply) => Ok(reply.to_string()),
                Err(status) => Err(LlmError::Api {
                    status,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    /// Memory-backed blobs whose `fail_on`-th write (1-based) errors.
    struct FlakyBlobs {
        inner: MemoryBlobStore,
        written: Mutex<Vec<String>>,
        fail_on: usize,
    }

    impl FlakyBlobs {
        fn new(fail_on: usize) -> Self {
            Self {
                inner: MemoryBlobStore::new(),
                written: Mutex::new(vec![]),
                fail_on,
            }
        }

        async fn live(&self) -> usize {
            let written = self.written.lock().unwrap().clone();
            let mut live = 0;
            for path in written {
                if self.inner.contains(&path).await {
                    live += 1;
                }
            }
            live
        }
    }

    #[async_trait]
    impl BlobStore for FlakyBlobs {
        async fn write(
            &self,
            path: &str,
            data: Bytes,
            content_type: Option<&str>,
        ) -> Result<(), BlobError> {
            {
                let mut written = self.written.lock().unwrap();
                if written.len() + 1 == self.fail_on {
                    return Err(BlobError::S3("bucket unavailable".to_string()));
                }
                written.push(path.to_string());
            }
            self.inner.write(path, data, content_type).await
        }

        async fn read(&self, path: &str) -> Result<Bytes, BlobError> {
            self.inner.read(path).await
        }

        async fn delete(&self, path: &str) -> Result<(), BlobError> {
            self.inner.delete(path).await
        }
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl RecordStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))))
        }

        async fn list(&self, _pattern: &str, _values: bool) -> Result<Vec<KvItem>, StoreError> {
            Ok(vec![])
        }
    }

    fn request(preview: bool) -> UploadRequest {
        UploadRequest {
            company_name: Some("Acme".to_string()),
            candidate_name: Some("Ada".to_string()),
            job_title: Some("Engineer".to_string()),
            job_description: "Rust".to_string(),
            resume: UploadedFile {
                file_name: "ada.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                data: Bytes::from_static(b"%PDF-1.7"),
            },
            preview: preview.then(|| UploadedFile {
                file_name: "ada.png".to_string(),
                content_type: Some("image/png".to_string()),
                data: Bytes::from_static(b"png"),
            }),
        }
    }

    #[tokio::test]
    async fn test_upload_scores_and_persists() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let repo = ResumeRepository::new(&store, &blobs);
        let scorer = StubScorer(Ok(
            r#"Here you go: {"overallScore": 82, "ATS": {"score": 75, "tips": []}} Thanks!"#,
        ));

        let outcome = process_upload(&repo, &scorer, request(true)).await.unwrap();

        assert_eq!(outcome.status, UploadStatus::Complete);
        let stored = repo.require(&outcome.resume.id).await.unwrap();
        assert_eq!(stored.feedback.overall_score, 82.0);
        assert_eq!(stored.feedback.ats.score, 75.0);
        assert_eq!(stored.stage, Stage::Received);

        let document = repo.read_document(&stored).await.unwrap();
        assert_eq!(document.data, Bytes::from_static(b"%PDF-1.7"));
        assert!(blobs.contains(stored.image_path.as_deref().unwrap()).await);
    }

    #[tokio::test]
    async fn test_scoring_failure_keeps_zeroed_record() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let repo = ResumeRepository::new(&store, &blobs);

        let outcome = process_upload(&repo, &StubScorer(Err(503)), request(false))
            .await
            .unwrap();

        assert!(matches!(outcome.status, UploadStatus::ScoringFailed { .. }));
        let stored = repo.require(&outcome.resume.id).await.unwrap();
        assert_eq!(stored.feedback, Feedback::default());
        assert!(stored.image_path.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_reply_yields_zeroed_feedback() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let repo = ResumeRepository::new(&store, &blobs);

        let outcome = process_upload(&repo, &StubScorer(Ok("no json here")), request(false))
            .await
            .unwrap();

        assert_eq!(outcome.status, UploadStatus::Complete);
        assert_eq!(outcome.resume.feedback, Feedback::default());
    }

    #[tokio::test]
    async fn test_rejects_non_pdf() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let repo = ResumeRepository::new(&store, &blobs);

        let mut req = request(false);
        req.resume.file_name = "cv.docx".to_string();
        req.resume.content_type = None;

        let result = process_upload(&repo, &StubScorer(Ok("{}")), req).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_record_save_releases_blobs() {
        let blobs = FlakyBlobs::new(usize::MAX);
        let repo = ResumeRepository::new(&ReadOnlyStore, &blobs);

        let result = process_upload(&repo, &StubScorer(Ok("{}")), request(true)).await;

        assert!(matches!(result, Err(AppError::Store(_))));
        assert_eq!(blobs.written.lock().unwrap().len(), 2);
        assert_eq!(blobs.live().await, 0);
    }

    #[tokio::test]
    async fn test_failed_preview_write_releases_document() {
        let store = MemoryStore::new();
        let blobs = FlakyBlobs::new(2);
        let repo = ResumeRepository::new(&store, &blobs);

        let result = process_upload(&repo, &StubScorer(Ok("{}")), request(true)).await;

        assert!(matches!(result, Err(AppError::Blob(_))));
        assert_eq!(blobs.written.lock().unwrap().len(), 1);
        assert_eq!(blobs.live().await, 0);
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_outcome_wire_shape() {
        let json = serde_json::to_value(UploadStatus::ScoringFailed {
            message: "down".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "scoring_failed");
        assert_eq!(json["message"], "down");
    }
}
