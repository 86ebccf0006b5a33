//! Resume Record persistence over the Record Store Adapter and blob store.
//!
//! Records are stored as JSON under `resume:<id>`. A deleted record is
//! overwritten with an empty string, so readers treat empty values as absent.

use bytes::Bytes;
use tracing::{info, warn};

use crate::blobs::{content_type_for_path, BlobStore};
use crate::errors::AppError;
use crate::models::resume::{resume_key, ResumeRecord, RESUME_KEY_PATTERN};
use crate::store::RecordStore;

pub struct ResumeRepository<'a> {
    store: &'a dyn RecordStore,
    blobs: &'a dyn BlobStore,
}

/// A stored blob plus the content type to serve it with.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub data: Bytes,
    pub content_type: &'static str,
}

impl<'a> ResumeRepository<'a> {
    pub fn new(store: &'a dyn RecordStore, blobs: &'a dyn BlobStore) -> Self {
        Self { store, blobs }
    }

    pub fn blobs(&self) -> &'a dyn BlobStore {
        self.blobs
    }

    /// `None` when the key is missing, emptied by a delete, or unreadable.
    pub async fn load(&self, id: &str) -> Result<Option<ResumeRecord>, AppError> {
        let key = resume_key(id);
        let raw = self.store.get(&key).await?;
        Ok(raw.and_then(|raw| decode_record(&key, &raw)))
    }

    pub async fn require(&self, id: &str) -> Result<ResumeRecord, AppError> {
        self.load(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
    }

    pub async fn save(&self, record: &ResumeRecord) -> Result<(), AppError> {
        let value = serde_json::to_string(record).map_err(anyhow::Error::from)?;
        self.store.set(&record.key(), &value).await?;
        Ok(())
    }

    /// Every live record, in store key order.
    pub async fn list_all(&self) -> Result<Vec<ResumeRecord>, AppError> {
        let items = self.store.list(RESUME_KEY_PATTERN, true).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let raw = item.value?;
                decode_record(&item.key, &raw)
            })
            .collect())
    }

    /// Empties the record's key, then releases its blobs. Blob failures are
    /// logged and ignored. Returns `false` when there was nothing to delete.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let key = resume_key(id);
        let raw = match self.store.get(&key).await? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(false),
        };

        self.store.set(&key, "").await?;
        info!("Deleted resume {id}");

        let locators = decode_record(&key, &raw)
            .map(|mut record| record.take_locators())
            .unwrap_or_default();
        self.release_blobs(&locators).await;

        Ok(true)
    }

    /// Best-effort removal of blobs nothing references any more.
    pub async fn release_blobs(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.blobs.delete(path).await {
                warn!("Failed to release blob {path}: {e}");
            }
        }
    }

    pub async fn read_document(&self, record: &ResumeRecord) -> Result<StoredFile, AppError> {
        let path = record
            .resume_path
            .as_deref()
            .ok_or_else(|| AppError::NotFound(format!("Resume {} has no document", record.id)))?;
        self.read_blob(path).await
    }

    pub async fn read_preview(&self, record: &ResumeRecord) -> Result<StoredFile, AppError> {
        let path = record
            .image_path
            .as_deref()
            .ok_or_else(|| AppError::NotFound(format!("Resume {} has no preview", record.id)))?;
        self.read_blob(path).await
    }

    async fn read_blob(&self, path: &str) -> Result<StoredFile, AppError> {
        Ok(StoredFile {
            data: self.blobs.read(path).await?,
            content_type: content_type_for_path(path),
        })
    }
}

fn decode_record(key: &str, raw: &str) -> Option<ResumeRecord> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping malformed record at {key}: {e}");
            None
        }
    }
}
