//! Blob store: opaque path strings to binary documents and preview images.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod s3;

pub use self::memory::MemoryBlobStore;
pub use self::s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("S3 error: {0}")]
    S3(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, path: &str, data: Bytes, content_type: Option<&str>)
        -> Result<(), BlobError>;

    async fn read(&self, path: &str) -> Result<Bytes, BlobError>;

    async fn delete(&self, path: &str) -> Result<(), BlobError>;

    /// Stores `data` under a freshly generated path and returns that path.
    async fn upload(
        &self,
        file_name: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, BlobError> {
        let path = upload_path(file_name);
        self.write(&path, data, content_type).await?;
        Ok(path)
    }
}

/// `uploads/<uuid>/<sanitized file name>`
pub fn upload_path(file_name: &str) -> String {
    let sanitized: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = if sanitized.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        sanitized
    };
    format!("uploads/{}/{}", Uuid::new_v4(), sanitized)
}

/// Content type guessed from a blob path's extension.
pub fn content_type_for_path(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
