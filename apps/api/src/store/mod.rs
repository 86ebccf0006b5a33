//! Record Store Adapter: string key to string value, listable by glob pattern.
//!
//! The only persistence mechanism: every Resume Record lives under one key.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KvItem {
    pub key: String,
    /// Present only when values were requested.
    pub value: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Lists keys matching `pattern` (`*` matches any run of characters),
    /// ordered by key.
    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvItem>, StoreError>;
}

/// Glob match supporting `*` only.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern = pattern.as_bytes();
    let key = key.as_bytes();
    let (mut p, mut k) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, k));
            p += 1;
        } else if p < pattern.len() && pattern[p] == key[k] {
            p += 1;
            k += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            k = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
