use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::{KvItem, RecordStore, StoreError};

/// Redis-backed record store.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        info!("Connecting to Redis...");
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis connection established");
        Ok(Self { conn })
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvItem>, StoreError> {
        let mut conn = self.conn.clone();

        // SCAN may yield a key more than once.
        let mut keys: Vec<String> = {
            let mut iter = conn.scan_match::<_, String>(pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };
        keys.sort();
        keys.dedup();
        debug!("SCAN {pattern} matched {} keys", keys.len());

        if !include_values {
            return Ok(keys
                .into_iter()
                .map(|key| KvItem { key, value: None })
                .collect());
        }

        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            // Keys can expire or vanish between SCAN and GET.
            let value: Option<String> = conn.get(&key).await?;
            if let Some(value) = value {
                items.push(KvItem {
                    key,
                    value: Some(value),
                });
            }
        }
        Ok(items)
    }
}
