//! Per-optimization regeneration lock.
//!
//! A lease is released when dropped, so a request abandoned mid-flight never
//! leaves its optimization locked. The Redis lease additionally expires on its
//! own after `ttl` in case the process dies while holding it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;

const KEY_PREFIX: &str = "portfolio:regenerate:";

/// Deletes the key only when it still holds our token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub fn lock_key(optimization_id: Uuid) -> String {
    format!("{KEY_PREFIX}{optimization_id}")
}

/// Proof of holding a lock. Releases on drop.
pub struct LockLease {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockLease {
    fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[async_trait]
pub trait RegenerationLock: Send + Sync {
    /// `None` when another request already holds `key`.
    async fn try_acquire(&self, key: &str) -> Result<Option<LockLease>, AppError>;
}

/// In-process lock set. Used when no Redis is configured.
#[derive(Clone, Default)]
pub struct LocalLock {
    held: Arc<Mutex<HashSet<String>>>,
}

impl LocalLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegenerationLock for LocalLock {
    async fn try_acquire(&self, key: &str) -> Result<Option<LockLease>, AppError> {
        let mut held = self
            .held
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("lock set poisoned")))?;
        if !held.insert(key.to_string()) {
            return Ok(None);
        }

        let set = Arc::clone(&self.held);
        let key = key.to_string();
        Ok(Some(LockLease::new(move || {
            if let Ok(mut held) = set.lock() {
                held.remove(&key);
            }
        })))
    }
}

/// Cross-process lock: `SET key token NX PX ttl`, released with a token check.
#[derive(Clone)]
pub struct RedisLock {
    client: redis::Client,
    ttl: Duration,
}

impl RedisLock {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }
}

async fn release_redis(client: redis::Client, key: String, token: String) {
    let script = redis::Script::new(RELEASE_SCRIPT);
    let result = async {
        let mut conn = client.get_multiplexed_async_connection().await?;
        script
            .key(&key)
            .arg(&token)
            .invoke_async::<_, i64>(&mut conn)
            .await
    }
    .await;

    match result {
        Ok(1) => debug!("Released {key}"),
        Ok(_) => warn!("Lock {key} had already expired or changed hands"),
        Err(e) => warn!("Failed to release {key}: {e}; it will expire on its own"),
    }
}

#[async_trait]
impl RegenerationLock for RedisLock {
    async fn try_acquire(&self, key: &str) -> Result<Option<LockLease>, AppError> {
        let token = Uuid::new_v4().to_string();
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::Error::new(e).context("lock store unreachable"))
            })?;

        let acquired: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(self.ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::Error::new(e).context("lock store rejected SET"))
            })?;

        if acquired.is_none() {
            return Ok(None);
        }
        debug!("Acquired {key}");

        let client = self.client.clone();
        let key = key.to_string();
        Ok(Some(LockLease::new(move || {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(release_redis(client, key, token));
                }
                Err(_) => warn!("No runtime to release {key}; it will expire on its own"),
            }
        })))
    }
}
