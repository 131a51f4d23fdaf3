use std::time::Duration;

use async_trait::async_trait;

/// Counter store - TTL-capable key/value store (Redis, in-memory).
///
/// Every call is a network boundary in production; callers bound them with
/// a timeout and treat a timeout like any other error.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// GET - returns `None` for a missing or expired key.
    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError>;

    /// SET without expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), CounterStoreError>;

    /// SETEX - set with expiry.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CounterStoreError>;

    /// INCR - atomic increment, creating the key at 1 if absent.
    async fn incr(&self, key: &str) -> Result<i64, CounterStoreError>;

    /// EXPIRE - set or refresh the TTL of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterStoreError>;

    /// DEL - bulk delete, returns how many keys existed.
    async fn del(&self, keys: &[String]) -> Result<u64, CounterStoreError>;

    /// KEYS - glob pattern scan. Admin tooling only, never on the hot path.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CounterStoreError>;

    /// Increment and, when this increment created the key, attach `ttl`.
    ///
    /// The TTL is never refreshed by later increments, so the window is
    /// anchored to the first increment. Backends that can run both steps in
    /// one round-trip should override this.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CounterStoreError> {
        let current = self.incr(key).await?;
        if current == 1 {
            self.expire(key, ttl).await?;
        }
        Ok(current)
    }
}

/// Counter store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CounterStoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation failed: {0}")]
    Operation(String),
}
