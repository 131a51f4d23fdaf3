//! In-memory counter store - used as fallback when Redis is unavailable and
//! as the test double for the frequency engine.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use popcap_core::ports::{CounterStore, CounterStoreError};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// In-memory counter store using a HashMap behind an async RwLock.
///
/// Expiry follows `tokio::time`, so paused-clock tests can advance past TTLs.
/// Note: Counters are per-process and lost on restart.
#[derive(Default)]
pub struct InMemoryCounterStore {
    store: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time to live of a key, `None` when missing or persistent.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let store = self.store.read().await;
        let entry = store.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|exp| exp - now)
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let store = self.store.read().await;
        store.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn incr_locked(store: &mut HashMap<String, Entry>, key: &str) -> Result<i64, CounterStoreError> {
        let now = Instant::now();
        match store.get_mut(key).filter(|e| !e.is_expired(now)) {
            Some(entry) => {
                let current: i64 = entry.value.parse().map_err(|_| {
                    CounterStoreError::Operation(format!("value at {key} is not an integer"))
                })?;
                let next = current.checked_add(1).ok_or_else(|| {
                    CounterStoreError::Operation(format!("increment at {key} would overflow"))
                })?;
                entry.value = next.to_string();
                Ok(next)
            }
            None => {
                store.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError> {
        let store = self.store.read().await;
        let Some(entry) = store.get(key) else {
            return Ok(None);
        };

        if entry.is_expired(Instant::now()) {
            drop(store);
            // Clean up expired entry with write lock
            let mut store = self.store.write().await;
            if store.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
                store.remove(key);
            }
            return Ok(None);
        }

        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CounterStoreError> {
        let mut store = self.store.write().await;
        store.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CounterStoreError> {
        let mut store = self.store.write().await;
        store.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, CounterStoreError> {
        let mut store = self.store.write().await;
        Self::incr_locked(&mut store, key)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterStoreError> {
        let now = Instant::now();
        let mut store = self.store.write().await;
        if let Some(entry) = store.get_mut(key).filter(|e| !e.is_expired(now)) {
            entry.expires_at = Some(now + ttl);
        }
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CounterStoreError> {
        let now = Instant::now();
        let mut store = self.store.write().await;
        let removed = keys
            .iter()
            .filter_map(|key| store.remove(key))
            .filter(|e| !e.is_expired(now))
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CounterStoreError> {
        let now = Instant::now();
        let pattern: Vec<char> = pattern.chars().collect();
        let store = self.store.read().await;
        let mut keys: Vec<String> = store
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .filter(|(key, _)| glob_match(&pattern, &key.chars().collect::<Vec<_>>()))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CounterStoreError> {
        // Single lock so no reader sees a fresh counter without its TTL
        let mut store = self.store.write().await;
        let current = Self::incr_locked(&mut store, key)?;
        if current == 1 {
            if let Some(entry) = store.get_mut(key) {
                entry.expires_at = Some(Instant::now() + ttl);
            }
        }
        Ok(current)
    }
}

/// Redis-style glob: `*`, `?`, `[a-z]`, `[^x]` and `\` escapes.
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some(('[', rest)) => {
            let Some((&c, text_rest)) = text.split_first() else {
                return false;
            };
            match match_class(rest, c) {
                Some((matched, after)) => matched && glob_match(after, text_rest),
                // Unterminated class, treat '[' literally
                None => c == '[' && glob_match(rest, text_rest),
            }
        }
        Some(('\\', rest)) if !rest.is_empty() => {
            text.first() == Some(&rest[0]) && glob_match(&rest[1..], &text[1..])
        }
        Some((literal, rest)) => text.first() == Some(literal) && glob_match(rest, &text[1..]),
    }
}

/// Match `c` against a class body (after `[`). Returns the verdict and the
/// pattern remaining after the closing `]`.
fn match_class(class: &[char], c: char) -> Option<(bool, &[char])> {
    let (negate, mut i) = match class.first() {
        Some('^') => (true, 1),
        _ => (false, 0),
    };
    let mut matched = false;

    while i < class.len() {
        match class[i] {
            ']' => return Some((matched != negate, &class[i + 1..])),
            '\\' if i + 1 < class.len() => {
                matched |= class[i + 1] == c;
                i += 2;
            }
            lo if i + 2 < class.len() && class[i + 1] == '-' && class[i + 2] != ']' => {
                let hi = class[i + 2];
                matched |= lo <= c && c <= hi;
                i += 3;
            }
            other => {
                matched |= other == c;
                i += 1;
            }
        }
    }
    None
}
