//! Application state - shared across all handlers.

use std::sync::Arc;

use popcap_core::ports::{CounterStore, CounterStoreError};
use popcap_core::{FrequencyCapper, FrequencyConfig};
use popcap_infra::InMemoryCounterStore;
#[cfg(feature = "redis")]
use popcap_infra::RedisCounterStore;

use crate::config::AppConfig;

/// Which counter store backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Redis => "redis",
            StoreKind::Memory => "memory",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub capper: Arc<FrequencyCapper>,
    pub store_kind: StoreKind,
}

impl AppState {
    /// Build the application state, connecting to Redis when available.
    pub async fn new(config: &AppConfig) -> Result<Self, CounterStoreError> {
        #[cfg(feature = "redis")]
        let (store, kind): (Arc<dyn CounterStore>, StoreKind) =
            match RedisCounterStore::new(&config.redis).await {
                Ok(store) => (Arc::new(store), StoreKind::Redis),
                Err(e) if config.redis.fallback_to_memory => {
                    tracing::error!(
                        "Failed to connect to Redis: {}. Using in-memory counters, limits are per-process.",
                        e
                    );
                    (Arc::new(InMemoryCounterStore::new()), StoreKind::Memory)
                }
                Err(e) => return Err(e),
            };

        #[cfg(not(feature = "redis"))]
        let (store, kind): (Arc<dyn CounterStore>, StoreKind) = {
            tracing::info!("Running without redis feature - using in-memory counters");
            (Arc::new(InMemoryCounterStore::new()), StoreKind::Memory)
        };

        tracing::info!(
            store = kind.as_str(),
            session_ttl_secs = config.frequency.session_ttl.as_secs(),
            day_ttl_secs = config.frequency.day_ttl.as_secs(),
            store_timeout_ms = config.frequency.store_timeout.as_millis() as u64,
            "Application state initialized"
        );

        Ok(Self::with_store(store, kind, config.frequency.clone()))
    }

    /// Build the state around an existing store.
    pub fn with_store(store: Arc<dyn CounterStore>, kind: StoreKind, frequency: FrequencyConfig) -> Self {
        Self {
            capper: Arc::new(FrequencyCapper::new(store, frequency)),
            store_kind: kind,
        }
    }
}
