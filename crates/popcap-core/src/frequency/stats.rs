use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-local engine counters.
#[derive(Debug, Default)]
pub struct EngineStats {
    checks: AtomicU64,
    denials: AtomicU64,
    fail_open: AtomicU64,
    store_errors: AtomicU64,
    corrupted_values: AtomicU64,
    displays_recorded: AtomicU64,
    resets: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub checks: u64,
    pub denials: u64,
    pub fail_open: u64,
    pub store_errors: u64,
    pub corrupted_values: u64,
    pub displays_recorded: u64,
    pub resets: u64,
}

impl EngineStats {
    pub(crate) fn check(&self) {
        self.checks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn denial(&self) {
        self.denials.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fail_open(&self) {
        self.fail_open.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn corrupted_value(&self) {
        self.corrupted_values.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn display_recorded(&self) {
        self.displays_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            denials: self.denials.load(Ordering::Relaxed),
            fail_open: self.fail_open.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            corrupted_values: self.corrupted_values.load(Ordering::Relaxed),
            displays_recorded: self.displays_recorded.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}
