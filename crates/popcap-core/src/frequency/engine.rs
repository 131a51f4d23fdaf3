use std::future::Future;
use std::sync::Arc;

use crate::domain::{
    AdmissionResult, Campaign, DenyReason, DisplayCounts, FrequencyPolicy, ScopeKey,
    VisitorContext, VisitorId,
};
use crate::ports::{CounterStore, CounterStoreError};

use super::keys::{self, CounterKeys};
use super::resolver::{resolve_policy, resolve_scope_key};
use super::stats::{EngineStats, StatsSnapshot};
use super::FrequencyConfig;

/// Frequency-capping engine backed by a shared [`CounterStore`].
///
/// Cheap to share behind an `Arc`; holds no per-visitor state itself.
pub struct FrequencyCapper {
    store: Arc<dyn CounterStore>,
    config: FrequencyConfig,
    stats: EngineStats,
}

impl FrequencyCapper {
    pub fn new(store: Arc<dyn CounterStore>, config: FrequencyConfig) -> Self {
        Self {
            store,
            config,
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &FrequencyConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Resolve policy and scope from the campaign, then check admission.
    pub async fn check_frequency_capping(
        &self,
        campaign: &Campaign,
        visitor: &VisitorContext,
    ) -> AdmissionResult {
        let policy = resolve_policy(campaign);
        let scope = resolve_scope_key(campaign);
        self.check(&policy, &scope, visitor).await
    }

    /// Decide whether a popup under `scope` may be shown to `visitor` now.
    ///
    /// Reads only. Rules are evaluated cooldown first, then session, then
    /// daily. Any store failure admits the display and marks the result
    /// as degraded.
    pub async fn check(
        &self,
        policy: &FrequencyPolicy,
        scope: &ScopeKey,
        visitor: &VisitorContext,
    ) -> AdmissionResult {
        self.stats.check();

        let keys = CounterKeys::new(&visitor.visitor_id, scope);

        // Nothing can deny, so the cooldown marker is not consulted
        if policy.is_unbounded() {
            let (session, day) = futures::join!(
                self.read_count(&keys.session),
                self.read_count(&keys.day),
            );
            return match (session, day) {
                (Ok(session), Ok(day)) => AdmissionResult::allow(DisplayCounts::new(session, day)),
                (session, day) => self.fail_open(visitor, scope, session, day),
            };
        }

        let (cooldown, session, day) = futures::join!(
            self.bounded("get", &keys.cooldown, self.store.get(&keys.cooldown)),
            self.read_count(&keys.session),
            self.read_count(&keys.day),
        );

        let (in_cooldown, counts) = match (cooldown, session, day) {
            (Ok(marker), Ok(session), Ok(day)) => {
                (marker.is_some(), DisplayCounts::new(session, day))
            }
            (_, session, day) => return self.fail_open(visitor, scope, session, day),
        };

        let denial = if in_cooldown {
            Some(DenyReason::Cooldown)
        } else if policy
            .session_cap()
            .is_some_and(|limit| counts.session >= u64::from(limit))
        {
            Some(DenyReason::SessionLimit)
        } else if policy
            .daily_cap()
            .is_some_and(|limit| counts.day >= u64::from(limit))
        {
            Some(DenyReason::DailyLimit)
        } else {
            None
        };

        match denial {
            Some(reason) => {
                self.stats.denial();
                tracing::debug!(
                    visitor_id = %visitor.visitor_id,
                    scope = %scope,
                    ?reason,
                    session = counts.session,
                    day = counts.day,
                    "Display denied"
                );
                AdmissionResult::deny(reason, counts)
            }
            None => AdmissionResult::allow(counts),
        }
    }

    /// Record a display of the campaign, with scope and policy taken from it.
    pub async fn record_campaign_display(&self, campaign: &Campaign, visitor: &VisitorContext) {
        let policy = resolve_policy(campaign);
        let scope = resolve_scope_key(campaign);
        self.record(&scope, visitor, &policy).await;
    }

    /// Record a display against an explicit scope. A cooldown marker is only
    /// written when `overrides` configures one.
    pub async fn record_display(
        &self,
        scope: &ScopeKey,
        visitor: &VisitorContext,
        overrides: Option<&FrequencyPolicy>,
    ) {
        let policy = overrides.copied().unwrap_or_default();
        self.record(scope, visitor, &policy).await;
    }

    /// Count one genuine display. Not idempotent: every call increments.
    ///
    /// Failures are logged and swallowed; a lost increment only makes the
    /// cap less accurate.
    pub async fn record(&self, scope: &ScopeKey, visitor: &VisitorContext, policy: &FrequencyPolicy) {
        let keys = CounterKeys::new(&visitor.visitor_id, scope);

        let cooldown = async {
            match policy.cooldown() {
                Some(ttl) => {
                    let shown_at = chrono::Utc::now().timestamp_millis().to_string();
                    self.bounded(
                        "setex",
                        &keys.cooldown,
                        self.store.set_ex(&keys.cooldown, &shown_at, ttl),
                    )
                    .await
                }
                None => Ok(()),
            }
        };

        let (session, day, cooldown) = futures::join!(
            self.bounded(
                "incr",
                &keys.session,
                self.store.incr_with_ttl(&keys.session, self.config.session_ttl),
            ),
            self.bounded(
                "incr",
                &keys.day,
                self.store.incr_with_ttl(&keys.day, self.config.day_ttl),
            ),
            cooldown,
        );

        match (session, day) {
            (Ok(session), Ok(day)) => {
                self.stats.display_recorded();
                tracing::debug!(
                    visitor_id = %visitor.visitor_id,
                    session_id = %visitor.session_id,
                    scope = %scope,
                    session,
                    day,
                    cooldown_set = cooldown.is_ok() && policy.cooldown().is_some(),
                    "Display recorded"
                );
            }
            _ => {
                tracing::warn!(
                    visitor_id = %visitor.visitor_id,
                    scope = %scope,
                    "Display only partially recorded"
                );
            }
        }
    }

    /// Delete a visitor's counters, for one scope or for all of them.
    ///
    /// Returns how many keys were removed. Safe on visitors with no history.
    pub async fn reset(&self, visitor: &VisitorId, scope: Option<&ScopeKey>) -> u64 {
        self.stats.reset();

        let targets = match scope {
            Some(scope) => CounterKeys::new(visitor, scope).into_vec(),
            None => {
                let mut found = Vec::new();
                for pattern in keys::visitor_patterns(visitor) {
                    match self
                        .bounded("keys", &pattern, self.store.keys(&pattern))
                        .await
                    {
                        Ok(mut keys) => found.append(&mut keys),
                        Err(_) => return 0,
                    }
                }
                found
            }
        };

        if targets.is_empty() {
            return 0;
        }

        let label = scope.map(ScopeKey::as_str).unwrap_or("*");
        match self.bounded("del", label, self.store.del(&targets)).await {
            Ok(removed) => {
                tracing::info!(visitor_id = %visitor, scope = label, removed, "Frequency counters reset");
                removed
            }
            Err(_) => 0,
        }
    }

    /// Current session and daily counts. Store failures read as zero.
    pub async fn status(&self, visitor: &VisitorId, scope: &ScopeKey) -> DisplayCounts {
        let keys = CounterKeys::new(visitor, scope);
        let (session, day) = futures::join!(
            self.read_count(&keys.session),
            self.read_count(&keys.day),
        );
        DisplayCounts::new(session.unwrap_or(0), day.unwrap_or(0))
    }

    /// Admit after a failed read, keeping whichever counts did come back.
    fn fail_open(
        &self,
        visitor: &VisitorContext,
        scope: &ScopeKey,
        session: Result<u64, CounterStoreError>,
        day: Result<u64, CounterStoreError>,
    ) -> AdmissionResult {
        self.stats.fail_open();
        tracing::warn!(
            visitor_id = %visitor.visitor_id,
            scope = %scope,
            "Counter store unavailable, admitting display"
        );
        AdmissionResult::fail_open(DisplayCounts::new(session.unwrap_or(0), day.unwrap_or(0)))
    }

    /// Read a counter, treating missing and corrupted values as zero.
    async fn read_count(&self, key: &str) -> Result<u64, CounterStoreError> {
        let raw = self.bounded("get", key, self.store.get(key)).await?;
        let Some(raw) = raw else {
            return Ok(0);
        };

        match raw.trim().parse::<u64>() {
            Ok(count) => Ok(count),
            Err(_) => {
                self.stats.corrupted_value();
                tracing::warn!(key, value = %raw, "Corrupted frequency counter, reading as 0");
                Ok(0)
            }
        }
    }

    /// Run a store call under the configured timeout, logging any failure.
    async fn bounded<T, F>(&self, op: &'static str, key: &str, fut: F) -> Result<T, CounterStoreError>
    where
        F: Future<Output = Result<T, CounterStoreError>>,
    {
        let result = match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CounterStoreError::Timeout(self.config.store_timeout)),
        };

        if let Err(e) = &result {
            self.stats.store_error();
            tracing::warn!(op, key, error = %e, "Counter store call failed");
        }
        result
    }
}
