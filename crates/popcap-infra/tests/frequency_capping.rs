//! Frequency capping behaviour against the in-memory counter store.

use std::sync::Arc;
use std::time::Duration;

use popcap_core::domain::{
    Campaign, DenyReason, DisplayCounts, FrequencyPolicy, ScopeKey, VisitorContext, VisitorId,
};
use popcap_core::ports::CounterStore;
use popcap_core::{FrequencyCapper, FrequencyConfig};
use popcap_infra::InMemoryCounterStore;
use serde_json::json;

fn setup() -> (Arc<InMemoryCounterStore>, FrequencyCapper) {
    let store = Arc::new(InMemoryCounterStore::new());
    let capper = FrequencyCapper::new(store.clone(), FrequencyConfig::default());
    (store, capper)
}

fn visitor(id: &str) -> VisitorContext {
    VisitorContext::new(id, "session-1").unwrap()
}

fn visitor_id(id: &str) -> VisitorId {
    VisitorId::new(id).unwrap()
}

#[tokio::test]
async fn test_monotonic_counting() {
    let (_, capper) = setup();
    let scope = ScopeKey::new("c1");
    let policy = FrequencyPolicy::default();

    for _ in 0..5 {
        capper.record(&scope, &visitor("v1"), &policy).await;
    }

    let status = capper.status(&visitor_id("v1"), &scope).await;
    assert_eq!(status, DisplayCounts::new(5, 5));
    assert_eq!(capper.stats().displays_recorded, 5);
}

#[tokio::test]
async fn test_uncapped_check_reports_recorded_counts() {
    let (_, capper) = setup();
    let scope = ScopeKey::new("c1");

    capper
        .record(&scope, &visitor("v1"), &FrequencyPolicy::default().with_cooldown_seconds(60))
        .await;
    for _ in 0..2 {
        capper.record(&scope, &visitor("v1"), &FrequencyPolicy::default()).await;
    }

    let result = capper
        .check(&FrequencyPolicy::default(), &scope, &visitor("v1"))
        .await;

    assert!(result.allowed);
    assert!(!result.degraded);
    assert_eq!(result.current_counts, DisplayCounts::new(3, 3));
    assert_eq!(result.current_counts, capper.status(&visitor_id("v1"), &scope).await);
}

#[tokio::test]
async fn test_session_cap_enforced_at_limit() {
    let (_, capper) = setup();
    let scope = ScopeKey::new("c1");
    let policy = FrequencyPolicy::default().with_session_limit(3);
    let v = visitor("v1");

    for shown in 0..3 {
        let result = capper.check(&policy, &scope, &v).await;
        assert!(result.allowed, "display {} should be allowed", shown + 1);
        capper.record(&scope, &v, &policy).await;
    }

    let result = capper.check(&policy, &scope, &v).await;
    assert!(!result.allowed);
    assert_eq!(result.reason, Some(DenyReason::SessionLimit));
}

#[tokio::test]
async fn test_check_has_no_side_effects() {
    let (store, capper) = setup();
    let policy = FrequencyPolicy::default().with_session_limit(1);

    for _ in 0..10 {
        capper.check(&policy, &ScopeKey::new("c1"), &visitor("v1")).await;
    }

    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_gating() {
    let (_, capper) = setup();
    let scope = ScopeKey::new("c1");
    let policy = FrequencyPolicy::default().with_cooldown_seconds(30);
    let v = visitor("v1");

    capper.record(&scope, &v, &policy).await;

    let result = capper.check(&policy, &scope, &v).await;
    assert!(!result.allowed);
    assert_eq!(result.reason, Some(DenyReason::Cooldown));
    assert_eq!(result.current_counts, DisplayCounts::new(1, 1));

    tokio::time::advance(Duration::from_secs(30)).await;

    let result = capper.check(&policy, &scope, &v).await;
    assert!(result.allowed);
    assert_eq!(result.reason, None);
}

#[tokio::test]
async fn test_cooldown_checked_before_limits() {
    let (_, capper) = setup();
    let scope = ScopeKey::new("c1");
    let policy = FrequencyPolicy::default()
        .with_session_limit(1)
        .with_daily_limit(1)
        .with_cooldown_seconds(600);
    let v = visitor("v1");

    capper.record(&scope, &v, &policy).await;

    let result = capper.check(&policy, &scope, &v).await;
    assert_eq!(result.reason, Some(DenyReason::Cooldown));
}

#[tokio::test]
async fn test_zero_cooldown_writes_no_marker() {
    let (store, capper) = setup();
    let policy = FrequencyPolicy::default().with_cooldown_seconds(0);

    capper.record(&ScopeKey::new("c1"), &visitor("v1"), &policy).await;

    assert_eq!(store.get("cooldown:v1:c1").await.unwrap(), None);
    assert_eq!(store.len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_counter_ttls() {
    let (store, capper) = setup();
    let policy = FrequencyPolicy::default().with_cooldown_seconds(45);

    capper.record(&ScopeKey::new("c1"), &visitor("v1"), &policy).await;

    let config = capper.config();
    assert_eq!(store.ttl("freq_cap:v1:c1:session").await, Some(config.session_ttl));
    assert_eq!(store.ttl("freq_cap:v1:c1:day").await, Some(config.day_ttl));
    assert_eq!(store.ttl("cooldown:v1:c1").await, Some(Duration::from_secs(45)));
}

#[tokio::test(start_paused = true)]
async fn test_daily_window_resets_from_first_display() {
    let store = Arc::new(InMemoryCounterStore::new());
    let config = FrequencyConfig {
        session_ttl: Duration::from_secs(60),
        day_ttl: Duration::from_secs(600),
        ..FrequencyConfig::default()
    };
    let capper = FrequencyCapper::new(store, config);
    let scope = ScopeKey::new("c1");
    let policy = FrequencyPolicy::default().with_daily_limit(2);
    let v = visitor("v1");

    capper.record(&scope, &v, &policy).await;
    tokio::time::advance(Duration::from_secs(500)).await;
    capper.record(&scope, &v, &policy).await;
    assert_eq!(
        capper.check(&policy, &scope, &v).await.reason,
        Some(DenyReason::DailyLimit)
    );

    // Window anchored to the first display, not the latest
    tokio::time::advance(Duration::from_secs(100)).await;
    let result = capper.check(&policy, &scope, &v).await;
    assert!(result.allowed);
    assert_eq!(result.current_counts, DisplayCounts::new(0, 0));
}

#[tokio::test]
async fn test_experiment_variants_share_counters() {
    let (_, capper) = setup();
    let targeting = json!({ "max_triggers_per_session": 2 });
    let variant_a = Campaign::new("variant-a")
        .with_experiment("exp-1")
        .with_targeting(targeting.clone());
    let variant_b = Campaign::new("variant-b")
        .with_experiment("exp-1")
        .with_targeting(targeting);
    let v = visitor("v1");

    capper.record_campaign_display(&variant_a, &v).await;
    let result = capper.check_frequency_capping(&variant_b, &v).await;
    assert!(result.allowed);
    assert_eq!(result.current_counts, DisplayCounts::new(1, 1));

    capper.record_campaign_display(&variant_b, &v).await;
    let result = capper.check_frequency_capping(&variant_a, &v).await;
    assert!(!result.allowed);
    assert_eq!(result.reason, Some(DenyReason::SessionLimit));
    assert_eq!(result.current_counts, DisplayCounts::new(2, 2));
}

#[tokio::test]
async fn test_campaigns_are_independent() {
    let (_, capper) = setup();
    let x = ScopeKey::new("campaign-x");
    let y = ScopeKey::new("campaign-y");
    let policy = FrequencyPolicy::default().with_cooldown_seconds(60);

    capper.record(&x, &visitor("v1"), &policy).await;
    capper.record(&x, &visitor("v1"), &policy).await;

    assert_eq!(capper.status(&visitor_id("v1"), &y).await, DisplayCounts::default());
    assert!(capper.check(&policy, &y, &visitor("v1")).await.allowed);
    assert_eq!(capper.status(&visitor_id("v2"), &x).await, DisplayCounts::default());
}

#[tokio::test]
async fn test_reset_unknown_visitor_is_noop() {
    let (_, capper) = setup();
    let id = visitor_id("never-seen");

    assert_eq!(capper.reset(&id, None).await, 0);
    assert_eq!(capper.reset(&id, Some(&ScopeKey::new("c1"))).await, 0);
    assert_eq!(
        capper.status(&id, &ScopeKey::new("c1")).await,
        DisplayCounts::default()
    );
}

#[tokio::test]
async fn test_reset_scoped_to_one_campaign() {
    let (_, capper) = setup();
    let policy = FrequencyPolicy::default().with_cooldown_seconds(60);
    let a = ScopeKey::new("a");
    let b = ScopeKey::new("b");

    capper.record(&a, &visitor("v1"), &policy).await;
    capper.record(&b, &visitor("v1"), &policy).await;
    capper.record(&a, &visitor("v2"), &policy).await;

    assert_eq!(capper.reset(&visitor_id("v1"), Some(&a)).await, 3);

    assert_eq!(capper.status(&visitor_id("v1"), &a).await, DisplayCounts::default());
    assert_eq!(capper.status(&visitor_id("v1"), &b).await, DisplayCounts::new(1, 1));
    assert_eq!(capper.status(&visitor_id("v2"), &a).await, DisplayCounts::new(1, 1));
}

#[tokio::test]
async fn test_reset_all_scopes_for_visitor() {
    let (store, capper) = setup();
    let policy = FrequencyPolicy::default().with_cooldown_seconds(60);

    capper.record(&ScopeKey::new("a"), &visitor("v1"), &policy).await;
    capper.record(&ScopeKey::new("b"), &visitor("v1"), &policy).await;
    capper.record(&ScopeKey::new("a"), &visitor("v10"), &policy).await;

    assert_eq!(capper.reset(&visitor_id("v1"), None).await, 6);
    assert_eq!(store.len().await, 3);
    assert_eq!(
        capper.status(&visitor_id("v10"), &ScopeKey::new("a")).await,
        DisplayCounts::new(1, 1)
    );
}

#[tokio::test]
async fn test_corrupted_counter_reads_as_zero() {
    let (store, capper) = setup();
    store.set("freq_cap:v1:c1:session", "garbage").await.unwrap();
    store.set("freq_cap:v1:c1:day", "4").await.unwrap();
    let policy = FrequencyPolicy::default().with_session_limit(1);

    let result = capper.check(&policy, &ScopeKey::new("c1"), &visitor("v1")).await;

    assert!(result.allowed);
    assert!(!result.degraded);
    assert_eq!(result.current_counts, DisplayCounts::new(0, 4));
    assert_eq!(capper.stats().corrupted_values, 1);
}

#[tokio::test]
async fn test_record_display_without_overrides_sets_no_cooldown() {
    let (store, capper) = setup();
    let scope = ScopeKey::new("c1");

    capper.record_display(&scope, &visitor("v1"), None).await;
    assert_eq!(store.get("cooldown:v1:c1").await.unwrap(), None);

    let overrides = FrequencyPolicy::default().with_cooldown_seconds(10);
    capper
        .record_display(&scope, &visitor("v1"), Some(&overrides))
        .await;
    assert!(store.get("cooldown:v1:c1").await.unwrap().is_some());
    assert_eq!(capper.status(&visitor_id("v1"), &scope).await, DisplayCounts::new(2, 2));
}

#[tokio::test]
async fn test_concurrent_records_never_lose_increments() {
    let (_, capper) = setup();
    let capper = Arc::new(capper);
    let scope = ScopeKey::new("c1");

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let capper = capper.clone();
            let scope = scope.clone();
            tokio::spawn(async move {
                capper
                    .record(&scope, &visitor("v1"), &FrequencyPolicy::default())
                    .await;
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(capper.status(&visitor_id("v1"), &scope).await, DisplayCounts::new(50, 50));
}

#[tokio::test]
async fn test_scenario_session_limit_then_reset() {
    let (_, capper) = setup();
    let campaign = Campaign::new("c1").with_targeting(json!({ "max_triggers_per_session": 2 }));
    let v1 = visitor("v1");

    capper.record_campaign_display(&campaign, &v1).await;
    capper.record_campaign_display(&campaign, &v1).await;

    let result = capper.check_frequency_capping(&campaign, &v1).await;
    assert!(!result.allowed);
    assert_eq!(result.reason, Some(DenyReason::SessionLimit));
    assert_eq!(result.current_counts, DisplayCounts::new(2, 2));

    capper.reset(&visitor_id("v1"), None).await;

    let result = capper.check_frequency_capping(&campaign, &v1).await;
    assert!(result.allowed);
    assert_eq!(result.reason, None);
    assert_eq!(result.current_counts, DisplayCounts::new(0, 0));
}

#[tokio::test]
async fn test_scenario_daily_limit() {
    let (_, capper) = setup();
    let campaign = Campaign::new("c2").with_targeting(json!({ "max_triggers_per_day": 3 }));
    let v2 = visitor("v2");

    for expected_day in 1..=2 {
        capper.record_campaign_display(&campaign, &v2).await;
        let result = capper.check_frequency_capping(&campaign, &v2).await;
        assert!(result.allowed);
        assert_eq!(result.current_counts.day, expected_day);
    }

    capper.record_campaign_display(&campaign, &v2).await;
    let result = capper.check_frequency_capping(&campaign, &v2).await;
    assert!(!result.allowed);
    assert_eq!(result.reason, Some(DenyReason::DailyLimit));
    assert_eq!(result.current_counts.day, 3);
}
