#![allow(clippy::unwrap_used)]
// Integration tests for `Platform` against a wiremock vendor and an
// in-memory host.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as TimeDelta, FixedOffset, Utc};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use motiv_core::{
    Accessory, AccessoryIdentity, AccessorySnapshot, AccountConfig, BridgeConfig, Host,
    MemoryHost, Platform, PlatformState, RejectReason, SensorKind,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn account(expiry: chrono::DateTime<Utc>) -> AccountConfig {
    AccountConfig {
        user_id: "user-1".into(),
        session_token: SecretString::from("r:token".to_owned()),
        session_expiry: expiry,
    }
}

fn config(server: &MockServer, account: Option<AccountConfig>) -> BridgeConfig {
    BridgeConfig {
        api_url: Url::parse(&server.uri()).unwrap(),
        account,
        sync_interval: Duration::from_secs(120),
        timeout: Duration::from_secs(5),
        utc_offset: FixedOffset::east_opt(0).unwrap(),
    }
}

async fn setup(account: Option<AccountConfig>) -> (MockServer, Arc<MemoryHost>, Platform) {
    let server = MockServer::start().await;
    let host = Arc::new(MemoryHost::new());
    let handle: Arc<dyn Host> = Arc::<MemoryHost>::clone(&host);
    let platform = Platform::new(config(&server, account), handle).unwrap();
    (server, host, platform)
}

/// Midnight today (UTC) as vendor wall-clock seconds.
fn woke_today_secs() -> i64 {
    Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}

async fn sleep_queries(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/parse/classes/SleepEvent")
        .count()
}

async fn mount_sleep_event(server: &MockServer, utc_end: i64) {
    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "objectId": "evt-1",
                "utcStart": utc_end - 8 * 3600,
                "utcEnd": utc_end,
                "sleepMinutes": 420
            }]
        })))
        .mount(server)
        .await;
}

// ── Startup validation ──────────────────────────────────────────────

#[tokio::test]
async fn test_missing_account_is_rejected() {
    let (server, host, platform) = setup(None).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = platform.did_finish_launching().await;

    assert_eq!(state, PlatformState::Rejected(RejectReason::MissingAccount));
    assert_eq!(host.register_calls(), 0);
    assert!(platform.registry().is_empty());
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let expired = Utc::now() - TimeDelta::days(1);
    let (server, host, platform) = setup(Some(account(expired))).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = platform.did_finish_launching().await;

    assert_eq!(state, PlatformState::Rejected(RejectReason::SessionExpired));
    assert_eq!(host.register_calls(), 0);
    assert_eq!(host.registered_count(), 0);
}

#[tokio::test]
async fn test_incomplete_session_needs_auth() {
    let mut incomplete = account(Utc::now() + TimeDelta::days(30));
    incomplete.session_token = SecretString::from(String::new());
    let (_server, host, platform) = setup(Some(incomplete)).await;

    let state = platform.did_finish_launching().await;

    assert_eq!(
        state,
        PlatformState::Rejected(RejectReason::AuthenticationRequired)
    );
    assert_eq!(host.register_calls(), 0);
}

// ── Running ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_launch_registers_and_polls() {
    let (server, host, platform) = setup(Some(account(Utc::now() + TimeDelta::days(30)))).await;
    mount_sleep_event(&server, woke_today_secs()).await;

    let state = platform.did_finish_launching().await;
    assert_eq!(state, PlatformState::Running);

    let uuid = AccessoryIdentity::new("user-1", SensorKind::Awake).uuid();
    assert!(host.is_registered(&uuid));
    assert_eq!(host.register_calls(), 1);

    let accessory = host.accessory(&uuid).unwrap();
    assert!(accessory.occupancy_detected());
    assert_eq!(accessory.read_occupancy(), Some(true));

    let record = platform.registry().get(&uuid).unwrap();
    assert!(record.sensor.current_state());

    platform.shutdown().await;
    assert_eq!(platform.state(), PlatformState::Stopped);
}

#[tokio::test]
async fn test_second_launch_is_noop() {
    let (server, host, platform) = setup(Some(account(Utc::now() + TimeDelta::days(30)))).await;
    mount_sleep_event(&server, woke_today_secs()).await;

    platform.did_finish_launching().await;
    let state = platform.did_finish_launching().await;

    assert_eq!(state, PlatformState::Running);
    assert_eq!(host.register_calls(), 1);
    assert_eq!(platform.registry().len(), 1);
    platform.shutdown().await;
}

#[tokio::test]
async fn test_no_sleep_data_stays_asleep() {
    let (server, host, platform) = setup(Some(account(Utc::now() + TimeDelta::days(30)))).await;
    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    platform.did_finish_launching().await;

    let uuid = AccessoryIdentity::new("user-1", SensorKind::Awake).uuid();
    let accessory = host.accessory(&uuid).unwrap();
    assert!(!accessory.occupancy_detected());
    assert_eq!(accessory.occupancy_writes(), 0);
    platform.shutdown().await;
}

#[tokio::test]
async fn test_vendor_error_keeps_last_state() {
    let (server, host, platform) = setup(Some(account(Utc::now() + TimeDelta::days(30)))).await;
    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": 1,
            "error": "internal"
        })))
        .mount(&server)
        .await;

    let state = platform.did_finish_launching().await;
    assert_eq!(state, PlatformState::Running);

    let uuid = AccessoryIdentity::new("user-1", SensorKind::Awake).uuid();
    assert_eq!(host.accessory(&uuid).unwrap().occupancy_writes(), 0);
    assert_eq!(platform.update_sensors().await, 1);
    platform.shutdown().await;
}

#[tokio::test]
async fn test_poll_task_repeats_sweeps() {
    let server = MockServer::start().await;
    mount_sleep_event(&server, woke_today_secs()).await;

    let host = Arc::new(MemoryHost::new());
    let handle: Arc<dyn Host> = Arc::<MemoryHost>::clone(&host);
    let mut bridge = config(&server, Some(account(Utc::now() + TimeDelta::days(30))));
    bridge.sync_interval = Duration::from_millis(100);
    let platform = Platform::new(bridge, handle).unwrap();

    platform.did_finish_launching().await;
    assert_eq!(sleep_queries(&server).await, 1);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while sleep_queries(&server).await < 3 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "no periodic sweep after launch"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    platform.shutdown().await;
    let after_shutdown = sleep_queries(&server).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(sleep_queries(&server).await, after_shutdown);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_launches_start_once() {
    let (server, host, platform) = setup(Some(account(Utc::now() + TimeDelta::days(30)))).await;
    mount_sleep_event(&server, woke_today_secs()).await;

    let first = tokio::spawn({
        let platform = platform.clone();
        async move { platform.did_finish_launching().await }
    });
    let second = tokio::spawn({
        let platform = platform.clone();
        async move { platform.did_finish_launching().await }
    });
    let states = [first.await.unwrap(), second.await.unwrap()];

    assert!(states.contains(&PlatformState::Running));
    assert_eq!(platform.state(), PlatformState::Running);
    assert_eq!(sleep_queries(&server).await, 1);
    assert_eq!(host.register_calls(), 1);
    platform.shutdown().await;
}

// ── Cache restore ───────────────────────────────────────────────────

#[tokio::test]
async fn test_restored_accessory_is_not_reregistered() {
    let (server, host, platform) = setup(Some(account(Utc::now() + TimeDelta::days(30)))).await;
    mount_sleep_event(&server, woke_today_secs()).await;

    let uuid = AccessoryIdentity::new("user-1", SensorKind::Awake).uuid();
    let mut snapshot = AccessorySnapshot::new("Awake", uuid);
    snapshot.context_type = Some("awake".into());
    let cached = host.restore(snapshot);

    platform.configure_accessory(cached);
    platform.did_finish_launching().await;

    assert_eq!(host.register_calls(), 0);
    assert_eq!(platform.registry().len(), 1);
    assert!(host.accessory(&uuid).unwrap().occupancy_detected());
    platform.shutdown().await;
}

#[tokio::test]
async fn test_unknown_cached_type_is_unregistered() {
    let (_server, host, platform) = setup(Some(account(Utc::now() + TimeDelta::days(30)))).await;

    let mut snapshot = AccessorySnapshot::new("Heart", uuid::Uuid::from_u128(42));
    snapshot.context_type = Some("heart".into());
    let cached = host.restore(snapshot);
    assert_eq!(cached.context_type().as_deref(), Some("heart"));

    platform.configure_accessory(cached);

    assert_eq!(host.unregister_calls(), 1);
    assert!(!host.is_registered(&uuid::Uuid::from_u128(42)));
    assert!(platform.registry().is_empty());
}
