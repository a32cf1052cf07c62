#![allow(clippy::unwrap_used)]
// Integration tests for `MotivClient` using wiremock.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use motiv_api::{Error, MotivClient, Session};

// ── Helpers ─────────────────────────────────────────────────────────

fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn valid_session() -> Session {
    Session::new(
        "user-1",
        SecretString::from("r:token".to_owned()),
        Utc::now() + Duration::days(30),
    )
}

async fn setup(session: Option<Session>) -> (MockServer, MotivClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client =
        MotivClient::with_client(reqwest::Client::new(), base_url, session).with_utc_offset(utc_offset());
    (server, client)
}

async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/parse/login"))
        .and(body_partial_json(json!({ "username": "user@domain.com", "_method": "GET" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectId": "user-2",
            "sessionToken": "r:fresh"
        })))
        .mount(server)
        .await;
}

// ── Session state ───────────────────────────────────────────────────

#[tokio::test]
async fn test_needs_auth_without_session() {
    let (_server, client) = setup(None).await;
    assert!(client.needs_auth());
}

#[tokio::test]
async fn test_needs_auth_follows_expiry() {
    let (_server, client) = setup(Some(valid_session())).await;
    let now = Utc::now();

    assert!(!client.needs_auth_at(now));
    assert!(client.needs_auth_at(now + Duration::days(31)));
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_stores_session() {
    let (server, client) = setup(None).await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path("/parse/sessions/me"))
        .and(header("X-Parse-Session-Token", "r:fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "expiresAt": { "__type": "Date", "iso": "2099-01-01T00:00:00.000Z" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secret = SecretString::from("hunter2".to_owned());
    let session = client.authenticate("user@domain.com", &secret).await.unwrap();

    assert_eq!(session.user_id(), "user-2");
    assert_eq!(session.token().expose_secret(), "r:fresh");
    assert_eq!(
        session.expires_at(),
        "2099-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
    );
    assert!(!client.needs_auth());
    assert_eq!(client.session().unwrap().user_id(), "user-2");
}

#[tokio::test]
async fn test_authenticate_rejected_keeps_previous_session() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 101,
            "error": "Invalid username/password."
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/parse/sessions/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let secret = SecretString::from("wrong".to_owned());
    let result = client.authenticate("user@domain.com", &secret).await;

    match result {
        Err(Error::Authentication { code, message }) => {
            assert_eq!(code, Some(101));
            assert_eq!(message, "Invalid username/password.");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }

    let session = client.session().unwrap();
    assert_eq!(session.user_id(), "user-1");
    assert_eq!(session.token().expose_secret(), "r:token");
}

#[tokio::test]
async fn test_authenticate_session_lookup_failure_keeps_previous_session() {
    let (server, client) = setup(None).await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path("/parse/sessions/me"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": 1,
            "error": "Internal server error."
        })))
        .mount(&server)
        .await;

    let secret = SecretString::from("hunter2".to_owned());
    let result = client.authenticate("user@domain.com", &secret).await;

    assert!(
        matches!(result, Err(Error::Api { status: 500, .. })),
        "expected Api error, got: {result:?}"
    );
    assert!(client.session().is_none());
    assert!(client.needs_auth());
}

// ── Auth guard ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_last_awakening_requires_auth_without_network() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.last_awakening().await;
    assert!(
        matches!(result, Err(Error::AuthRequired)),
        "expected AuthRequired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_expired_session_requires_auth() {
    let expired = Session::new(
        "user-1",
        SecretString::from("r:token".to_owned()),
        Utc::now() - Duration::days(1),
    );
    let (_server, client) = setup(Some(expired)).await;

    assert!(matches!(client.last_heart_rate().await, Err(Error::AuthRequired)));
    assert!(matches!(client.last_sleep_minutes().await, Err(Error::AuthRequired)));
    assert!(matches!(client.user_profile().await, Err(Error::AuthRequired)));
}

// ── Sleep events ────────────────────────────────────────────────────

#[tokio::test]
async fn test_last_awakening_queries_latest_sleep_event() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .and(header("X-Parse-Session-Token", "r:token"))
        .and(body_partial_json(json!({
            "limit": "1",
            "order": "-updatedAt",
            "_method": "GET",
            "where": { "user": { "__type": "Pointer", "className": "_User", "objectId": "user-1" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "objectId": "sleep-1",
                "utcStart": 1_541_389_579,
                "utcEnd": 1_541_424_202,
                "sleepMinutes": 512
            }]
        })))
        .mount(&server)
        .await;

    let woke = client.last_awakening().await.unwrap();
    assert_eq!(woke.timestamp(), 1_541_424_202);

    let cached = client.last_sleep_event().unwrap();
    assert_eq!(cached.object_id.as_deref(), Some("sleep-1"));
    assert_eq!(cached.sleep_minutes, 512);
}

#[tokio::test]
async fn test_last_awakening_applies_utc_offset() {
    let server = MockServer::start().await;
    let client = MotivClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Some(valid_session()),
    )
    .with_utc_offset(FixedOffset::west_opt(5 * 3600).unwrap());

    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "utcEnd": 1_541_424_202, "sleepMinutes": 400 }]
        })))
        .mount(&server)
        .await;

    let woke = client.last_awakening().await.unwrap();
    assert_eq!(woke.timestamp(), 1_541_424_202 + 5 * 3600);
}

#[tokio::test]
async fn test_last_awakening_empty_results_is_epoch() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let woke = client.last_awakening().await.unwrap();
    assert_eq!(woke.timestamp(), 0);
    assert_eq!(client.last_sleep_minutes().await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_payload_is_deserialization_error() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/SleepEvent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.last_awakening().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Heart rate ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_last_heart_rate_takes_newest_minute() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/HeartRateMinuteRecordCollection"))
        .and(body_partial_json(json!({ "order": "-utcStart", "limit": "1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "heartRateRecords": [
                    { "utcStart": 100, "utcEnd": 160, "bpm": 58 },
                    { "utcStart": 160, "utcEnd": 220, "bpm": 61 }
                ]
            }]
        })))
        .mount(&server)
        .await;

    assert_eq!(client.last_heart_rate().await.unwrap(), 61);
    assert_eq!(client.last_heart_rate_record().unwrap().utc_start, 160);
}

#[tokio::test]
async fn test_last_heart_rate_empty_collection_is_zero() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/HeartRateMinuteRecordCollection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "heartRateRecords": [] }]
        })))
        .mount(&server)
        .await;

    assert_eq!(client.last_heart_rate().await.unwrap(), 0);
}

// ── Profile ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_user_profile() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/UserProfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "objectId": "profile-1", "email": "user@domain.com" }]
        })))
        .mount(&server)
        .await;

    assert!(client.profile().is_none());

    let profile = client.user_profile().await.unwrap().unwrap();
    assert_eq!(profile.email.as_deref(), Some("user@domain.com"));

    let cached = client.profile().unwrap();
    assert_eq!(cached.object_id.as_deref(), Some("profile-1"));
    assert!(Arc::ptr_eq(&cached, &profile));
}

#[tokio::test]
async fn test_vendor_error_carries_status() {
    let (server, client) = setup(Some(valid_session())).await;

    Mock::given(method("POST"))
        .and(path("/parse/classes/UserProfile"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": 209,
            "error": "invalid session token"
        })))
        .mount(&server)
        .await;

    let err = client.user_profile().await.unwrap_err();
    assert_eq!(err.api_error_code(), Some(209));
    assert!(matches!(err, Error::Api { status: 403, .. }));
}
