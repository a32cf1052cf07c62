// Vendor wire types
//
// Request and response bodies for the Parse-hosted vendor backend. Only
// the fields the bridge reads are modelled; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Envelopes ───────────────────────────────────────────────────────

/// `POST /parse/login` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub object_id: String,
    pub session_token: String,
}

/// `GET /parse/sessions/me` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub expires_at: ParseDate,
}

/// Parse's `{ "__type": "Date", "iso": "..." }` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseDate {
    pub iso: DateTime<Utc>,
}

/// Class query response: `{ "results": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResults<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Error body returned with non-200 statuses: `{ "code": 101, "error": "..." }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: Option<i64>,
    pub error: Option<String>,
}

// ── Records ─────────────────────────────────────────────────────────

/// One night of sleep as recorded by the ring.
///
/// `utc_end` is epoch seconds in the wearer's local wall clock despite
/// the name; [`MotivClient`](crate::MotivClient) corrects it with the
/// configured UTC offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepEvent {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub utc_start: i64,
    #[serde(default)]
    pub utc_end: i64,
    #[serde(default)]
    pub sleep_minutes: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A bucket of per-minute heart-rate readings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateRecordCollection {
    #[serde(default)]
    pub heart_rate_records: Vec<HeartRateRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateRecord {
    #[serde(default)]
    pub utc_start: i64,
    #[serde(default)]
    pub utc_end: i64,
    #[serde(default)]
    pub bpm: u32,
}

/// The wearer's profile record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Everything else the vendor sends along.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Queries ─────────────────────────────────────────────────────────

/// Body of a class query. The vendor accepts `POST` with `_method: GET`
/// so the filter can travel as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ClassQuery<'a> {
    pub limit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<&'static str>,
    #[serde(rename = "_method")]
    pub method: &'static str,
    #[serde(rename = "where")]
    pub filter: UserFilter<'a>,
}

impl<'a> ClassQuery<'a> {
    /// Newest single record owned by `user_id`, ordered by `order`
    /// (e.g. `"-updatedAt"`).
    pub fn latest_for_user(user_id: &'a str, order: Option<&'static str>) -> Self {
        Self {
            limit: "1",
            order,
            method: "GET",
            filter: UserFilter {
                user: Pointer {
                    kind: "Pointer",
                    class_name: "_User",
                    object_id: user_id,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserFilter<'a> {
    pub user: Pointer<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pointer<'a> {
    #[serde(rename = "__type")]
    pub kind: &'static str,
    pub class_name: &'static str,
    pub object_id: &'a str,
}
