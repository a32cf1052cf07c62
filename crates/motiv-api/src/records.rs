// Vendor record queries
//
// Every query fetches exactly one record (limit 1, server-side ordering)
// for the session's user. An empty result is not an error: each accessor
// falls back to a zero value so callers can treat "no data yet" uniformly.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use tracing::debug;

use crate::client::MotivClient;
use crate::error::Error;
use crate::models::{
    ClassQuery, HeartRateRecord, HeartRateRecordCollection, QueryResults, SleepEvent, UserProfile,
};

pub(crate) const SLEEP_EVENT_PATH: &str = "/parse/classes/SleepEvent";
pub(crate) const HEART_RATE_PATH: &str = "/parse/classes/HeartRateMinuteRecordCollection";
pub(crate) const USER_PROFILE_PATH: &str = "/parse/classes/UserProfile";

impl MotivClient {
    /// When the wearer last woke up.
    ///
    /// Resolves to the Unix epoch when the vendor has no sleep events.
    pub async fn last_awakening(&self) -> Result<DateTime<FixedOffset>, Error> {
        let event = self.fetch_last_sleep_event().await?;
        wall_clock_to_instant(event.utc_end, self.utc_offset())
    }

    /// Minutes slept during the most recent sleep event (0 if none).
    pub async fn last_sleep_minutes(&self) -> Result<u32, Error> {
        Ok(self.fetch_last_sleep_event().await?.sleep_minutes)
    }

    /// The newest per-minute heart-rate reading in bpm (0 if none).
    pub async fn last_heart_rate(&self) -> Result<u32, Error> {
        Ok(self.fetch_last_heart_rate_record().await?.bpm)
    }

    /// The most recently updated sleep event, or a zeroed event.
    pub async fn fetch_last_sleep_event(&self) -> Result<Arc<SleepEvent>, Error> {
        let session = self.require_session()?;
        let query = ClassQuery::latest_for_user(session.user_id(), Some("-updatedAt"));

        let resp: QueryResults<SleepEvent> = self
            .post(SLEEP_EVENT_PATH, &query, Some(session.token()))
            .await?;

        let event = Arc::new(resp.results.into_iter().next().unwrap_or_default());
        debug!(utc_end = event.utc_end, "fetched last sleep event");
        self.last_sleep_event.store(Some(Arc::clone(&event)));
        Ok(event)
    }

    /// The last minute record of the newest heart-rate collection, or a
    /// zeroed record.
    pub async fn fetch_last_heart_rate_record(&self) -> Result<Arc<HeartRateRecord>, Error> {
        let session = self.require_session()?;
        let query = ClassQuery::latest_for_user(session.user_id(), Some("-utcStart"));

        let resp: QueryResults<HeartRateRecordCollection> = self
            .post(HEART_RATE_PATH, &query, Some(session.token()))
            .await?;

        let record = resp
            .results
            .into_iter()
            .next()
            .and_then(|collection| collection.heart_rate_records.into_iter().next_back())
            .unwrap_or_default();

        let record = Arc::new(record);
        debug!(bpm = record.bpm, "fetched last heart rate");
        self.last_heart_rate.store(Some(Arc::clone(&record)));
        Ok(record)
    }

    /// The wearer's profile, or `None` if the vendor has none.
    pub async fn user_profile(&self) -> Result<Option<Arc<UserProfile>>, Error> {
        let session = self.require_session()?;
        let query = ClassQuery::latest_for_user(session.user_id(), None);

        let resp: QueryResults<UserProfile> = self
            .post(USER_PROFILE_PATH, &query, Some(session.token()))
            .await?;

        let profile = resp.results.into_iter().next().map(Arc::new);
        if let Some(ref profile) = profile {
            self.profile.store(Some(Arc::clone(profile)));
        }
        Ok(profile)
    }
}

/// Interpret vendor epoch seconds as wall-clock time at `offset`.
///
/// Zero is the "no data" sentinel and maps to the Unix epoch unchanged.
pub fn wall_clock_to_instant(
    seconds: i64,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, Error> {
    if seconds == 0 {
        return Ok(DateTime::UNIX_EPOCH.with_timezone(&offset));
    }

    let wall: NaiveDateTime = DateTime::from_timestamp(seconds, 0)
        .ok_or(Error::TimestampOutOfRange { seconds })?
        .naive_utc();

    offset
        .from_local_datetime(&wall)
        .single()
        .ok_or(Error::TimestampOutOfRange { seconds })
}
