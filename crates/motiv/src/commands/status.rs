//! `motiv status`: session state and the latest vendor readings.

use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Serialize;

use motiv_api::records::wall_clock_to_instant;
use motiv_api::{MotivClient, TransportConfig};
use motiv_core::sensor::is_awake;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output::{self, DetailRow};

#[derive(Debug, Default, Serialize)]
struct StatusReport {
    user_id: String,
    session_valid: bool,
    session_expiry: Option<DateTime<Utc>>,
    last_awakening: Option<DateTime<FixedOffset>>,
    since_awakening: Option<String>,
    awake: Option<bool>,
    sleep_minutes: Option<u32>,
    heart_rate_bpm: Option<u32>,
    email: Option<String>,
}

fn rows(report: &StatusReport) -> Vec<DetailRow> {
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".into());

    vec![
        DetailRow::new("User", report.user_id.clone()),
        DetailRow::new(
            "Session",
            if report.session_valid { "valid" } else { "expired" },
        ),
        DetailRow::new(
            "Expires",
            or_dash(
                report
                    .session_expiry
                    .map(|t| t.with_timezone(&Local).format("%c").to_string()),
            ),
        ),
        DetailRow::new(
            "Last awakening",
            or_dash(report.last_awakening.map(|t| t.to_rfc3339())),
        ),
        DetailRow::new("Since awakening", or_dash(report.since_awakening.clone())),
        DetailRow::new(
            "Awake",
            or_dash(report.awake.map(|a| if a { "yes" } else { "no" }.to_owned())),
        ),
        DetailRow::new(
            "Sleep",
            or_dash(report.sleep_minutes.map(|m| format!("{m} min"))),
        ),
        DetailRow::new(
            "Heart rate",
            or_dash(report.heart_rate_bpm.map(|b| format!("{b} bpm"))),
        ),
        DetailRow::new("E-mail", or_dash(report.email.clone())),
    ]
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let path = config::config_path(global);
    let bridge = cfg
        .to_bridge_config()
        .map_err(|e| CliError::config(e, &path))?;

    let Some(account) = bridge.account.as_ref() else {
        return Err(CliError::NoAccount {
            path: path.display().to_string(),
        });
    };

    let transport = TransportConfig::default().with_timeout(bridge.timeout);
    let client = MotivClient::new(bridge.api_url.clone(), &transport, Some(account.to_session()))?
        .with_utc_offset(bridge.utc_offset);

    let now = Utc::now();
    let mut report = StatusReport {
        user_id: account.user_id.clone(),
        session_valid: !client.needs_auth_at(now),
        session_expiry: Some(account.session_expiry),
        ..StatusReport::default()
    };

    if report.session_valid {
        let event = client.fetch_last_sleep_event().await?;
        let woke = wall_clock_to_instant(event.utc_end, client.utc_offset())?;

        report.last_awakening = Some(woke);
        report.since_awakening = Some(output::format_time_span(&now, &woke));
        report.awake = Some(is_awake(now, woke));
        report.sleep_minutes = Some(event.sleep_minutes);
        report.heart_rate_bpm = Some(client.last_heart_rate().await?);
        report.email = client
            .user_profile()
            .await?
            .and_then(|profile| profile.email.clone());
    }

    let rendered = output::render_single(global.output, &report, rows)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
