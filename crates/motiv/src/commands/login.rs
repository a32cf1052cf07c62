//! `motiv login`: authenticate and persist the vendor session.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use secrecy::SecretString;
use serde_json::json;

use motiv_api::{MotivClient, TransportConfig};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::{self, Account};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map an interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Authenticating...");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// The platform block a home-automation host config should carry.
fn platform_snippet(account: &Account) -> serde_json::Value {
    json!({
        "platform": "MotivPlatform",
        "name": "MotivPlatform",
        "account": {
            "userId": account.user_id,
            "sessionToken": account.session_token,
            "sessionExpiry": account.session_expiry,
        }
    })
}

fn report(account: &Account, expiry: DateTime<Utc>, global: &GlobalOpts) -> Result<(), CliError> {
    if global.quiet {
        return Ok(());
    }
    let color = output::should_color(global.color);
    let until = format!("Authenticated until {}", expiry.with_timezone(&Local).format("%c"));
    let snippet = format!(
        "Platform config should be:\n{}",
        output::render_json(&platform_snippet(account), false)?
    );

    if color {
        eprintln!("{} {}", "✓".green(), until.green().bold());
        println!("{}", snippet.blue().bold());
    } else {
        eprintln!("✓ {until}");
        println!("{snippet}");
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;
    let path = config::config_path(global);

    if !args.force {
        if let Some(account) = &cfg.account {
            if let Ok(expiry) = account.expiry() {
                if expiry >= Utc::now() {
                    return report(account, expiry, global);
                }
            }
        }
    }

    let bridge = cfg
        .to_bridge_config()
        .map_err(|e| CliError::config(e, &path))?;
    let transport = TransportConfig::default().with_timeout(bridge.timeout);
    let client = MotivClient::new(bridge.api_url, &transport, None)?;

    let password = rpassword::prompt_password("Enter your MyMotiv password [masked]: ")
        .map_err(prompt_err)?;
    let password = SecretString::from(password);

    let pb = spinner(global.quiet);
    let session = match client.authenticate(&args.email, &password).await {
        Ok(session) => session,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };
    pb.finish_and_clear();

    let account = Account::from_session(&session);
    cfg.account = Some(account.clone());
    let saved = config::save(global, &cfg)?;
    tracing::info!(path = %saved.display(), user = %account.user_id, "session stored");

    report(&account, session.expires_at(), global)
}
