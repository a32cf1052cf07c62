// ── Platform orchestrator ──
//
// Wires the vendor client, the registry and the poll task together and
// drives the startup sequence the host triggers: cached accessories are
// replayed through `configure_accessory`, then `did_finish_launching`
// validates the account and starts polling.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use motiv_api::{MotivClient, TransportConfig};

use crate::config::{AccountConfig, BridgeConfig};
use crate::error::CoreError;
use crate::host::{AccessoryHandle, Host};
use crate::registry::AccessoryRegistry;
use crate::sensor::SensorKind;

/// Why startup validation refused to start the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RejectReason {
    #[strum(
        to_string = "Incomplete configuration. Run `motiv login <email>` for account configuration."
    )]
    MissingAccount,
    #[strum(to_string = "Account session expired. Run `motiv login <email>` to renew the session.")]
    SessionExpired,
    #[strum(to_string = "The Motiv API needs authentication. Run `motiv login <email>`.")]
    AuthenticationRequired,
}

/// Lifecycle of a [`Platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformState {
    /// Constructed; the host has not signalled readiness yet.
    Created,
    /// Account checks passed; accessories are being set up.
    Validated,
    /// Account checks failed. Nothing is polled.
    Rejected(RejectReason),
    /// Polling.
    Running,
    /// Shut down after running.
    Stopped,
}

/// The bridge platform.
///
/// Cheaply cloneable via `Arc<PlatformInner>`.
#[derive(Clone)]
pub struct Platform {
    inner: Arc<PlatformInner>,
}

struct PlatformInner {
    config: BridgeConfig,
    client: Arc<MotivClient>,
    registry: AccessoryRegistry,
    state: watch::Sender<PlatformState>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Platform {
    /// Build the platform and its vendor client from configuration. Does
    /// NOT contact the vendor.
    pub fn new(config: BridgeConfig, host: Arc<dyn Host>) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let session = config.account.as_ref().map(AccountConfig::to_session);
        let client = MotivClient::new(config.api_url.clone(), &transport, session)?
            .with_utc_offset(config.utc_offset);

        Ok(Self::with_client(config, host, Arc::new(client)))
    }

    /// Build the platform around an existing client.
    pub fn with_client(config: BridgeConfig, host: Arc<dyn Host>, client: Arc<MotivClient>) -> Self {
        let user_id = config.account.as_ref().map(|account| account.user_id.clone());
        let registry = AccessoryRegistry::new(host, Arc::clone(&client), user_id);
        let (state, _) = watch::channel(PlatformState::Created);

        Self {
            inner: Arc::new(PlatformInner {
                config,
                client,
                registry,
                state,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<MotivClient> {
        &self.inner.client
    }

    pub fn registry(&self) -> &AccessoryRegistry {
        &self.inner.registry
    }

    pub fn state(&self) -> PlatformState {
        *self.inner.state.borrow()
    }

    // ── Host callbacks ───────────────────────────────────────────────

    /// Called by the host once per cached accessory, before
    /// [`did_finish_launching()`](Self::did_finish_launching).
    pub fn configure_accessory(&self, accessory: AccessoryHandle) {
        let uuid = accessory.uuid();
        match self.inner.registry.restore(accessory) {
            Ok(()) => {}
            Err(CoreError::UnrecognizedAccessoryType { kind }) => {
                error!(
                    %uuid,
                    "No Motiv accessory for type \"{kind}\". This accessory has been removed."
                );
            }
            Err(e) => error!(%uuid, error = %e, "failed to restore cached accessory"),
        }
    }

    /// Called by the host once it is ready. Validates the account, makes
    /// sure the accessories exist, polls once and starts the periodic
    /// task. Calling it again is a no-op.
    pub async fn did_finish_launching(&self) -> PlatformState {
        let verdict = self.validate(Utc::now());

        // Leaving `Created` is claimed in one step, so only one caller
        // ever gets past this point.
        let claimed = self.inner.state.send_if_modified(|state| {
            if *state != PlatformState::Created {
                return false;
            }
            *state = match verdict {
                Ok(()) => PlatformState::Validated,
                Err(reason) => PlatformState::Rejected(reason),
            };
            true
        });
        if !claimed {
            let current = self.state();
            debug!(state = ?current, "already launched");
            return current;
        }

        if let Err(reason) = verdict {
            error!("{reason}");
            return self.state();
        }

        if let Err(e) = self.inner.registry.ensure(SensorKind::Awake.as_ref()) {
            error!(error = %e, "failed to set up accessory");
        }

        self.update_sensors().await;
        self.spawn_poll_task().await;

        self.set_state(PlatformState::Running);
        info!(
            accessories = self.inner.registry.len(),
            sync_secs = self.inner.config.poll_period().as_secs(),
            "bridge running"
        );
        self.state()
    }

    /// Check the configured account against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), RejectReason> {
        let Some(account) = &self.inner.config.account else {
            return Err(RejectReason::MissingAccount);
        };
        if account.is_expired_at(now) {
            return Err(RejectReason::SessionExpired);
        }
        if self.inner.client.needs_auth_at(now) {
            return Err(RejectReason::AuthenticationRequired);
        }
        Ok(())
    }

    /// One sweep over every live sensor. Returns how many were polled.
    pub async fn update_sensors(&self) -> usize {
        self.inner
            .registry
            .for_each_live(|sensor| async move { sensor.update().await })
            .await
    }

    /// Stop the poll task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        if self.state() == PlatformState::Running {
            self.set_state(PlatformState::Stopped);
        }
        debug!("platform stopped");
    }

    // ── Internals ────────────────────────────────────────────────────

    fn set_state(&self, state: PlatformState) {
        self.inner.state.send_replace(state);
    }

    async fn spawn_poll_task(&self) {
        let period = self.inner.config.poll_period();
        let platform = self.clone();
        let cancel = self.inner.cancel.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(poll_task(platform, period, cancel)));
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Periodically poll every live sensor.
async fn poll_task(platform: Platform, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let polled = platform.update_sensors().await;
                debug!(polled, "periodic sensor sweep");
            }
        }
    }
}
