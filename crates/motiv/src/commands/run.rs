//! `motiv run`: the bridge daemon.

use std::sync::Arc;

use tracing::info;

use motiv_core::{Host, Platform, PlatformState};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::host::JsonFileHost;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let path = config::config_path(global);
    let bridge = cfg
        .to_bridge_config()
        .map_err(|e| CliError::config(e, &path))?;

    let (host, cached) = JsonFileHost::open(&cfg.cache_path())?;
    let host = Arc::new(host);
    let handle: Arc<dyn Host> = Arc::<JsonFileHost>::clone(&host);
    let platform = Platform::new(bridge, handle)?;

    info!(
        cache = %host.path().display(),
        cached = cached.len(),
        "starting bridge"
    );
    for accessory in cached {
        platform.configure_accessory(accessory);
    }

    if let PlatformState::Rejected(reason) = platform.did_finish_launching().await {
        return Err(CliError::Rejected { reason });
    }

    tokio::signal::ctrl_c().await?;
    info!("received shutdown signal, stopping");

    platform.shutdown().await;
    host.flush()?;
    Ok(())
}
