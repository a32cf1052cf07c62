//! Config resolution for the CLI: `--config` override on top of the
//! shared `motiv-config` loader.

use std::path::PathBuf;

pub use motiv_config::{Account, Config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file this invocation reads and writes.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(motiv_config::config_path)
}

/// Load the config file (defaults if absent) plus `MOTIV_*` overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    motiv_config::load_config_from(&path).map_err(|e| CliError::config(e, &path))
}

/// Persist `cfg` to the config file this invocation uses.
pub fn save(global: &GlobalOpts, cfg: &Config) -> Result<PathBuf, CliError> {
    let path = config_path(global);
    motiv_config::save_config_to(&path, cfg).map_err(|e| CliError::config(e, &path))?;
    Ok(path)
}
