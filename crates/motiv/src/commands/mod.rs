//! Subcommand handlers.

pub mod config_cmd;
pub mod login;
pub mod run;
pub mod status;
