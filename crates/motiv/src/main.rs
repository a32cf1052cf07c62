mod cli;
mod commands;
mod config;
mod error;
mod host;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, matches!(cli.command, Command::Run));

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `run` is a daemon, so it logs lifecycle events by default; one-shot
/// commands stay at `warn` unless asked.
fn init_tracing(verbosity: u8, daemon: bool) {
    let filter = match verbosity.saturating_add(u8::from(daemon)) {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    tracing::debug!(command = ?cli.command, "dispatching command");

    match cli.command {
        Command::Login(args) => commands::login::handle(args, &cli.global).await,
        Command::Run => commands::run::handle(&cli.global).await,
        Command::Status => commands::status::handle(&cli.global).await,
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "motiv", &mut std::io::stdout());
            Ok(())
        }
    }
}
