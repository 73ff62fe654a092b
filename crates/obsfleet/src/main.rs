mod cli;
mod commands;
mod error;
mod output;

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use obsfleet_config::{Config, ConfigError};
use obsfleet_core::FleetController;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The config is loaded once, up front, so the log file can be honoured.
    let config = obsfleet_config::load_config(cli.global.config.as_deref());
    let log_file = config
        .as_ref()
        .ok()
        .and_then(|c| c.defaults.log_file.clone());
    let guard = init_tracing(cli.global.verbose, log_file.as_deref());

    if let Err(err) = run(cli, config).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        drop(guard);
        std::process::exit(code);
    }
}

/// stderr logging, plus a daily rolling file when `log_file` is configured.
fn init_tracing(verbosity: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("obsfleet.log"));
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli, config: Result<Config, ConfigError>) -> Result<(), CliError> {
    match cli.command {
        // Config commands work even when the file is missing or invalid
        Command::Config(args) => commands::config_cmd::handle(args, config, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "obsfleet", &mut std::io::stdout());
            Ok(())
        }

        // Listing units needs the config but no network
        Command::Units => commands::fleet::units(&config?, &cli.global),

        // All other commands drive the fleet
        cmd => {
            let config = config?;
            let poll_interval = match &cmd {
                Command::Watch(args) => args.interval,
                _ => None,
            };
            let controller = build_controller(&config, &cli.global, poll_interval)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &controller, &cli.global).await;
            controller.shutdown().await;
            result
        }
    }
}

/// Build a `FleetController` from the config file plus CLI overrides.
fn build_controller(
    config: &Config,
    global: &GlobalOpts,
    poll_interval: Option<Duration>,
) -> Result<FleetController, CliError> {
    let units = commands::util::require_units(config, global)?;
    let mut fleet = config.fleet_config();

    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }
        fleet.timeout = Duration::from_secs(secs);
    }
    if let Some(interval) = poll_interval {
        if interval.is_zero() {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        fleet.poll_interval = interval;
    }

    Ok(FleetController::new(fleet, units)?)
}
