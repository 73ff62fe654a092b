//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use obsfleet_config::{Config, ConfigError};
use obsfleet_core::Unit;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// The config file in effect: `--config` or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(obsfleet_config::config_path)
}

/// The configured units; an empty fleet is an error pointing at the file.
pub fn require_units(config: &Config, global: &GlobalOpts) -> Result<Vec<Unit>, CliError> {
    config.require_units().map_err(|e| match e {
        ConfigError::NoUnits => CliError::NoUnits {
            path: config_file(global).display().to_string(),
        },
        other => other.into(),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, the action is refused instead of hanging.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Spinner on stderr for fleet-wide actions. Hidden when quiet, when output
/// is meant for scripts, or when stderr is not a terminal.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || global.output != OutputFormat::Table || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn note(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}
