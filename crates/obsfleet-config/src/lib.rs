//! Configuration for the obsfleet CLI.
//!
//! TOML file + `OBSFLEET_` environment overrides, the unit list, and
//! translation to `obsfleet_core::FleetConfig`. Core never reads files; this
//! crate is the only place that does.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use obsfleet_core::{Baseline, FleetConfig, RemoteConfig, Unit};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `OBSFLEET_DEFAULTS__TIMEOUT=10`.
pub const ENV_PREFIX: &str = "OBSFLEET_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no units configured")]
    NoUnits,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub ssh: SshSettings,

    /// The fleet, in display order.
    #[serde(default)]
    pub units: Vec<UnitEntry>,
}

/// Fleet-wide settings. Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Wait between a service restart and the re-probe.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: u64,

    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,

    /// Baseline binning applied on every reconciliation.
    #[serde(default = "default_binning")]
    pub binning: u32,

    /// Baseline readout mode. An empty string leaves the camera's mode alone.
    #[serde(default = "default_readout_mode")]
    pub readout_mode: String,

    /// Optional rolling log file, in addition to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            settle_delay: default_settle_delay(),
            ping_timeout: default_ping_timeout(),
            binning: default_binning(),
            readout_mode: default_readout_mode(),
            log_file: None,
        }
    }
}

fn default_port() -> u16 {
    obsfleet_core::model::DEFAULT_PORT
}
fn default_timeout() -> u64 {
    5
}
fn default_poll_interval() -> u64 {
    5
}
fn default_settle_delay() -> u64 {
    5
}
fn default_ping_timeout() -> u64 {
    1
}
fn default_binning() -> u32 {
    1
}
fn default_readout_mode() -> String {
    "RAW16".into()
}

/// Remote shell settings used for recovery and `exec`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SshSettings {
    #[serde(default = "default_ssh_user")]
    pub user: String,

    /// Private key; `~/` is expanded to the home directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,

    #[serde(default = "default_restart_command")]
    pub restart_command: String,

    #[serde(default = "default_ssh_timeout")]
    pub timeout: u64,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            user: default_ssh_user(),
            identity_file: None,
            restart_command: default_restart_command(),
            timeout: default_ssh_timeout(),
        }
    }
}

fn default_ssh_user() -> String {
    "pi".into()
}
fn default_restart_command() -> String {
    "sudo supervisorctl restart gunicorn".into()
}
fn default_ssh_timeout() -> u64 {
    15
}

/// One configured unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnitEntry {
    pub name: String,
    pub host: String,
    /// Overrides `defaults.port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Config {
    /// A starter configuration with one example unit.
    pub fn starter() -> Self {
        Self {
            units: vec![UnitEntry {
                name: "A".into(),
                host: "192.168.1.50".into(),
                port: None,
            }],
            ..Self::default()
        }
    }

    /// Check the whole file. Called by every loader.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.defaults;
        for (field, value) in [
            ("defaults.timeout", d.timeout),
            ("defaults.poll_interval", d.poll_interval),
            ("defaults.ping_timeout", d.ping_timeout),
            ("ssh.timeout", self.ssh.timeout),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }
        if d.port == 0 {
            return Err(invalid("defaults.port", "must be greater than zero"));
        }
        if d.binning == 0 {
            return Err(invalid("defaults.binning", "must be at least 1"));
        }
        if self.ssh.user.trim().is_empty() {
            return Err(invalid("ssh.user", "must not be empty"));
        }
        if self.ssh.restart_command.trim().is_empty() {
            return Err(invalid("ssh.restart_command", "must not be empty"));
        }

        let mut seen = HashSet::new();
        for (i, unit) in self.units.iter().enumerate() {
            if unit.name.trim().is_empty() {
                return Err(invalid(format!("units[{i}].name"), "must not be empty"));
            }
            if unit.host.trim().is_empty() {
                return Err(invalid(format!("units[{i}].host"), "must not be empty"));
            }
            if unit.port == Some(0) {
                return Err(invalid(format!("units[{i}].port"), "must be greater than zero"));
            }
            if !seen.insert(unit.name.as_str()) {
                return Err(invalid(
                    format!("units[{i}].name"),
                    format!("duplicate unit name '{}'", unit.name),
                ));
            }
        }
        Ok(())
    }

    /// The configured units with default ports filled in.
    pub fn units(&self) -> Vec<Unit> {
        self.units
            .iter()
            .map(|u| Unit::new(&u.name, &u.host, u.port.unwrap_or(self.defaults.port)))
            .collect()
    }

    /// Like [`units`](Self::units), but an empty fleet is an error.
    pub fn require_units(&self) -> Result<Vec<Unit>, ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::NoUnits);
        }
        Ok(self.units())
    }

    /// Translate to runtime settings for `obsfleet_core`.
    pub fn fleet_config(&self) -> FleetConfig {
        let d = &self.defaults;
        let readout_mode = Some(d.readout_mode.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_owned);

        FleetConfig {
            timeout: Duration::from_secs(d.timeout),
            ping_timeout: Duration::from_secs(d.ping_timeout),
            poll_interval: Duration::from_secs(d.poll_interval),
            settle_delay: Duration::from_secs(d.settle_delay),
            baseline: Baseline {
                binning: d.binning,
                readout_mode,
            },
            remote: RemoteConfig {
                user: self.ssh.user.clone(),
                identity_file: self.ssh.identity_file.as_deref().map(expand_home),
                restart_command: self.ssh.restart_command.clone(),
                timeout: Duration::from_secs(self.ssh.timeout),
            },
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => BaseDirs::new().map_or_else(
            || path.to_path_buf(),
            |dirs| dirs.home_dir().join(rest),
        ),
        Err(_) => path.to_path_buf(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "obsfleet", "obsfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
    p.push(".config");
    p.push("obsfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from `path` (or the platform default) plus the
/// environment. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
