//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use obsfleet_config::ConfigError;
use obsfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const UNAVAILABLE: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(obsfleet::connection_failed),
        help(
            "Check that the unit is powered and its control service is running.\n\
             Try: obsfleet restart-inactive"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(obsfleet::timeout),
        help("Increase the timeout with --timeout or check the unit's network link.")
    )]
    Timeout,

    // ── Units ────────────────────────────────────────────────────────
    #[error("Unit '{name}' not found")]
    #[diagnostic(
        code(obsfleet::not_found),
        help("Run: obsfleet units to see configured units")
    )]
    UnitNotFound { name: String },

    #[error("Unit '{name}' is not available: {reason}")]
    #[diagnostic(
        code(obsfleet::unavailable),
        help("Run: obsfleet status to see which units have an open camera session")
    )]
    UnitUnavailable { name: String, reason: String },

    #[error("Unit '{name}' has no camera {index} ({available} available)")]
    #[diagnostic(
        code(obsfleet::camera_out_of_range),
        help("Run: obsfleet camera {name} to see the active camera")
    )]
    CameraOutOfRange {
        name: String,
        index: usize,
        available: usize,
    },

    #[error("Remote command on '{unit}' failed: {reason}")]
    #[diagnostic(
        code(obsfleet::remote_failed),
        help("Check the [ssh] section of the config file (user, identity_file).")
    )]
    RemoteFailed { unit: String, reason: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Unit rejected the request: {message}")]
    #[diagnostic(code(obsfleet::rejected))]
    Rejected { message: String },

    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(obsfleet::api_error))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(obsfleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No units configured")]
    #[diagnostic(
        code(obsfleet::no_units),
        help(
            "Add a [[units]] entry to the config file, or create one with: obsfleet config init\n\
             Config file: {path}"
        )
    )]
    NoUnits { path: String },

    #[error("Config file already exists: {path}")]
    #[diagnostic(
        code(obsfleet::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(obsfleet::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(obsfleet::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal / IO / Serialization ────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(obsfleet::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(obsfleet::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::UnitNotFound { .. } => exit_code::NOT_FOUND,
            Self::UnitUnavailable { .. } => exit_code::UNAVAILABLE,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. }
            | Self::CameraOutOfRange { .. }
            | Self::ConfigExists { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnitNotFound { name } => Self::UnitNotFound { name },
            CoreError::UnitUnavailable { name, reason } => Self::UnitUnavailable { name, reason },
            CoreError::CameraOutOfRange {
                name,
                index,
                available,
            } => Self::CameraOutOfRange {
                name,
                index,
                available,
            },
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { .. } => Self::Timeout,
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Rejected { message } => Self::Rejected { message },
            CoreError::DispatchFailed { unit, reason } => Self::RemoteFailed { unit, reason },
            CoreError::Api { message, status } => Self::ApiError { status, message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoUnits => Self::NoUnits {
                path: obsfleet_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
