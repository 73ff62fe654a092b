// ── Core error types ──
//
// User-facing errors from obsfleet-core. Consumers never see raw HTTP
// failures; the `From<obsfleet_api::Error>` impl translates transport-layer
// errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fleet errors ─────────────────────────────────────────────────
    #[error("Unit not found: {name}")]
    UnitNotFound { name: String },

    #[error("Unit {name} is not available: {reason}")]
    UnitUnavailable { name: String, reason: String },

    #[error("Camera index {index} out of range for unit {name} ({available} cameras)")]
    CameraOutOfRange {
        name: String,
        index: usize,
        available: usize,
    },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Rejected by unit: {message}")]
    Rejected { message: String },

    #[error("Remote command on {unit} failed: {reason}")]
    DispatchFailed { unit: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<obsfleet_api::Error> for CoreError {
    fn from(err: obsfleet_api::Error) -> Self {
        let status = err.status();
        match err {
            obsfleet_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            obsfleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            obsfleet_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            obsfleet_api::Error::Validation { message } => CoreError::Rejected { message },
            obsfleet_api::Error::Http { body, .. } => CoreError::Api {
                message: body,
                status,
            },
            obsfleet_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
