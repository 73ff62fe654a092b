// Shared transport configuration for building reqwest::Client instances.
//
// Every unit client and the per-camera clients derived from it share one
// connection pool and one timeout through this module.

use std::time::Duration;

/// Default per-request timeout for the control API.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bound on every single request, connect included.
    pub timeout: Duration,
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Config with the same bound for connect and the whole request.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            connect_timeout: timeout,
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(concat!("obsfleet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(crate::error::Error::Transport)
    }
}

// ── Response handling ───────────────────────────────────────────────

/// Translate a send failure, surfacing timeouts as their own variant.
pub(crate) fn send_error(err: reqwest::Error, timeout: Duration) -> crate::error::Error {
    if err.is_timeout() {
        crate::error::Error::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        crate::error::Error::Transport(err)
    }
}

/// Reject non-success responses, keeping a body preview for diagnostics.
///
/// HTTP 422 is the unit's validation failure and gets its own variant.
pub(crate) async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, crate::error::Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let preview: String = body.chars().take(200).collect();

    if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
        tracing::warn!(body = %preview, "unit rejected request (HTTP 422)");
        return Err(crate::error::Error::Validation { message: preview });
    }

    Err(crate::error::Error::Http {
        status: status.as_u16(),
        body: preview,
    })
}
