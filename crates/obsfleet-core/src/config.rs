// ── Runtime fleet configuration ──
//
// These types describe *how* to talk to the fleet: timeouts, scheduling
// and the remote-shell settings used for recovery. They never touch disk;
// `obsfleet-config` builds a `FleetConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

/// Baseline camera settings applied on every reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    /// Symmetric binning factor sent to `set_binx`.
    pub binning: u32,
    /// Pixel format sent to `set_readoutmode_str`. `None` leaves it alone.
    pub readout_mode: Option<String>,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            binning: 1,
            readout_mode: None,
        }
    }
}

/// Remote-shell settings for recovery and operator commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Login user on every unit.
    pub user: String,
    /// Private key for public-key authentication.
    pub identity_file: Option<PathBuf>,
    /// Command that restarts the unit's control service.
    pub restart_command: String,
    /// Bound on one remote command, connection included.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            user: "pi".into(),
            identity_file: None,
            restart_command: "sudo supervisorctl restart gunicorn".into(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Configuration for one fleet session.
///
/// Built by the CLI from the config file -- core never reads config files.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Per-request timeout against the control API.
    pub timeout: Duration,
    /// How long to wait for an echo reply.
    pub ping_timeout: Duration,
    /// Interval between poller passes.
    pub poll_interval: Duration,
    /// Wait between a service restart and the re-probe.
    pub settle_delay: Duration,
    pub baseline: Baseline,
    pub remote: RemoteConfig,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            timeout: obsfleet_api::transport::DEFAULT_TIMEOUT,
            ping_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_secs(5),
            settle_delay: Duration::from_secs(5),
            baseline: Baseline::default(),
            remote: RemoteConfig::default(),
        }
    }
}
