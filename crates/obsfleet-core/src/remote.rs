// ── Out-of-band seams ──
//
// Liveness probing and remote command execution go through the system
// `ping` and `ssh` tools. Both sit behind traits so the fleet can be driven
// by stubs in tests.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::RemoteConfig;
use crate::error::CoreError;
use crate::model::Unit;

/// Extra time granted to the `ping` process beyond its own wait.
const PING_PROCESS_SLACK: Duration = Duration::from_secs(3);

/// Network-level echo probe.
pub trait Pinger: Send + Sync {
    /// `true` when one echo request to `host` was answered within `wait`.
    /// Never fails: any error counts as no answer.
    fn ping<'a>(&'a self, host: &'a str, wait: Duration) -> BoxFuture<'a, bool>;
}

/// Captured output of a successful remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes shell commands on a unit.
pub trait RemoteDispatcher: Send + Sync {
    fn dispatch<'a>(
        &'a self,
        unit: &'a Unit,
        command: &'a str,
    ) -> BoxFuture<'a, Result<RemoteOutput, CoreError>>;
}

// ── System ping ──────────────────────────────────────────────────────

/// [`Pinger`] backed by the platform `ping` binary.
#[derive(Debug, Clone, Default)]
pub struct SystemPinger;

impl SystemPinger {
    fn command(host: &str, wait: Duration) -> Command {
        let mut cmd = Command::new("ping");
        if cfg!(windows) {
            let ms = wait.as_millis().max(1).to_string();
            cmd.args(["-n", "1", "-w", &ms, host]);
        } else if cfg!(target_os = "macos") {
            let secs = wait.as_secs().max(1).to_string();
            cmd.args(["-c", "1", "-t", &secs, host]);
        } else {
            let secs = wait.as_secs().max(1).to_string();
            cmd.args(["-c", "1", "-W", &secs, host]);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Pinger for SystemPinger {
    fn ping<'a>(&'a self, host: &'a str, wait: Duration) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let mut cmd = Self::command(host, wait);
            match tokio::time::timeout(wait + PING_PROCESS_SLACK, cmd.status()).await {
                Ok(Ok(status)) => {
                    trace!(host, code = ?status.code(), "ping finished");
                    status.success()
                }
                Ok(Err(e)) => {
                    debug!(host, error = %e, "could not run ping");
                    false
                }
                Err(_) => {
                    debug!(host, "ping process timed out");
                    false
                }
            }
        })
    }
}

// ── SSH dispatcher ───────────────────────────────────────────────────

/// [`RemoteDispatcher`] backed by the system `ssh` client in batch mode.
#[derive(Debug, Clone)]
pub struct SshDispatcher {
    user: String,
    identity_file: Option<PathBuf>,
    timeout: Duration,
}

impl SshDispatcher {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            user: config.user.clone(),
            identity_file: config.identity_file.clone(),
            timeout: config.timeout,
        }
    }

    fn args(&self, unit: &Unit, command: &str) -> Vec<String> {
        let connect_secs = self.timeout.as_secs().clamp(1, 10);
        let mut args = vec![
            "-o".to_owned(),
            "BatchMode=yes".to_owned(),
            "-o".to_owned(),
            format!("ConnectTimeout={connect_secs}"),
            "-o".to_owned(),
            "StrictHostKeyChecking=accept-new".to_owned(),
        ];
        if let Some(ref key) = self.identity_file {
            args.push("-i".to_owned());
            args.push(key.display().to_string());
        }
        args.push(format!("{}@{}", self.user, unit.host));
        args.push(command.to_owned());
        args
    }
}

impl RemoteDispatcher for SshDispatcher {
    fn dispatch<'a>(
        &'a self,
        unit: &'a Unit,
        command: &'a str,
    ) -> BoxFuture<'a, Result<RemoteOutput, CoreError>> {
        Box::pin(async move {
            let failed = |reason: String| CoreError::DispatchFailed {
                unit: unit.name.clone(),
                reason,
            };

            debug!(unit = %unit.name, command, "ssh dispatch");
            let mut cmd = Command::new("ssh");
            cmd.args(self.args(unit, command))
                .stdin(Stdio::null())
                .kill_on_drop(true);

            let output = tokio::time::timeout(self.timeout, cmd.output())
                .await
                .map_err(|_| failed(format!("timed out after {}s", self.timeout.as_secs())))?
                .map_err(|e| failed(format!("could not run ssh: {e}")))?;

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

            if !output.status.success() {
                let code = output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_owned(), |c| c.to_string());
                return Err(failed(format!("exit status {code}: {}", stderr.trim())));
            }
            Ok(RemoteOutput { stdout, stderr })
        })
    }
}
