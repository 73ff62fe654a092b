// ── Fleet poller ──
//
// Periodically refreshes status and temperature of every unit with an open
// camera session. One background task, at most one pass in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fleet::{Fleet, UnitHandle};
use crate::model::CameraStatus;

/// Lifecycle of the background ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PollerState {
    Stopped,
    Running,
}

/// Whether a pass is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Ticking,
}

/// Result of one requested pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// `polled` units were refreshed; `failures` individual reads failed.
    Completed { polled: usize, failures: usize },
    /// Another pass was still running.
    Skipped,
}

struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct FleetPoller {
    fleet: Arc<Fleet>,
    interval: Duration,
    phase: Mutex<PollPhase>,
    ticker: Mutex<Option<Ticker>>,
}

/// Resets the phase to `Idle` when the pass ends, even on cancellation.
struct PassGuard<'a> {
    phase: &'a Mutex<PollPhase>,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        *lock(self.phase) = PollPhase::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FleetPoller {
    pub fn new(fleet: Arc<Fleet>, interval: Duration) -> Self {
        Self {
            fleet,
            interval,
            phase: Mutex::new(PollPhase::Idle),
            ticker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PollerState {
        if lock(&self.ticker).is_some() {
            PollerState::Running
        } else {
            PollerState::Stopped
        }
    }

    pub fn phase(&self) -> PollPhase {
        *lock(&self.phase)
    }

    /// Spawn the ticker. No-op when already running.
    pub fn start(self: &Arc<Self>) {
        let mut slot = lock(&self.ticker);
        if slot.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(Arc::clone(self), cancel.clone()));
        *slot = Some(Ticker { cancel, handle });
        debug!(interval_ms = self.interval.as_millis(), "poller started");
    }

    /// Stop the ticker and wait for it to exit. In-flight calls finish
    /// within their own timeout.
    pub async fn shutdown(&self) {
        let ticker = lock(&self.ticker).take();
        if let Some(ticker) = ticker {
            ticker.cancel.cancel();
            if let Err(e) = ticker.handle.await {
                warn!(error = %e, "poller task ended abnormally");
            }
            debug!("poller stopped");
        }
    }

    /// Run one pass now, unless one is already in flight.
    pub async fn poll_once(&self) -> PassOutcome {
        let Some(_guard) = self.try_begin() else {
            debug!("poll pass skipped, previous pass still running");
            return PassOutcome::Skipped;
        };

        let results = join_all(self.fleet.handles().map(|h| refresh_unit(&self.fleet, h))).await;
        let (polled, failures) = results
            .into_iter()
            .flatten()
            .fold((0, 0), |(p, f), failed| (p + 1, f + failed));

        PassOutcome::Completed { polled, failures }
    }

    fn try_begin(&self) -> Option<PassGuard<'_>> {
        let mut phase = lock(&self.phase);
        if *phase == PollPhase::Ticking {
            return None;
        }
        *phase = PollPhase::Ticking;
        Some(PassGuard { phase: &self.phase })
    }
}

/// Refresh one unit. `None` if it has no open session; otherwise the number
/// of failed reads. Failed reads keep the last known value.
async fn refresh_unit(fleet: &Fleet, handle: &UnitHandle) -> Option<usize> {
    let mut state = handle.lock().await;
    if !state.reachable {
        return None;
    }
    let index = state.active_camera?;
    let camera = handle.client().camera(index);

    let (status, temperature) = tokio::join!(camera.get_status(), camera.get_temperature());

    let mut failures = 0;
    let mut refreshed = false;
    match status {
        Ok(label) => {
            state.observed.status = Some(CameraStatus::from(label));
            refreshed = true;
        }
        Err(e) => {
            failures += 1;
            warn!(unit = %handle.name(), error = %e, "status refresh failed");
        }
    }
    match temperature {
        Ok(celsius) => {
            state.observed.temperature_c = Some(celsius);
            refreshed = true;
        }
        Err(e) => {
            failures += 1;
            warn!(unit = %handle.name(), error = %e, "temperature refresh failed");
        }
    }
    if refreshed {
        state.last_updated = Some(Utc::now());
    }

    fleet.publish(handle.name(), &state);
    Some(failures)
}

async fn poll_task(poller: Arc<FleetPoller>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(poller.interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let PassOutcome::Completed { polled, failures } = poller.poll_once().await {
                    debug!(polled, failures, "poll pass finished");
                }
            }
        }
    }
}
