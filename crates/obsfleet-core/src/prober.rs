// ── Reachability prober ──
//
// Two-tier liveness check: a network echo, then the application-level
// camera listing. Pure observation; never fails.

use std::sync::Arc;
use std::time::Duration;

use obsfleet_api::UnitClient;
use tracing::debug;

use crate::model::{ReachabilityResult, Unit, UnitRuntimeState};
use crate::remote::Pinger;

pub struct Prober {
    pinger: Arc<dyn Pinger>,
    ping_timeout: Duration,
}

impl Prober {
    pub fn new(pinger: Arc<dyn Pinger>, ping_timeout: Duration) -> Self {
        Self {
            pinger,
            ping_timeout,
        }
    }

    /// Classify `unit`. The camera listing is only attempted after a
    /// successful ping.
    pub async fn probe(&self, unit: &Unit, client: &UnitClient) -> ReachabilityResult {
        if !self.pinger.ping(&unit.host, self.ping_timeout).await {
            debug!(unit = %unit.name, "no echo reply");
            return ReachabilityResult::network_unreachable();
        }

        match client.list_cameras().await {
            Ok(cameras) => {
                debug!(unit = %unit.name, cameras = cameras.len(), "control service answered");
                ReachabilityResult::reachable(cameras)
            }
            Err(e) => {
                debug!(unit = %unit.name, error = %e, "control service did not answer");
                ReachabilityResult::application_unreachable()
            }
        }
    }

    /// Commit a probe result into `state`.
    ///
    /// The camera session and every observed value are dropped when the unit
    /// is not reachable, has no cameras, or reports a different camera list.
    /// Returns `true` if a live session was dropped.
    pub fn apply(result: ReachabilityResult, state: &mut UnitRuntimeState) -> bool {
        let had_session = state.active_camera.is_some();
        let cameras_changed = state.cameras != result.cameras;

        state.pingable = result.pingable;
        state.reachable = result.pingable && result.reachable;
        state.cameras = result.cameras;

        let reset = !state.reachable || cameras_changed || state.cameras.is_empty();
        if reset {
            state.clear_observed();
        }
        if state.selected_camera >= state.cameras.len() {
            state.selected_camera = 0;
        }

        had_session && reset
    }
}
