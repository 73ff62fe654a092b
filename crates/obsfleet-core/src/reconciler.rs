// ── Session reconciler ──
//
// Opens a session on the selected camera of a reachable unit, applies the
// baseline configuration and reads back the operational parameters.

use chrono::Utc;
use obsfleet_api::UnitClient;
use tracing::{debug, warn};

use crate::config::Baseline;
use crate::model::{CameraStatus, Unit, UnitRuntimeState};

/// What one reconciliation achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Not reachable or no cameras; the session was cleared.
    Skipped,
    /// `init_camera` failed; no session is open.
    InitFailed,
    /// Session open. `failed_reads` fields could not be read and are unknown.
    Reconciled { failed_reads: usize },
}

impl ReconcileOutcome {
    pub fn is_reconciled(self) -> bool {
        matches!(self, Self::Reconciled { .. })
    }
}

pub struct Reconciler {
    baseline: Baseline,
}

impl Reconciler {
    pub fn new(baseline: Baseline) -> Self {
        Self { baseline }
    }

    /// Rebuild the camera session of `unit` in place.
    ///
    /// Observed fields are cleared first, so a field that cannot be read is
    /// left unknown rather than stale.
    pub async fn reconcile(
        &self,
        unit: &Unit,
        client: &UnitClient,
        state: &mut UnitRuntimeState,
    ) -> ReconcileOutcome {
        state.clear_observed();

        if !state.reachable || state.cameras.is_empty() {
            debug!(unit = %unit.name, "nothing to reconcile");
            return ReconcileOutcome::Skipped;
        }
        if state.selected_camera >= state.cameras.len() {
            state.selected_camera = 0;
        }
        let index = state.selected_camera;
        let camera = client.camera(index);

        if let Err(e) = camera.init_camera().await {
            warn!(unit = %unit.name, camera = index, error = %e, "camera init failed");
            return ReconcileOutcome::InitFailed;
        }

        // ── Baseline (best effort) ──
        if let Err(e) = camera.set_binning(self.baseline.binning).await {
            warn!(unit = %unit.name, error = %e, "could not apply baseline binning");
        }
        if let Some(ref mode) = self.baseline.readout_mode {
            if let Err(e) = camera.set_readout_mode(mode).await {
                warn!(unit = %unit.name, mode, error = %e, "could not apply baseline readout mode");
            }
        }

        // ── Independent reads ──
        let (cooler, target, temperature, exposure, gain, status) = tokio::join!(
            camera.get_cooler_on(),
            camera.get_target_temperature(),
            camera.get_temperature(),
            camera.get_exposure(),
            camera.get_gain(),
            camera.get_status(),
        );

        let mut failed_reads = 0;
        let mut keep = |field: &str, ok: bool| {
            if !ok {
                failed_reads += 1;
                warn!(unit = %unit.name, field, "read failed, value unknown");
            }
        };

        let observed = &mut state.observed;
        observed.cooler_on = cooler.ok();
        keep("cooler_on", observed.cooler_on.is_some());
        observed.target_temperature_c = target.ok();
        keep("target_temperature", observed.target_temperature_c.is_some());
        observed.temperature_c = temperature.ok();
        keep("temperature", observed.temperature_c.is_some());
        observed.exposure_us = exposure.ok().and_then(seconds_to_micros);
        keep("exposure", observed.exposure_us.is_some());
        observed.gain = gain.ok();
        keep("gain", observed.gain.is_some());
        observed.status = status.ok().map(CameraStatus::from);
        keep("status", observed.status.is_some());

        state.active_camera = Some(index);
        state.last_updated = Some(Utc::now());
        debug!(unit = %unit.name, camera = index, failed_reads, "session reconciled");

        ReconcileOutcome::Reconciled { failed_reads }
    }
}

/// Device exposure (seconds, float) to stored microseconds, rounded.
/// Negative or non-finite values are rejected.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
pub(crate) fn seconds_to_micros(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros >= 2f64.powi(64) {
        return None;
    }
    Some(micros as u64)
}
