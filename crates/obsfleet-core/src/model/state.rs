use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::capture::CaptureCount;
use super::reachability::{self, Reachability};
use super::unit::Unit;

/// Device state label as reported by `get_status`.
///
/// Open-ended: firmware may add states at any time, so only the few labels
/// the display cares about get helpers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CameraStatus(String);

impl CameraStatus {
    pub const IDLE: &'static str = "IDLE";
    pub const SAVE: &'static str = "SAVE";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_idle(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::IDLE)
    }

    /// The camera is writing frames to disk.
    pub fn is_saving(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::SAVE)
    }
}

impl From<String> for CameraStatus {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl From<&str> for CameraStatus {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

impl fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device-observed fields of the active camera. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CameraObservation {
    pub status: Option<CameraStatus>,
    pub temperature_c: Option<f64>,
    pub target_temperature_c: Option<f64>,
    pub cooler_on: Option<bool>,
    pub exposure_us: Option<u64>,
    pub gain: Option<i64>,
}

impl CameraObservation {
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

/// Mutable per-unit record owned by the [`Fleet`](crate::Fleet).
///
/// `active_camera` is `Some` only while the unit is reachable and has at
/// least one camera; whenever it is `None` every observed field is unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitRuntimeState {
    pub pingable: bool,
    pub reachable: bool,
    pub cameras: Vec<String>,
    /// Operator's camera choice, applied on the next reconciliation.
    pub selected_camera: usize,
    pub active_camera: Option<usize>,
    pub observed: CameraObservation,
    pub pending_capture_count: CaptureCount,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for UnitRuntimeState {
    fn default() -> Self {
        Self {
            pingable: false,
            reachable: false,
            cameras: Vec::new(),
            selected_camera: 0,
            active_camera: None,
            observed: CameraObservation::default(),
            pending_capture_count: CaptureCount::default(),
            last_updated: None,
        }
    }
}

impl UnitRuntimeState {
    pub fn reachability(&self) -> Reachability {
        reachability::classify(self.pingable, self.reachable)
    }

    /// Identifier of the active camera, if a session is open.
    pub fn active_camera_id(&self) -> Option<&str> {
        self.active_camera
            .and_then(|i| self.cameras.get(i))
            .map(String::as_str)
    }

    /// Reachable with cameras but no open session yet.
    pub fn needs_session(&self) -> bool {
        self.reachable && !self.cameras.is_empty() && self.active_camera.is_none()
    }

    /// Drop the camera session and every device-observed value.
    pub fn clear_observed(&mut self) {
        self.active_camera = None;
        self.observed = CameraObservation::default();
        self.last_updated = None;
    }

    /// Whether the record satisfies the session invariant.
    pub fn is_consistent(&self) -> bool {
        if self.reachable && !self.pingable {
            return false;
        }
        match self.active_camera {
            Some(i) => self.reachable && i < self.cameras.len(),
            None => self.observed.is_unknown(),
        }
    }
}

/// Immutable view of one unit published to display collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSnapshot {
    pub unit: Arc<Unit>,
    pub reachability: Reachability,
    #[serde(flatten)]
    pub state: UnitRuntimeState,
}

impl UnitSnapshot {
    pub fn new(unit: Arc<Unit>, state: UnitRuntimeState) -> Self {
        Self {
            unit,
            reachability: state.reachability(),
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.unit.name
    }
}
