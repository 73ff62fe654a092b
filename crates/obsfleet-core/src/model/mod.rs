// ── Domain model ──
//
// Canonical types shared by every fleet component. Wire-level types live in
// `obsfleet-api`; these are what the CLI and any other display collaborator
// see.

mod capture;
mod reachability;
mod state;
mod unit;

pub use capture::{CaptureCount, CaptureKind, CaptureRequest};
pub use reachability::{Reachability, ReachabilityResult};
pub use state::{CameraObservation, CameraStatus, UnitRuntimeState, UnitSnapshot};
pub use unit::{DEFAULT_PORT, Unit};
