//! Fleet reconciliation layer between `obsfleet-api` and operator surfaces.
//!
//! This crate owns the business logic and domain model for a small fleet of
//! remote camera units:
//!
//! - **[`FleetController`]** -- Central facade. [`load()`](FleetController::load)
//!   probes and reconciles every unit, [`ping_all()`](FleetController::ping_all)
//!   re-probes, [`restart_inactive()`](FleetController::restart_inactive)
//!   recovers units whose control service is down, and
//!   [`execute()`](FleetController::execute) routes operator writes.
//!
//! - **[`Fleet`]** -- One `tokio::sync::Mutex<UnitRuntimeState>` per unit plus a
//!   `watch` snapshot rebuilt after every mutation. Units never block each
//!   other.
//!
//! - **[`Prober`] / [`Reconciler`] / [`RecoveryActuator`]** -- Two-tier
//!   reachability, camera session rebuild, and service restart with a single
//!   re-probe.
//!
//! - **[`FleetPoller`]** -- Background ticker refreshing status and
//!   temperature. At most one pass runs at a time; overlapping passes are
//!   skipped.
//!
//! - **[`Pinger`] / [`RemoteDispatcher`]** -- Seams over the system `ping`
//!   and `ssh` tools.

pub mod command;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod fleet;
pub mod model;
pub mod poller;
pub mod prober;
pub mod reconciler;
pub mod recovery;
pub mod remote;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{Baseline, FleetConfig, RemoteConfig};
pub use controller::{CameraInfo, FleetController, UnitRecovery};
pub use directory::UnitDirectory;
pub use error::CoreError;
pub use fleet::{Fleet, UnitHandle};
pub use poller::{FleetPoller, PassOutcome, PollPhase, PollerState};
pub use prober::Prober;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use recovery::{RecoveryActuator, RecoveryOutcome};
pub use remote::{Pinger, RemoteDispatcher, RemoteOutput, SshDispatcher, SystemPinger};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    CameraObservation, CameraStatus, CaptureCount, CaptureKind, CaptureRequest, Reachability,
    ReachabilityResult, Unit, UnitRuntimeState, UnitSnapshot,
};

// Transport types consumers need without depending on the API crate.
pub use obsfleet_api::{CameraResolution, ImageFormat};
