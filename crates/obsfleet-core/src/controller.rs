// ── Fleet controller ──
//
// Facade over the whole fleet: probing, reconciliation, recovery, polling
// and operator commands. Every action on a unit runs under that unit's own
// lock, so actions on one unit are serialized and units never wait on each
// other.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::join_all;
use obsfleet_api::{CameraClient, CameraResolution, ImageFormat, TransportConfig};
use serde::Serialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::command::{Command, CommandResult};
use crate::config::FleetConfig;
use crate::directory::UnitDirectory;
use crate::error::CoreError;
use crate::fleet::{Fleet, UnitHandle};
use crate::model::{CaptureCount, Unit, UnitRuntimeState, UnitSnapshot};
use crate::poller::{FleetPoller, PassOutcome, PollerState};
use crate::prober::Prober;
use crate::reconciler::{ReconcileOutcome, Reconciler, seconds_to_micros};
use crate::recovery::{RecoveryActuator, RecoveryOutcome};
use crate::remote::{Pinger, RemoteDispatcher, RemoteOutput, SshDispatcher, SystemPinger};

/// Outcome of recovery for one unit in a fleet-wide restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRecovery {
    pub unit: String,
    #[serde(flatten)]
    pub outcome: RecoveryOutcome,
}

/// Static description of the active camera. Each field is read
/// independently and is `None` when the read failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraInfo {
    pub unit: String,
    pub index: usize,
    pub camera: String,
    pub resolution: Option<CameraResolution>,
    pub binning_options: Option<Vec<u32>>,
    pub readout_modes: Option<Vec<String>>,
    pub readout_mode: Option<String>,
    pub offset: Option<i64>,
    pub cooler_power: Option<f64>,
    pub can_set_cooler: Option<bool>,
    pub can_set_temperature: Option<bool>,
    pub can_get_cooler_power: Option<bool>,
}

// ── FleetController ──────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<FleetInner>`.
#[derive(Clone)]
pub struct FleetController {
    inner: Arc<FleetInner>,
}

struct FleetInner {
    config: FleetConfig,
    fleet: Arc<Fleet>,
    prober: Prober,
    reconciler: Reconciler,
    recovery: RecoveryActuator,
    dispatcher: Arc<dyn RemoteDispatcher>,
    poller: Arc<FleetPoller>,
}

impl FleetController {
    /// Build a controller using the system `ping` and `ssh` tools.
    /// Does no I/O; call [`load()`](Self::load) to probe the fleet.
    pub fn new(config: FleetConfig, units: Vec<Unit>) -> Result<Self, CoreError> {
        let dispatcher = Arc::new(SshDispatcher::new(&config.remote));
        Self::with_collaborators(config, units, Arc::new(SystemPinger), dispatcher)
    }

    /// Build a controller with explicit liveness and remote-command seams.
    pub fn with_collaborators(
        config: FleetConfig,
        units: Vec<Unit>,
        pinger: Arc<dyn Pinger>,
        dispatcher: Arc<dyn RemoteDispatcher>,
    ) -> Result<Self, CoreError> {
        let directory = Arc::new(UnitDirectory::new(units)?);
        let http = TransportConfig::with_timeout(config.timeout).build_client()?;
        let fleet = Arc::new(Fleet::new(directory, &http, config.timeout)?);

        let prober = Prober::new(pinger, config.ping_timeout);
        let reconciler = Reconciler::new(config.baseline.clone());
        let recovery = RecoveryActuator::new(
            Arc::clone(&dispatcher),
            config.remote.restart_command.clone(),
            config.settle_delay,
        );
        let poller = Arc::new(FleetPoller::new(Arc::clone(&fleet), config.poll_interval));

        Ok(Self {
            inner: Arc::new(FleetInner {
                config,
                fleet,
                prober,
                reconciler,
                recovery,
                dispatcher,
                poller,
            }),
        })
    }

    pub fn config(&self) -> &FleetConfig {
        &self.inner.config
    }

    pub fn fleet(&self) -> &Arc<Fleet> {
        &self.inner.fleet
    }

    // ── Fleet-wide actions ───────────────────────────────────────

    /// Probe and reconcile every unit concurrently.
    pub async fn load(&self) -> Arc<Vec<UnitSnapshot>> {
        let fleet = &self.inner.fleet;
        let outcomes = join_all(fleet.handles().map(|h| self.probe_unit(h, true))).await;
        let reconciled = outcomes.iter().filter(|o| o.is_reconciled()).count();
        info!(units = outcomes.len(), reconciled, "fleet loaded");
        fleet.snapshot()
    }

    /// Probe every unit. Only units that became reachable without an open
    /// session are reconciled.
    pub async fn ping_all(&self) -> Arc<Vec<UnitSnapshot>> {
        let fleet = &self.inner.fleet;
        join_all(fleet.handles().map(|h| self.probe_unit(h, false))).await;
        fleet.snapshot()
    }

    /// Probe and reconcile a single unit.
    pub async fn load_unit(&self, name: &str) -> Result<ReconcileOutcome, CoreError> {
        let handle = self.inner.fleet.handle(name)?;
        Ok(self.probe_unit(handle, true).await)
    }

    /// Restart the control service on every pingable but unreachable unit.
    pub async fn restart_inactive(&self) -> Vec<UnitRecovery> {
        let fleet = &self.inner.fleet;
        let results = join_all(fleet.handles().map(|h| self.recover_unit(h))).await;
        results.into_iter().flatten().collect()
    }

    // ── Per-unit session control ─────────────────────────────────

    /// Rebuild the camera session of one unit.
    pub async fn reconcile_unit(&self, name: &str) -> Result<ReconcileOutcome, CoreError> {
        let handle = self.inner.fleet.handle(name)?;
        let mut state = handle.lock().await;
        let outcome = self
            .inner
            .reconciler
            .reconcile(handle.unit(), handle.client(), &mut state)
            .await;
        self.inner.fleet.publish(name, &state);
        Ok(outcome)
    }

    /// Switch the unit to another camera and reconcile it.
    pub async fn select_camera(
        &self,
        name: &str,
        index: usize,
    ) -> Result<ReconcileOutcome, CoreError> {
        let handle = self.inner.fleet.handle(name)?;
        let mut state = handle.lock().await;
        if index >= state.cameras.len() {
            return Err(CoreError::CameraOutOfRange {
                name: name.to_owned(),
                index,
                available: state.cameras.len(),
            });
        }
        state.selected_camera = index;
        let outcome = self
            .inner
            .reconciler
            .reconcile(handle.unit(), handle.client(), &mut state)
            .await;
        self.inner.fleet.publish(name, &state);
        Ok(outcome)
    }

    // ── Operator commands ────────────────────────────────────────

    /// Route one operator write to the active camera of `name`.
    ///
    /// Values are validated before any network call; a rejected or failed
    /// write leaves the state untouched.
    pub async fn execute(&self, name: &str, command: Command) -> Result<CommandResult, CoreError> {
        command.validate()?;
        let handle = self.inner.fleet.handle(name)?;
        let mut state = handle.lock().await;

        let session = if command.needs_session() {
            Some(session_camera(handle, &state)?)
        } else {
            None
        };
        debug!(unit = name, ?command, "executing command");
        let result = route_command(session.as_ref(), command, &mut state).await?;
        self.inner.fleet.publish(name, &state);
        Ok(result)
    }

    /// Parse and stage the frame count for the next capture.
    pub async fn set_capture_count(&self, name: &str, text: &str) -> Result<CaptureCount, CoreError> {
        let count: CaptureCount = text.parse()?;
        self.execute(name, Command::SetCaptureCount(count)).await?;
        Ok(count)
    }

    /// Run an arbitrary shell command on the unit.
    pub async fn send_remote_command(
        &self,
        name: &str,
        command: &str,
    ) -> Result<RemoteOutput, CoreError> {
        if command.trim().is_empty() {
            return Err(CoreError::validation("remote command must not be empty"));
        }
        let handle = self.inner.fleet.handle(name)?;
        self.inner.dispatcher.dispatch(handle.unit(), command).await
    }

    /// Download the most recent frame of the active camera.
    pub async fn last_image(&self, name: &str, format: ImageFormat) -> Result<Bytes, CoreError> {
        let handle = self.inner.fleet.handle(name)?;
        let state = handle.lock().await;
        let camera = session_camera(handle, &state)?;
        Ok(camera.get_last_image(format).await?)
    }

    /// Describe the active camera.
    pub async fn camera_info(&self, name: &str) -> Result<CameraInfo, CoreError> {
        let handle = self.inner.fleet.handle(name)?;
        let state = handle.lock().await;
        let camera = session_camera(handle, &state)?;

        let (resolution, binning, modes, mode, offset, power, can_cool, can_temp, can_power) = tokio::join!(
            camera.get_resolution(),
            camera.get_binning_options(),
            camera.get_readout_modes(),
            camera.get_readout_mode(),
            camera.get_offset(),
            camera.get_cooler_power(),
            camera.can_set_cooler_on(),
            camera.can_set_temperature(),
            camera.can_get_cooler_power(),
        );

        Ok(CameraInfo {
            unit: name.to_owned(),
            index: camera.index(),
            camera: state.active_camera_id().unwrap_or_default().to_owned(),
            resolution: resolution.ok(),
            binning_options: binning.ok(),
            readout_modes: modes.ok(),
            readout_mode: mode.ok(),
            offset: offset.ok(),
            cooler_power: power.ok(),
            can_set_cooler: can_cool.ok(),
            can_set_temperature: can_temp.ok(),
            can_get_cooler_power: can_power.ok(),
        })
    }

    // ── Polling ──────────────────────────────────────────────────

    pub fn start_polling(&self) {
        self.inner.poller.start();
    }

    /// Run one refresh pass now.
    pub async fn poll_once(&self) -> PassOutcome {
        self.inner.poller.poll_once().await
    }

    pub fn poller_state(&self) -> PollerState {
        self.inner.poller.state()
    }

    /// Stop background polling and wait for the task to exit.
    pub async fn shutdown(&self) {
        self.inner.poller.shutdown().await;
    }

    // ── Read accessors ───────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<Vec<UnitSnapshot>> {
        self.inner.fleet.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<UnitSnapshot>>> {
        self.inner.fleet.subscribe()
    }

    pub fn unit(&self, name: &str) -> Result<UnitSnapshot, CoreError> {
        self.inner.fleet.unit_snapshot(name)
    }

    // ── Private helpers ──────────────────────────────────────────

    async fn probe_unit(&self, handle: &UnitHandle, always_reconcile: bool) -> ReconcileOutcome {
        let inner = &self.inner;
        let mut state = handle.lock().await;

        let result = inner.prober.probe(handle.unit(), handle.client()).await;
        Prober::apply(result, &mut state);

        let outcome = if always_reconcile || state.needs_session() {
            inner
                .reconciler
                .reconcile(handle.unit(), handle.client(), &mut state)
                .await
        } else {
            ReconcileOutcome::Skipped
        };

        inner.fleet.publish(handle.name(), &state);
        outcome
    }

    async fn recover_unit(&self, handle: &UnitHandle) -> Option<UnitRecovery> {
        let inner = &self.inner;
        let mut state = handle.lock().await;
        if !state.pingable || state.reachable {
            return None;
        }

        let outcome = match inner
            .recovery
            .recover(
                handle.unit(),
                handle.client(),
                &inner.prober,
                &inner.reconciler,
                &mut state,
            )
            .await
        {
            Ok(true) => RecoveryOutcome::Recovered,
            Ok(false) => RecoveryOutcome::Failed,
            Err(e) => RecoveryOutcome::DispatchFailed(e.to_string()),
        };

        inner.fleet.publish(handle.name(), &state);
        Some(UnitRecovery {
            unit: handle.name().to_owned(),
            outcome,
        })
    }
}

/// Client for the active camera, or `UnitUnavailable`.
fn session_camera(handle: &UnitHandle, state: &UnitRuntimeState) -> Result<CameraClient, CoreError> {
    let unavailable = |reason: &str| CoreError::UnitUnavailable {
        name: handle.name().to_owned(),
        reason: reason.to_owned(),
    };
    if !state.reachable {
        return Err(unavailable("control service is not reachable"));
    }
    let index = state
        .active_camera
        .ok_or_else(|| unavailable("no active camera session"))?;
    Ok(handle.client().camera(index))
}

// ── Command routing ──────────────────────────────────────────────

/// Send one validated command. Writes with a read-back store the value read
/// back; a failed read-back leaves that field unknown.
/// `session` is the active camera, resolved by the caller for every command
/// that [`needs_session`](Command::needs_session).
async fn route_command(
    session: Option<&CameraClient>,
    command: Command,
    state: &mut UnitRuntimeState,
) -> Result<CommandResult, CoreError> {
    let device =
        || session.ok_or_else(|| CoreError::Internal("command needs a camera session".into()));
    let observed = &mut state.observed;

    match command {
        Command::SetExposure { secs } => {
            let camera = device()?;
            camera.set_exposure(secs).await?;
            observed.exposure_us = camera.get_exposure().await.ok().and_then(seconds_to_micros);
            Ok(CommandResult::Value(json!(observed.exposure_us)))
        }
        Command::SetGain { gain } => {
            let camera = device()?;
            camera.set_gain(gain).await?;
            observed.gain = camera.get_gain().await.ok();
            Ok(CommandResult::Value(json!(observed.gain)))
        }
        Command::SetCooler { on } => {
            let camera = device()?;
            camera.set_cooler_on(on).await?;
            observed.cooler_on = camera.get_cooler_on().await.ok();
            Ok(CommandResult::Value(json!(observed.cooler_on)))
        }
        Command::SetTargetTemperature { celsius } => {
            let camera = device()?;
            camera.set_target_temperature(celsius).await?;
            observed.target_temperature_c = camera.get_target_temperature().await.ok();
            Ok(CommandResult::Value(json!(observed.target_temperature_c)))
        }
        Command::SetOffset { offset } => {
            let camera = device()?;
            camera.set_offset(offset).await?;
            Ok(CommandResult::Ok)
        }
        Command::SetBinning { factor } => {
            let camera = device()?;
            camera.set_binning(factor).await?;
            Ok(CommandResult::Ok)
        }
        Command::SetReadoutMode { mode } => {
            let camera = device()?;
            camera.set_readout_mode(&mode).await?;
            Ok(CommandResult::Ok)
        }
        Command::StartSaving(request) => {
            let camera = device()?;
            camera.start_saving(&request.to_wire()).await?;
            state.pending_capture_count = request.count;
            Ok(CommandResult::Ok)
        }
        Command::StopSaving => {
            let camera = device()?;
            camera.stop_saving().await?;
            Ok(CommandResult::Ok)
        }
        Command::StartCapturing => {
            let camera = device()?;
            camera.start_capturing().await?;
            Ok(CommandResult::Ok)
        }
        Command::StopCapturing => {
            let camera = device()?;
            camera.stop_capturing().await?;
            Ok(CommandResult::Ok)
        }
        Command::MoveFocuser { position } => {
            let camera = device()?;
            camera.move_focuser(position).await?;
            Ok(CommandResult::Ok)
        }
        Command::ConnectFocuser => {
            let camera = device()?;
            camera.connect_focuser().await?;
            Ok(CommandResult::Ok)
        }
        Command::SetCaptureCount(count) => {
            state.pending_capture_count = count;
            Ok(CommandResult::Ok)
        }
    }
}
