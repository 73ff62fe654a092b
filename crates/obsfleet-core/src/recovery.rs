// ── Recovery actuator ──
//
// Restarts the control service of a unit that answers ping but not HTTP,
// then re-probes exactly once after a settle delay.

use std::sync::Arc;
use std::time::Duration;

use obsfleet_api::UnitClient;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{Unit, UnitRuntimeState};
use crate::prober::Prober;
use crate::reconciler::Reconciler;
use crate::remote::RemoteDispatcher;

/// Per-unit result of a fleet-wide restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// The service came back and the session was reconciled.
    Recovered,
    /// The restart was dispatched but the unit still does not answer.
    Failed,
    /// The restart command could not be delivered.
    DispatchFailed(String),
}

pub struct RecoveryActuator {
    dispatcher: Arc<dyn RemoteDispatcher>,
    restart_command: String,
    settle_delay: Duration,
}

impl RecoveryActuator {
    pub fn new(
        dispatcher: Arc<dyn RemoteDispatcher>,
        restart_command: impl Into<String>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            dispatcher,
            restart_command: restart_command.into(),
            settle_delay,
        }
    }

    /// Restart the control service of `unit` and re-probe it once.
    ///
    /// Only acts on a pingable but unreachable unit; for any other unit it
    /// returns the current `reachable` without dispatching. A dispatch failure
    /// leaves `state` untouched.
    pub async fn recover(
        &self,
        unit: &Unit,
        client: &UnitClient,
        prober: &Prober,
        reconciler: &Reconciler,
        state: &mut UnitRuntimeState,
    ) -> Result<bool, CoreError> {
        if !state.pingable || state.reachable {
            return Ok(state.reachable);
        }

        info!(unit = %unit.name, command = %self.restart_command, "restarting control service");
        self.dispatcher
            .dispatch(unit, &self.restart_command)
            .await?;

        tokio::time::sleep(self.settle_delay).await;

        let result = prober.probe(unit, client).await;
        Prober::apply(result, state);

        if state.reachable {
            reconciler.reconcile(unit, client, state).await;
            info!(unit = %unit.name, "control service recovered");
            Ok(true)
        } else {
            warn!(unit = %unit.name, "recovery failed, unit still unreachable");
            Ok(false)
        }
    }
}
