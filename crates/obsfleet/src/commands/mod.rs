//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod camera;
pub mod config_cmd;
pub mod exec;
pub mod fleet;
pub mod util;

use obsfleet_core::{Command as CoreCommand, FleetController};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a fleet-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &FleetController,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => fleet::status(controller, global).await,
        Command::Ping => fleet::ping(controller, global).await,
        Command::RestartInactive => fleet::restart_inactive(controller, global).await,
        Command::Watch(_) => fleet::watch(controller, global).await,

        Command::Reconcile(args) => camera::reconcile(controller, &args.unit, global).await,
        Command::Capture(args) => camera::capture(controller, args, global).await,
        Command::Camera(args) => camera::camera(controller, args, global).await,
        Command::LastImage(args) => camera::last_image(controller, args, global).await,

        Command::StopSaving(args) => {
            camera::write(controller, &args.unit, CoreCommand::StopSaving, global).await
        }
        Command::Capturing { unit, state } => {
            let command = if state.is_on() {
                CoreCommand::StartCapturing
            } else {
                CoreCommand::StopCapturing
            };
            camera::write(controller, &unit, command, global).await
        }
        Command::Exposure { unit, seconds } => {
            camera::write(controller, &unit, CoreCommand::SetExposure { secs: seconds }, global).await
        }
        Command::Gain { unit, value } => {
            camera::write(controller, &unit, CoreCommand::SetGain { gain: value }, global).await
        }
        Command::Offset { unit, value } => {
            camera::write(controller, &unit, CoreCommand::SetOffset { offset: value }, global).await
        }
        Command::Cooler { unit, state } => {
            let command = CoreCommand::SetCooler { on: state.is_on() };
            camera::write(controller, &unit, command, global).await
        }
        Command::SetTemp { unit, celsius } => {
            let command = CoreCommand::SetTargetTemperature { celsius };
            camera::write(controller, &unit, command, global).await
        }
        Command::Binning { unit, factor } => {
            camera::write(controller, &unit, CoreCommand::SetBinning { factor }, global).await
        }
        Command::ReadoutMode { unit, mode } => {
            camera::write(controller, &unit, CoreCommand::SetReadoutMode { mode }, global).await
        }
        Command::Focuser(args) => {
            let command = match args.position {
                Some(position) if !args.connect => CoreCommand::MoveFocuser { position },
                _ => CoreCommand::ConnectFocuser,
            };
            camera::write(controller, &args.unit, command, global).await
        }

        Command::Exec(args) => exec::handle(controller, args, global).await,

        // Units, Config and Completions are handled before dispatch
        Command::Units | Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not drive the fleet".into(),
        )),
    }
}
