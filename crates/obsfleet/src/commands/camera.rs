//! Per-unit camera handlers: writes, capture, camera info, last image.
//!
//! Every handler first probes and reconciles the target unit so the
//! one-shot process has an open camera session to route to.

use serde::Serialize;

use obsfleet_core::{
    CameraInfo, CaptureKind, CaptureRequest, Command as CoreCommand, CommandResult,
    FleetController, ImageFormat, ReconcileOutcome, UnitSnapshot,
};

use crate::cli::{CameraArgs, CaptureArgs, GlobalOpts, LastImageArgs};
use crate::error::CliError;
use crate::output;

use super::fleet::{format_exposure, local_time, on_off};

/// Result of one operator write, as printed.
#[derive(Debug, Serialize)]
struct WriteReport {
    unit: String,
    action: String,
    /// Value read back from the device, when the command reads one back.
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
}

fn action_label(command: &CoreCommand) -> String {
    match command {
        CoreCommand::SetExposure { secs } => format!("exposure {secs}s"),
        CoreCommand::SetGain { gain } => format!("gain {gain}"),
        CoreCommand::SetOffset { offset } => format!("offset {offset}"),
        CoreCommand::SetCooler { on } => format!("cooler {}", on_off(*on)),
        CoreCommand::SetTargetTemperature { celsius } => format!("target temperature {celsius} °C"),
        CoreCommand::SetBinning { factor } => format!("binning {factor}"),
        CoreCommand::SetReadoutMode { mode } => format!("readout mode {mode}"),
        CoreCommand::StartSaving(request) => format!(
            "saving {} frames to {}/{}",
            request.count, request.dir_name, request.prefix
        ),
        CoreCommand::StopSaving => "stop saving".into(),
        CoreCommand::StartCapturing => "start capturing".into(),
        CoreCommand::StopCapturing => "stop capturing".into(),
        CoreCommand::MoveFocuser { position } => format!("focuser to {position}"),
        CoreCommand::ConnectFocuser => "connect focuser".into(),
        CoreCommand::SetCaptureCount(count) => format!("capture count {count}"),
    }
}

/// Human form of a read-back value for the command that produced it.
fn describe_value(command: &CoreCommand, value: &serde_json::Value) -> String {
    match (command, value) {
        (_, serde_json::Value::Null) => "unknown (read-back failed)".into(),
        (CoreCommand::SetExposure { .. }, v) => v.as_u64().map_or_else(|| v.to_string(), format_exposure),
        (CoreCommand::SetCooler { .. }, serde_json::Value::Bool(on)) => on_off(*on).into(),
        (_, v) => v.to_string(),
    }
}

/// Probe and reconcile `unit`. Returns the session outcome.
async fn open_session(controller: &FleetController, unit: &str) -> Result<ReconcileOutcome, CliError> {
    let outcome = controller.load_unit(unit).await?;
    tracing::debug!(unit, ?outcome, "session prepared");
    Ok(outcome)
}

// ── Handlers ────────────────────────────────────────────────────────

/// Validate, open a session, and route one write to the active camera.
pub async fn write(
    controller: &FleetController,
    unit: &str,
    command: CoreCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    command.validate()?;
    controller.unit(unit)?;
    open_session(controller, unit).await?;

    let action = action_label(&command);
    let result = controller.execute(unit, command.clone()).await?;
    let value = match result {
        CommandResult::Ok => None,
        CommandResult::Value(v) => Some(v),
    };
    let report = WriteReport {
        unit: unit.to_owned(),
        action,
        value,
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| {
            let mut line = format!("{}: {}", r.unit, output::outcome_mark(true, &r.action, color));
            if let Some(v) = &r.value {
                line.push_str(&format!(" (now {})", describe_value(&command, v)));
            }
            line
        },
        |r| r.value.as_ref().map_or_else(|| "ok".into(), ToString::to_string),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Stage the frame count, then start saving.
pub async fn capture(
    controller: &FleetController,
    args: CaptureArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let unit = args.unit.as_str();
    let kind = CaptureKind::from(args.kind);

    let count = match args.count.as_deref() {
        Some(text) => controller.set_capture_count(unit, text).await?,
        None => controller.unit(unit)?.state.pending_capture_count,
    };
    let prefix = args.prefix.unwrap_or_else(|| format!("{kind}_{unit}"));
    let request = match args.dir {
        Some(dir) => CaptureRequest::new(count, dir, prefix)?,
        None => CaptureRequest::for_kind(count, kind, prefix)?,
    };

    write(controller, unit, CoreCommand::StartSaving(request), global).await
}

/// Re-probe and reconcile one unit, then show it.
pub async fn reconcile(
    controller: &FleetController,
    unit: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    controller.unit(unit)?;
    let outcome = open_session(controller, unit).await?;
    let snapshot = controller.unit(unit)?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &snapshot,
        |s| {
            let summary = match outcome {
                ReconcileOutcome::Skipped => output::outcome_mark(false, "skipped", color),
                ReconcileOutcome::InitFailed => output::outcome_mark(false, "camera init failed", color),
                ReconcileOutcome::Reconciled { failed_reads: 0 } => {
                    output::outcome_mark(true, "reconciled", color)
                }
                ReconcileOutcome::Reconciled { failed_reads } => output::outcome_mark(
                    true,
                    &format!("reconciled, {failed_reads} fields unknown"),
                    color,
                ),
            };
            format!("{}\n{summary}", unit_detail(s, color))
        },
        |s| s.reachability.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Describe the active camera, optionally switching camera first.
pub async fn camera(
    controller: &FleetController,
    args: CameraArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let unit = args.unit.as_str();
    controller.unit(unit)?;
    open_session(controller, unit).await?;

    if let Some(index) = args.select {
        let outcome = controller.select_camera(unit, index).await?;
        if !outcome.is_reconciled() {
            return Err(CliError::UnitUnavailable {
                name: unit.to_owned(),
                reason: format!("camera {index} did not initialize"),
            });
        }
    }

    let info = controller.camera_info(unit).await?;
    let out = output::render_single(global.output, &info, camera_detail, |i| i.camera.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Download the most recent frame to `--out`.
pub async fn last_image(
    controller: &FleetController,
    args: LastImageArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let unit = args.unit.as_str();
    controller.unit(unit)?;
    open_session(controller, unit).await?;

    let format = if args.jpg { ImageFormat::Jpg } else { ImageFormat::Raw };
    let bytes = controller.last_image(unit, format).await?;
    tokio::fs::write(&args.out, &bytes).await?;

    super::util::note(
        global,
        &format!("Wrote {} bytes ({format}) to {}", bytes.len(), args.out.display()),
    );
    Ok(())
}

// ── Detail views ────────────────────────────────────────────────────

fn unit_detail(snap: &UnitSnapshot, color: bool) -> String {
    let state = &snap.state;
    let observed = &state.observed;
    let cameras = if state.cameras.is_empty() {
        "-".to_owned()
    } else {
        state.cameras.join(", ")
    };
    output::detail_lines(&[
        ("Unit", snap.name().to_owned()),
        ("Address", format!("{}:{}", snap.unit.host, snap.unit.port)),
        ("State", output::reachability_label(snap.reachability, color)),
        ("Cameras", cameras),
        ("Active", output::or_dash(state.active_camera_id())),
        ("Status", output::or_dash(observed.status.as_ref())),
        ("Temperature", output::or_dash(observed.temperature_c.map(|t| format!("{t:.1} °C")))),
        (
            "Target",
            output::or_dash(observed.target_temperature_c.map(|t| format!("{t:.1} °C"))),
        ),
        ("Cooler", output::or_dash(observed.cooler_on.map(on_off))),
        ("Exposure", output::or_dash(observed.exposure_us.map(format_exposure))),
        ("Gain", output::or_dash(observed.gain)),
        ("Updated", output::or_dash(state.last_updated.map(local_time))),
    ])
}

fn camera_detail(info: &CameraInfo) -> String {
    let yes_no = |flag: Option<bool>| output::or_dash(flag.map(|b| if b { "yes" } else { "no" }));
    output::detail_lines(&[
        ("Unit", info.unit.clone()),
        ("Camera", format!("{} (#{})", info.camera, info.index)),
        (
            "Resolution",
            output::or_dash(info.resolution.as_ref().map(|r| format!("{}x{}", r.width, r.height))),
        ),
        (
            "Binning",
            output::or_dash(info.binning_options.as_ref().map(|b| {
                b.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            })),
        ),
        ("Readout mode", output::or_dash(info.readout_mode.as_deref())),
        (
            "Readout modes",
            output::or_dash(info.readout_modes.as_ref().map(|m| m.join(", "))),
        ),
        ("Offset", output::or_dash(info.offset)),
        ("Cooler power", output::or_dash(info.cooler_power.map(|p| format!("{p:.0}%")))),
        ("Can set cooler", yes_no(info.can_set_cooler)),
        ("Can set temp", yes_no(info.can_set_temperature)),
        ("Can read power", yes_no(info.can_get_cooler_power)),
    ])
}
