//! Fleet-wide command handlers: units, status, ping, restart-inactive, watch.

use chrono::{DateTime, Local, Utc};
use tabled::Tabled;
use tokio::time::MissedTickBehavior;

use obsfleet_config::Config;
use obsfleet_core::{FleetController, Reachability, RecoveryOutcome, UnitRecovery, UnitSnapshot};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConfiguredUnitRow {
    #[tabled(rename = "Unit")]
    name: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Port")]
    port: u16,
}

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "Unit")]
    name: String,
    #[tabled(rename = "State")]
    reachability: String,
    #[tabled(rename = "Camera")]
    camera: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Temp °C")]
    temperature: String,
    #[tabled(rename = "Target °C")]
    target: String,
    #[tabled(rename = "Cooler")]
    cooler: String,
    #[tabled(rename = "Exposure")]
    exposure: String,
    #[tabled(rename = "Gain")]
    gain: String,
    #[tabled(rename = "Frames")]
    frames: u32,
    #[tabled(rename = "Updated")]
    updated: String,
}

#[derive(Tabled)]
struct RecoveryRow {
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn unit_row(snap: &UnitSnapshot) -> UnitRow {
    let state = &snap.state;
    let observed = &state.observed;
    UnitRow {
        name: snap.name().to_owned(),
        reachability: snap.reachability.to_string(),
        camera: state.active_camera_id().unwrap_or("-").to_owned(),
        status: output::or_dash(observed.status.as_ref()),
        temperature: output::or_dash(observed.temperature_c.map(|t| format!("{t:.1}"))),
        target: output::or_dash(observed.target_temperature_c.map(|t| format!("{t:.1}"))),
        cooler: output::or_dash(observed.cooler_on.map(on_off)),
        exposure: output::or_dash(observed.exposure_us.map(format_exposure)),
        gain: output::or_dash(observed.gain),
        frames: state.pending_capture_count.get(),
        updated: output::or_dash(state.last_updated.map(local_time)),
    }
}

fn outcome_label(outcome: &RecoveryOutcome) -> &'static str {
    match outcome {
        RecoveryOutcome::Recovered => "recovered",
        RecoveryOutcome::Failed => "failed",
        RecoveryOutcome::DispatchFailed(_) => "dispatch_failed",
    }
}

fn recovery_row(recovery: &UnitRecovery) -> RecoveryRow {
    let detail = match &recovery.outcome {
        RecoveryOutcome::Recovered => String::new(),
        RecoveryOutcome::Failed => "still not answering".to_owned(),
        RecoveryOutcome::DispatchFailed(reason) => reason.clone(),
    };
    RecoveryRow {
        unit: recovery.unit.clone(),
        outcome: outcome_label(&recovery.outcome).to_owned(),
        detail,
    }
}

// ── Formatting helpers ──────────────────────────────────────────────

pub(super) fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Microseconds as seconds, without float rounding noise.
pub(super) fn format_exposure(us: u64) -> String {
    let secs = us / 1_000_000;
    let frac = us % 1_000_000;
    if frac == 0 {
        format!("{secs}s")
    } else {
        let digits = format!("{frac:06}");
        format!("{secs}.{}s", digits.trim_end_matches('0'))
    }
}

pub(super) fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

pub(super) fn render_fleet(snapshot: &[UnitSnapshot], global: &GlobalOpts) -> Result<String, CliError> {
    let table = output::render_list(global.output, snapshot, unit_row, |s| {
        format!("{}\t{}", s.name(), s.reachability)
    })?;
    if global.output != OutputFormat::Table {
        return Ok(table);
    }
    Ok(format!("{table}\n{}", summary(snapshot, output::should_color(global.color))))
}

fn summary(snapshot: &[UnitSnapshot], color: bool) -> String {
    let count = |r: Reachability| snapshot.iter().filter(|s| s.reachability == r).count();
    [
        Reachability::Reachable,
        Reachability::ApplicationUnreachable,
        Reachability::NetworkUnreachable,
    ]
    .into_iter()
    .map(|r| format!("{} {}", count(r), output::reachability_label(r, color)))
    .collect::<Vec<_>>()
    .join(", ")
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn units(config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let units = util::require_units(config, global)?;
    let out = output::render_list(
        global.output,
        &units,
        |u| ConfiguredUnitRow {
            name: u.name.clone(),
            host: u.host.clone(),
            port: u.port,
        },
        |u| u.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn status(controller: &FleetController, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = util::spinner("Probing and reconciling units", global);
    let snapshot = controller.load().await;
    spinner.finish_and_clear();

    output::print_output(&render_fleet(&snapshot, global)?, global.quiet);
    Ok(())
}

pub async fn ping(controller: &FleetController, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = util::spinner("Pinging units", global);
    let snapshot = controller.ping_all().await;
    spinner.finish_and_clear();

    output::print_output(&render_fleet(&snapshot, global)?, global.quiet);
    Ok(())
}

pub async fn restart_inactive(
    controller: &FleetController,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = util::spinner("Pinging units", global);
    let snapshot = controller.ping_all().await;
    spinner.finish_and_clear();

    let inactive: Vec<&str> = snapshot
        .iter()
        .filter(|s| s.reachability == Reachability::ApplicationUnreachable)
        .map(UnitSnapshot::name)
        .collect();
    if inactive.is_empty() {
        util::note(global, "No inactive units");
        return Ok(());
    }

    let prompt = format!("Restart the control service on {}?", inactive.join(", "));
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }

    let spinner = util::spinner("Restarting control services", global);
    let results = controller.restart_inactive().await;
    spinner.finish_and_clear();

    let out = output::render_list(global.output, &results, recovery_row, |r| {
        format!("{}\t{}", r.unit, outcome_label(&r.outcome))
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Reprint the fleet every poll interval until Ctrl-C.
pub async fn watch(controller: &FleetController, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = util::spinner("Probing and reconciling units", global);
    controller.load().await;
    spinner.finish_and_clear();
    controller.start_polling();

    let mut ticker = tokio::time::interval(controller.config().poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let snapshot = controller.snapshot();
                if global.output == OutputFormat::Table && !global.quiet {
                    println!("── {} ──", Local::now().format("%H:%M:%S"));
                }
                output::print_output(&render_fleet(&snapshot, global)?, global.quiet);
            }
        }
    }

    util::note(global, "Stopped");
    Ok(())
}
