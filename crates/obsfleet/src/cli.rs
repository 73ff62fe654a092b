//! Clap derive structures for the `obsfleet` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use obsfleet_core::CaptureKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// obsfleet -- control a fleet of remote camera units
#[derive(Debug, Parser)]
#[command(
    name = "obsfleet",
    version,
    about = "Control a fleet of remote camera units",
    long_about = "Operator control surface for remote astronomical camera units.\n\n\
        Probes every configured unit, opens a camera session on the reachable ones,\n\
        restarts control services that stopped answering and routes exposure,\n\
        cooling and capture commands to the active camera.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "OBSFLEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "OBSFLEET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// HTTP request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Frame type of a capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FrameKind {
    Light,
    Flat,
    Dark,
    Bias,
}

impl From<FrameKind> for CaptureKind {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::Light => Self::Light,
            FrameKind::Flat => Self::Flat,
            FrameKind::Dark => Self::Dark,
            FrameKind::Bias => Self::Bias,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List configured units
    Units,

    /// Probe and reconcile every unit, then show the fleet
    #[command(alias = "st")]
    Status,

    /// Re-probe every unit without resetting open sessions
    Ping,

    /// Restart the control service on units that answer ping but not HTTP
    RestartInactive,

    /// Keep refreshing status and temperature until interrupted
    Watch(WatchArgs),

    /// Rebuild the camera session of one unit
    Reconcile(UnitArg),

    /// Start saving frames on a unit
    Capture(CaptureArgs),

    /// Stop saving frames on a unit
    StopSaving(UnitArg),

    /// Start or stop continuous exposures without saving
    Capturing {
        unit: String,
        state: Switch,
    },

    /// Set the exposure time in seconds
    Exposure {
        unit: String,
        seconds: f64,
    },

    /// Set the sensor gain
    Gain {
        unit: String,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Set the sensor offset
    Offset {
        unit: String,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Switch the cooler on or off
    Cooler {
        unit: String,
        state: Switch,
    },

    /// Set the cooler target temperature in degrees Celsius
    SetTemp {
        unit: String,
        #[arg(allow_negative_numbers = true)]
        celsius: f64,
    },

    /// Set the binning factor
    Binning {
        unit: String,
        factor: u32,
    },

    /// Set the readout mode
    ReadoutMode {
        unit: String,
        mode: String,
    },

    /// Move or connect the focuser
    Focuser(FocuserArgs),

    /// Describe the active camera, or switch to another one
    Camera(CameraArgs),

    /// Download the most recent frame
    LastImage(LastImageArgs),

    /// Run a shell command on a unit over ssh
    Exec(ExecArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-command arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UnitArg {
    /// Unit name
    pub unit: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval (e.g. "2s", "1m"); defaults to the configured one
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<std::time::Duration>,
}

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Unit name
    pub unit: String,

    /// Number of frames (1-10000)
    #[arg(long, short = 'n')]
    pub count: Option<String>,

    /// Frame type; also the default destination
    #[arg(long, short = 'k', default_value = "light")]
    pub kind: FrameKind,

    /// Destination directory label on the unit
    #[arg(long, short = 'd')]
    pub dir: Option<String>,

    /// File name prefix (defaults to "<kind>_<unit>")
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,
}

#[derive(Debug, Args)]
pub struct FocuserArgs {
    /// Unit name
    pub unit: String,

    /// Target position
    #[arg(allow_negative_numbers = true, required_unless_present = "connect")]
    pub position: Option<i64>,

    /// Connect the focuser instead of moving it
    #[arg(long, conflicts_with = "position")]
    pub connect: bool,
}

#[derive(Debug, Args)]
pub struct CameraArgs {
    /// Unit name
    pub unit: String,

    /// Switch to the camera at this index and reconcile
    #[arg(long, short = 's')]
    pub select: Option<usize>,
}

#[derive(Debug, Args)]
pub struct LastImageArgs {
    /// Unit name
    pub unit: String,

    /// File to write the image to
    #[arg(long)]
    pub out: PathBuf,

    /// Fetch a JPEG preview instead of raw data
    #[arg(long)]
    pub jpg: bool,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Unit name
    pub unit: String,

    /// Command and arguments, passed to the remote shell
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

// ── Config & Completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
