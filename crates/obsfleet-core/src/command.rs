// ── Command API ──
//
// All operator writes against a unit flow through a unified `Command` enum.
// The controller validates each one, then routes it to the active camera.

use crate::error::CoreError;
use crate::model::{CaptureCount, CaptureRequest};

/// All possible write operations against one unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Exposure ─────────────────────────────────────────────────────
    SetExposure { secs: f64 },
    SetGain { gain: i64 },
    SetOffset { offset: i64 },

    // ── Cooling ──────────────────────────────────────────────────────
    SetCooler { on: bool },
    SetTargetTemperature { celsius: f64 },

    // ── Readout ──────────────────────────────────────────────────────
    SetBinning { factor: u32 },
    SetReadoutMode { mode: String },

    // ── Capture ──────────────────────────────────────────────────────
    StartSaving(CaptureRequest),
    StopSaving,
    StartCapturing,
    StopCapturing,

    // ── Focuser ──────────────────────────────────────────────────────
    MoveFocuser { position: i64 },
    ConnectFocuser,

    // ── Local only ───────────────────────────────────────────────────
    /// Stage the frame count used by the next capture. No device call.
    SetCaptureCount(CaptureCount),
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Ok,
    /// Value read back from the device after the write; `null` if the
    /// read-back failed.
    Value(serde_json::Value),
}

impl Command {
    /// Whether the command needs a reachable unit with an open session.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Self::SetCaptureCount(_))
    }

    /// Reject values the device must never see.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SetExposure { secs } if !secs.is_finite() || *secs < 0.0 => Err(
                CoreError::validation(format!("exposure must be a non-negative number of seconds, got {secs}")),
            ),
            Self::SetTargetTemperature { celsius } if !celsius.is_finite() => Err(
                CoreError::validation(format!("target temperature must be finite, got {celsius}")),
            ),
            Self::SetBinning { factor: 0 } => {
                Err(CoreError::validation("binning factor must be at least 1"))
            }
            Self::SetReadoutMode { mode } if mode.trim().is_empty() => {
                Err(CoreError::validation("readout mode must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_values_before_any_call() {
        assert!(Command::SetExposure { secs: -0.5 }.validate().is_err());
        assert!(Command::SetExposure { secs: f64::NAN }.validate().is_err());
        assert!(Command::SetTargetTemperature { celsius: f64::INFINITY }.validate().is_err());
        assert!(Command::SetBinning { factor: 0 }.validate().is_err());
        assert!(Command::SetReadoutMode { mode: "  ".into() }.validate().is_err());
    }

    #[test]
    fn accepts_ordinary_values() {
        assert!(Command::SetExposure { secs: 0.0 }.validate().is_ok());
        assert!(Command::SetTargetTemperature { celsius: -15.0 }.validate().is_ok());
        assert!(Command::SetBinning { factor: 2 }.validate().is_ok());
        assert!(Command::SetGain { gain: -1 }.validate().is_ok());
    }

    #[test]
    fn capture_count_is_local() {
        assert!(!Command::SetCaptureCount(CaptureCount::default()).needs_session());
        assert!(Command::StopSaving.needs_session());
    }
}
