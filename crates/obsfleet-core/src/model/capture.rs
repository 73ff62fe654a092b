use std::fmt;
use std::str::FromStr;

use obsfleet_api::StartSaving;
use serde::Serialize;

use crate::error::CoreError;

/// Number of frames to save in one capture run, `1..=10000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CaptureCount(u32);

impl CaptureCount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 10_000;

    pub fn new(count: u32) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&count) {
            Ok(Self(count))
        } else {
            Err(CoreError::validation(format!(
                "capture count must be between {} and {}, got {count}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for CaptureCount {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for CaptureCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CaptureCount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count: u32 = s
            .trim()
            .parse()
            .map_err(|_| CoreError::validation(format!("capture count must be a number, got '{s}'")))?;
        Self::new(count)
    }
}

/// Frame type of a capture run. Doubles as the default destination label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CaptureKind {
    #[default]
    Light,
    Flat,
    Dark,
    Bias,
}

/// A validated request to save frames on a unit's active camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureRequest {
    pub count: CaptureCount,
    pub dir_name: String,
    pub prefix: String,
}

impl CaptureRequest {
    pub fn new(
        count: CaptureCount,
        dir_name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let dir_name = dir_name.into();
        let prefix = prefix.into();

        if dir_name.trim().is_empty() {
            return Err(CoreError::validation("destination must not be empty"));
        }
        check_label("destination", &dir_name)?;
        check_label("prefix", &prefix)?;

        Ok(Self {
            count,
            dir_name,
            prefix,
        })
    }

    /// Request saving into the directory named after `kind`.
    pub fn for_kind(
        count: CaptureCount,
        kind: CaptureKind,
        prefix: impl Into<String>,
    ) -> Result<Self, CoreError> {
        Self::new(count, kind.to_string(), prefix)
    }

    pub(crate) fn to_wire(&self) -> StartSaving {
        StartSaving {
            number: self.count.get(),
            dir_name: self.dir_name.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

/// Labels become path components on the unit.
fn check_label(field: &str, value: &str) -> Result<(), CoreError> {
    if value.contains(['/', '\\']) || value.contains("..") {
        return Err(CoreError::validation(format!(
            "{field} must not contain path separators or '..', got '{value}'"
        )));
    }
    Ok(())
}
