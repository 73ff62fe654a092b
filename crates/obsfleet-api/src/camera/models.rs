// Wire types for the per-camera endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// The `{ "value": ... }` envelope every read is wrapped in.
#[derive(Debug, Deserialize)]
pub struct ValueResponse<T> {
    pub value: T,
}

/// Body of a plain set call. The unit expects the value as text.
#[derive(Debug, Serialize)]
pub struct SetValue {
    pub value: String,
}

/// Body of `start_saving`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSaving {
    pub number: u32,
    pub dir_name: String,
    pub prefix: String,
}

/// Sensor dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraResolution {
    pub width: u32,
    pub height: u32,
}

/// Encoding requested from `get_last_image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Raw,
}

/// Render a value the way the unit's set endpoints parse it.
///
/// Booleans are capitalised (`True` / `False`), everything else is its
/// plain textual form.
pub trait WireValue {
    fn to_wire(&self) -> String;
}

impl WireValue for bool {
    fn to_wire(&self) -> String {
        if *self { "True".into() } else { "False".into() }
    }
}

macro_rules! wire_display {
    ($($t:ty),*) => {
        $(impl WireValue for $t {
            fn to_wire(&self) -> String {
                self.to_string()
            }
        })*
    };
}

wire_display!(i32, i64, u32, u64, f64, str, String);

impl<T: WireValue + ?Sized> WireValue for &T {
    fn to_wire(&self) -> String {
        (**self).to_wire()
    }
}

// ── Lenient value decoding ──────────────────────────────────────────
//
// Firmware versions disagree on whether numbers come back as JSON numbers
// or as strings, so reads accept both.

fn mismatch(expected: &str, value: &Value) -> Error {
    Error::Deserialization {
        message: format!("expected {expected}"),
        body: value.to_string(),
    }
}

pub(crate) fn as_f64(value: &Value) -> Result<f64, Error> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch("a number", value)),
        Value::String(s) => s.trim().parse().map_err(|_| mismatch("a number", value)),
        _ => Err(mismatch("a number", value)),
    }
}

pub(crate) fn as_i64(value: &Value) -> Result<i64, Error> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral_f64_to_i64))
            .ok_or_else(|| mismatch("an integer", value)),
        Value::String(s) => s.trim().parse().map_err(|_| mismatch("an integer", value)),
        _ => Err(mismatch("an integer", value)),
    }
}

/// Whole floats within `i64` range; anything else would saturate on cast.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn integral_f64_to_i64(f: f64) -> Option<i64> {
    // 2^63, exactly representable; `i64::MAX as f64` rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

pub(crate) fn as_bool(value: &Value) -> Result<bool, Error> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" => Ok(true),
            "false" | "0" | "off" => Ok(false),
            _ => Err(mismatch("a boolean", value)),
        },
        _ => Err(mismatch("a boolean", value)),
    }
}

pub(crate) fn as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extract the state label from a `get_status` value.
///
/// Accepts both `{"state": "IDLE"}` and a bare `"IDLE"`.
pub(crate) fn status_label(value: &Value) -> Result<String, Error> {
    match value {
        Value::Object(map) => map
            .get("state")
            .map(as_string)
            .ok_or_else(|| mismatch("an object with a `state` field", value)),
        Value::String(s) => Ok(s.clone()),
        _ => Err(mismatch("a status object", value)),
    }
}
