//! Per-provider parsing seams.
//!
//! Each upstream family gets exactly one adapter that maps its raw JSON
//! shape onto the canonical record types. All schema fragility lives here:
//! rows with missing or unusable fields are skipped, never errors.

pub mod ergast;
pub mod openf1;

use serde_json::Value;

/// Numeric field that may arrive as a JSON number or a numeric string.
pub(crate) fn json_u32(value: &Value) -> Option<u32> {
    if let Some(number) = value.as_u64() {
        return u32::try_from(number).ok();
    }
    value.as_str()?.trim().parse().ok()
}

pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    if let Some(number) = value.as_f64() {
        return number.is_finite().then_some(number);
    }
    value.as_str()?.trim().parse().ok()
}

/// String field, `None` when absent, null, or blank.
pub(crate) fn json_str(value: &Value) -> Option<&str> {
    let text = value.as_str()?.trim();
    (!text.is_empty()).then_some(text)
}
