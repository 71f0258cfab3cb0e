//! Formatting helpers for the backend's date/time and material conventions.

use chrono::NaiveDateTime;

/// Formats a timestamp as a Spring `LocalDateTime` (no zone, whole seconds).
pub fn local_date_time(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Joins a `YYYY-MM-DD` date and a loose `H:M` time into a `LocalDateTime`.
///
/// Hour and minute are zero-padded; a missing time is treated as midnight and
/// seconds are always `00`.
pub fn combine_date_time(date: &str, time: &str) -> String {
    let time = if time.trim().is_empty() { "00:00" } else { time.trim() };
    let mut parts = time.split(':');
    let hours = parts.next().unwrap_or("0");
    let minutes = parts.next().filter(|value| !value.is_empty()).unwrap_or("00");
    format!("{date}T{hours:0>2}:{minutes:0>2}:00")
}

/// Maps an intermediate material code (`10…1`) to its finished-goods
/// counterpart (`20…2`). Other codes are returned unchanged.
pub fn transform_material_code(code: &str) -> String {
    if should_transform_material_code(code) {
        format!("20{}2", &code[2..code.len() - 1])
    } else {
        code.to_owned()
    }
}

pub fn should_transform_material_code(code: &str) -> bool {
    code.len() > 2 && code.starts_with("10") && code.ends_with('1')
}
