// src/config/duration.rs

use std::time::Duration;

/// Parse a duration string like `"3s"`, `"250ms"`, `"1.5s"`, `"1m"`, `"2h"`.
///
/// A bare number (`"10"`, `"0.5"`) is read as seconds, matching the CLI's
/// `--timeout` flag.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between the number and the suffix.
    let idx = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    let (num_part, unit_part) = s.split_at(idx);
    let unit = unit_part.trim().to_lowercase();
    let scale_ms: u64 = match unit.as_str() {
        "ms" => 1,
        "" | "s" => 1000,
        "m" => 60 * 1000,
        "h" => 60 * 60 * 1000,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    // Whole numbers stay in integer arithmetic so "250ms" is exact.
    if !num_part.contains('.') {
        let value: u64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
        return value
            .checked_mul(scale_ms)
            .map(Duration::from_millis)
            .ok_or_else(|| format!("duration '{}' out of range", s));
    }

    let value: f64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    Duration::try_from_secs_f64(value * scale_ms as f64 / 1000.0)
        .map_err(|e| format!("duration '{}' out of range: {}", s, e))
}
