//! Byte-count and duration formatting.
//!
//! Byte counts appear in two places with fixed formats: CLI arguments
//! (`--min-size 10K`) and report headers (`## Size: 1.5M ...`). Reports are
//! consumed by the execute/coalesce modes, so the header format is stable.

use std::time::Duration;

const SUFFIXES: [&str; 5] = [" bytes", "K", "M", "G", "T"];

/// Parse a byte count with an optional unit suffix.
///
/// Accepts an integer followed by `B` (bytes), `K` (1024), `M`, `G` or `T`,
/// case-insensitive. A missing suffix means bytes.
///
/// # Errors
///
/// Returns a message if the input is empty, the digits are missing or
/// malformed, the suffix is unknown, or the result overflows `u64`.
pub fn parse_byte_count(text: &str) -> Result<u64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty byte count".to_string());
    }

    let (digits, multiplier) = match text.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let multiplier = match c.to_ascii_uppercase() {
                'B' => 1u64,
                'K' => 1u64 << 10,
                'M' => 1u64 << 20,
                'G' => 1u64 << 30,
                'T' => 1u64 << 40,
                _ => return Err(format!("unknown unit suffix '{c}'")),
            };
            (&text[..text.len() - 1], multiplier)
        }
        _ => (text, 1u64),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid byte count '{text}'"))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("byte count '{text}' is out of range"))
}

/// Format a byte count the way report headers expect it.
///
/// Values below 1024 render as `N bytes`; larger values divide by 1024 per
/// suffix step and print one decimal place unless the result is integral
/// (`512 bytes`, `10K`, `1.5M`).
#[must_use]
pub fn format_byte_count(byte_count: u64) -> String {
    let mut value = byte_count as f64;
    let mut suffix = SUFFIXES[0];

    for s in SUFFIXES {
        suffix = s;
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
    }

    let precision = if value == value.trunc() { 0 } else { 1 };
    format!("{value:.precision$}{suffix}")
}

/// Format an elapsed duration for the `--time` report trailer.
#[must_use]
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    if total < 60.0 {
        return format!("{total:.1}s");
    }

    let seconds = total as u64;
    let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}
