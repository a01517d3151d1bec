//! Shared formatting helpers for the dashboard.
//!
//! All pure formatting functions (no terminal styles, no layout) live here.
//! Byte quantities use binary scales (1024), message counts use decimal
//! scales (1000).

/// Scale suffixes, smallest first. `E` is enough for any `i64`.
const SUFFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

const KIBIBYTE: f64 = 1024.0;
const KILO: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Scaled values
// ---------------------------------------------------------------------------

/// Format byte count as human-readable size.
///
/// `"0"`, `"1023"`, `"1.0K"`, `"1.5M"`, `"8.0E"`
///
/// Values below 1024 are printed as plain integers. Larger values are divided
/// by 1024 until the mantissa, rounded half-away-from-zero to one decimal,
/// stays below 1024; a mantissa that would read `1024.0` moves up a scale, so
/// `1024 * 1024 - 1` renders as `"1.0M"` rather than `"1024.0K"`.
///
/// Negative input is clamped to zero.
pub fn psize(bytes: i64) -> String {
    scaled(bytes, KIBIBYTE)
}

/// Format a message count with decimal scales.
///
/// `"999"`, `"1.0K"`, `"2.5M"`
pub fn nsize(count: i64) -> String {
    scaled(count, KILO)
}

fn scaled(value: i64, base: f64) -> String {
    if value <= 0 {
        return "0".to_string();
    }
    if (value as f64) < base {
        return value.to_string();
    }

    let mut mantissa = value as f64;
    let mut unit = 0;
    loop {
        mantissa /= base;
        let rounded = round1(mantissa);
        if rounded < base || unit == SUFFIXES.len() - 1 {
            return format!("{:.1}{}", rounded, SUFFIXES[unit]);
        }
        unit += 1;
    }
}

/// Round to one decimal place, halves away from zero.
fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Format bytes-per-second rate: `"0"`, `"512/s"`, `"1.5K/s"`.
pub fn psize_rate(rate: f64) -> String {
    format_rate(rate, psize)
}

/// Format messages-per-second rate: `"0"`, `"12/s"`, `"3.4K/s"`.
pub fn nsize_rate(rate: f64) -> String {
    format_rate(rate, nsize)
}

fn format_rate(rate: f64, size: fn(i64) -> String) -> String {
    if !rate.is_finite() || rate < 1.0 {
        return "0".to_string();
    }
    // `as` saturates at i64::MAX for huge rates.
    format!("{}/s", size(rate.round() as i64))
}
