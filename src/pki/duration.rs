//! Duration strings in the `72h3m0.5s` form.
//!
//! A duration is an optional sign followed by one or more decimal numbers,
//! each with an optional fraction and a unit suffix: `ns`, `us` (or `µs`),
//! `ms`, `s`, `m`, `h`. The bare string `0` is also accepted.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Largest representable duration, matching a signed 64-bit nanosecond count.
const MAX_NANOS: u128 = i64::MAX as u128;

/// Fraction digits beyond this are dropped; they are below nanosecond precision.
const MAX_FRACTION_DIGITS: u32 = 18;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("time: invalid duration \"{input}\"")]
    Invalid { input: String },

    #[error("time: missing unit in duration \"{input}\"")]
    MissingUnit { input: String },

    #[error("time: unknown unit \"{unit}\" in duration \"{input}\"")]
    UnknownUnit { unit: String, input: String },

    #[error("time: duration \"{input}\" is out of range")]
    Overflow { input: String },

    #[error("time: negative duration \"{input}\" is not supported")]
    Negative { input: String },
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{00b5}s" | "\u{03bc}s" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parse a duration string such as `24h`, `1h30m` or `1.5s`.
///
/// Negative durations are rejected since a [`Duration`] cannot hold them;
/// `-0s` parses as zero.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let invalid = || DurationParseError::Invalid { input: input.to_string() };

    let mut rest = input;
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let first = rest.as_bytes()[0];
        if !(first == b'.' || first.is_ascii_digit()) {
            return Err(invalid());
        }

        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, after_int) = rest.split_at(int_len);
        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| DurationParseError::Overflow {
                input: input.to_string(),
            })?
        };
        if whole > MAX_NANOS {
            return Err(DurationParseError::Overflow { input: input.to_string() });
        }

        let mut fraction: u128 = 0;
        let mut scale: u128 = 1;
        let mut has_fraction = false;
        rest = after_int;
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            let (frac_digits, after_frac) = after_dot.split_at(frac_len);
            for digit in frac_digits.bytes().take(MAX_FRACTION_DIGITS as usize) {
                fraction = fraction * 10 + u128::from(digit - b'0');
                scale *= 10;
            }
            has_fraction = !frac_digits.is_empty();
            rest = after_frac;
        }

        if int_digits.is_empty() && !has_fraction {
            return Err(invalid());
        }

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if unit_len == 0 {
            return Err(DurationParseError::MissingUnit { input: input.to_string() });
        }
        let (unit, after_unit) = rest.split_at(unit_len);
        let multiplier = unit_nanos(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let component = whole
            .checked_mul(multiplier)
            .and_then(|nanos| nanos.checked_add(fraction * multiplier / scale))
            .filter(|nanos| *nanos <= MAX_NANOS)
            .ok_or_else(|| DurationParseError::Overflow { input: input.to_string() })?;

        total += component;
        if total > MAX_NANOS {
            return Err(DurationParseError::Overflow { input: input.to_string() });
        }
        rest = after_unit;
    }

    if negative && total != 0 {
        return Err(DurationParseError::Negative { input: input.to_string() });
    }

    // total <= i64::MAX so the conversion is lossless
    Ok(Duration::from_nanos(total as u64))
}

/// Format a duration in the form accepted by [`parse_duration`].
///
/// Durations of one second or more render as `1h2m3.5s`; shorter ones use the
/// largest sub-second unit that keeps the integer part non-zero.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SECOND {
        let (unit, per_unit, width) = if nanos < NANOS_PER_MICRO {
            ("ns", 1, 0)
        } else if nanos < NANOS_PER_MILLI {
            ("\u{00b5}s", NANOS_PER_MICRO, 3)
        } else {
            ("ms", NANOS_PER_MILLI, 6)
        };
        return format!("{}{}{}", nanos / per_unit, fraction_suffix(nanos % per_unit, width), unit);
    }

    let seconds = nanos / NANOS_PER_SECOND;
    let fraction = fraction_suffix(nanos % NANOS_PER_SECOND, 9);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h{}m{}{}s", hours, minutes, secs, fraction)
    } else if minutes > 0 {
        format!("{}m{}{}s", minutes, secs, fraction)
    } else {
        format!("{}{}s", secs, fraction)
    }
}

fn fraction_suffix(remainder: u128, width: usize) -> String {
    if remainder == 0 || width == 0 {
        return String::new();
    }
    let digits = format!("{:0width$}", remainder, width = width);
    format!(".{}", digits.trim_end_matches('0'))
}
