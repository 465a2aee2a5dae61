//! Custom configuration field types.
//!
//! - durations (`500ms`, `15s`, `2h`, `1h30m`, or bare seconds)
//! - [`TimeOfDay`] (`HH:MM`)
//! - [`RelativeAbsoluteValue`] (`20%` or a byte size such as `1g`)

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parse a duration such as `500ms`, `15s`, `2h` or `1h30m`.
///
/// A bare integer is a number of seconds. Supported units: `ms`, `s`, `m`,
/// `h`, `d`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let invalid = || format!("invalid duration '{}'", input);
    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return Err(invalid());
        }
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let unit_millis: u64 = match unit {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            "" => return Err(format!("missing unit in duration '{}'", input)),
            other => return Err(format!("unknown unit '{}' in duration '{}'", other, input)),
        };

        let part = if number.contains('.') {
            let value: f64 = number.parse().map_err(|_| invalid())?;
            Duration::try_from_secs_f64(value * unit_millis as f64 / 1_000.0).map_err(|_| invalid())?
        } else {
            let value: u64 = number.parse().map_err(|_| invalid())?;
            let millis = value.checked_mul(unit_millis).ok_or_else(invalid)?;
            Duration::from_millis(millis)
        };
        total = total.checked_add(part).ok_or_else(invalid)?;
    }

    Ok(total)
}

/// Format a duration the way [`parse_duration`] reads it.
pub fn format_duration(duration: Duration) -> String {
    let total_millis = duration.as_millis();
    if total_millis == 0 {
        return "0s".to_string();
    }

    let hours = total_millis / 3_600_000;
    let minutes = (total_millis / 60_000) % 60;
    let seconds = (total_millis / 1_000) % 60;
    let millis = total_millis % 1_000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    if millis > 0 {
        out.push_str(&format!("{}ms", millis));
    }
    out
}

/// Serde adapter for [`Duration`] fields written as duration strings.
pub mod serde_duration {
    use std::fmt;
    use std::time::Duration;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }

    struct DurationVisitor;

    impl Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a duration string such as \"15s\" or a number of seconds")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
            super::parse_duration(value).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
            u64::try_from(value)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("negative duration: {}", value)))
        }
    }
}

/// Wall-clock time of day (`HH:MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    /// Create a time of day, checking ranges.
    pub fn new(hour: u32, minute: u32) -> Result<Self, String> {
        if hour > 23 || minute > 59 {
            return Err(format!("time out of range: {:02}:{:02}", hour, minute));
        }
        Ok(Self { hour, minute })
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid time format (expected HH:MM): {}", s))?;
        let hour: u32 = hour
            .trim()
            .parse()
            .map_err(|_| format!("invalid numeric values in time: {}", s))?;
        let minute: u32 = minute
            .trim()
            .parse()
            .map_err(|_| format!("invalid numeric values in time: {}", s))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A size given either relative to a reference (`20%`) or in bytes (`1g`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelativeAbsoluteValue {
    /// Fraction of the reference, in `0.0..`.
    Relative(f64),
    /// Absolute number of bytes.
    Absolute(u64),
}

impl RelativeAbsoluteValue {
    /// Resolve against `reference`.
    pub fn value_for(&self, reference: u64) -> u64 {
        match self {
            RelativeAbsoluteValue::Relative(ratio) => (ratio * reference as f64) as u64,
            RelativeAbsoluteValue::Absolute(bytes) => *bytes,
        }
    }
}

impl FromStr for RelativeAbsoluteValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_suffix('%') {
            Some(percent) => {
                let value: f64 = percent
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid percentage '{}'", s))?;
                if value.is_sign_negative() || !value.is_finite() {
                    return Err(format!("illegal relative value '{}'", s));
                }
                Ok(RelativeAbsoluteValue::Relative(value / 100.0))
            }
            None => parse_byte_size(s).map(RelativeAbsoluteValue::Absolute),
        }
    }
}

impl TryFrom<String> for RelativeAbsoluteValue {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelativeAbsoluteValue> for String {
    fn from(value: RelativeAbsoluteValue) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RelativeAbsoluteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeAbsoluteValue::Relative(ratio) => write!(f, "{}%", ratio * 100.0),
            RelativeAbsoluteValue::Absolute(bytes) => write!(f, "{}", bytes),
        }
    }
}

/// Parse a byte size such as `512`, `1g`, `1.5 GB` or `512MiB`.
///
/// `k`/`kb` are powers of 1000, `ki`/`kib` powers of 1024.
pub fn parse_byte_size(input: &str) -> Result<u64, String> {
    let s = input.trim();
    let number_end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(number_end);
    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid byte size '{}'", input))?;

    let multiplier: f64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "k" | "kb" => 1e3,
        "ki" | "kib" => 1024.0,
        "m" | "mb" => 1e6,
        "mi" | "mib" => 1024.0 * 1024.0,
        "g" | "gb" => 1e9,
        "gi" | "gib" => 1024.0 * 1024.0 * 1024.0,
        "t" | "tb" => 1e12,
        "ti" | "tib" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        other => return Err(format!("unknown size unit '{}' in '{}'", other, input)),
    };

    Ok((value * multiplier) as u64)
}
