//! A single gas-sensor observation and the per-field value coercion rules.
//!
//! Sensor payloads arrive as free-form text. Numeric fields are parsed
//! leniently: the longest numeric prefix wins and anything unparseable
//! becomes zero, so a noisy sensor degrades to stale-looking values rather
//! than errors.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Status reported before the first status message arrives.
pub const DEFAULT_STATUS: &str = "AGUARDANDO";

/// One telemetry snapshot: gas level, concentration, status and capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Raw gas sensor level.
    pub gas: i64,
    /// Gas concentration in parts per million.
    pub ppm: f64,
    /// Textual status code published by the sensor node.
    pub status: String,
    /// When the reading was last updated.
    #[serde(with = "iso_millis")]
    pub timestamp: Timestamp,
}

impl Reading {
    /// A zeroed reading stamped with `at`.
    pub fn initial(at: Timestamp) -> Self {
        Self {
            gas: 0,
            ppm: 0.0,
            status: DEFAULT_STATUS.to_string(),
            timestamp: at,
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::initial(Utc::now())
    }
}

/// The reading field a broker topic feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorField {
    Gas,
    Ppm,
    Status,
}

impl SensorField {
    pub const ALL: [SensorField; 3] = [SensorField::Gas, SensorField::Ppm, SensorField::Status];

    pub fn as_str(self) -> &'static str {
        match self {
            SensorField::Gas => "gas",
            SensorField::Ppm => "ppm",
            SensorField::Status => "status",
        }
    }
}

impl fmt::Display for SensorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gas" => Ok(SensorField::Gas),
            "ppm" => Ok(SensorField::Ppm),
            "status" => Ok(SensorField::Status),
            other => Err(CoreError::UnknownField(other.to_string())),
        }
    }
}

/// Decode a broker payload as text, replacing invalid UTF-8 sequences.
pub fn decode_payload(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}

/// Parse a gas level from the longest leading integer in `raw`.
///
/// Leading whitespace and a single sign are accepted, and a `0x`/`0X`
/// prefix after the sign switches to hexadecimal digits. Returns 0 when
/// there are no digits or the value does not fit in an `i64`.
pub fn parse_gas(raw: &str) -> i64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            end = 1;
            true
        }
        Some(b'+') => {
            end = 1;
            false
        }
        _ => false,
    };

    if matches!(&bytes[end..], [b'0', b'x' | b'X', ..]) {
        return parse_hex_prefix(&s[end + 2..], negative);
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }

    s[..end].parse().unwrap_or(0)
}

fn parse_hex_prefix(digits: &str, negative: bool) -> i64 {
    let len = digits
        .bytes()
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if len == 0 {
        return 0;
    }

    match i64::from_str_radix(&digits[..len], 16) {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) => 0,
    }
}

/// Parse a concentration from the longest leading decimal float in `raw`.
///
/// Accepts an optional sign, digits with an optional fraction and an
/// optional exponent. Returns 0.0 when no numeric prefix exists or the
/// result is not finite.
pub fn parse_ppm(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        // Negative zero collapses to zero.
        Ok(v) if v == 0.0 => 0.0,
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Serde adapter for ISO-8601 UTC timestamps with millisecond precision,
/// e.g. `2024-05-01T12:00:00.123Z`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn gas_parses_plain_integer() {
        assert_eq!(parse_gas("7"), 7);
        assert_eq!(parse_gas("-12"), -12);
        assert_eq!(parse_gas("+5"), 5);
    }

    #[test]
    fn gas_takes_leading_integer_prefix() {
        assert_eq!(parse_gas("  42abc"), 42);
        assert_eq!(parse_gas("3.9"), 3);
        assert_eq!(parse_gas("\n512\r\n"), 512);
    }

    #[test]
    fn gas_falls_back_to_zero() {
        assert_eq!(parse_gas("not-a-number"), 0);
        assert_eq!(parse_gas(""), 0);
        assert_eq!(parse_gas("-"), 0);
        assert_eq!(parse_gas("99999999999999999999999"), 0);
    }

    #[test]
    fn gas_reads_hex_prefix() {
        assert_eq!(parse_gas("0x1A"), 26);
        assert_eq!(parse_gas(" -0X1f"), -31);
        assert_eq!(parse_gas("0x1G"), 1);
        assert_eq!(parse_gas("0x"), 0);
        assert_eq!(parse_gas("0xZZ"), 0);
    }

    #[test]
    fn ppm_negative_zero_becomes_zero() {
        assert!(parse_ppm("-0").is_sign_positive());
        assert!(parse_ppm("-0.0e5").is_sign_positive());
        assert_eq!(parse_ppm("-0"), 0.0);
    }

    #[test]
    fn ppm_parses_decimal_forms() {
        assert_eq!(parse_ppm("3.5"), 3.5);
        assert_eq!(parse_ppm(".5"), 0.5);
        assert_eq!(parse_ppm("5."), 5.0);
        assert_eq!(parse_ppm("-0.25"), -0.25);
        assert_eq!(parse_ppm("1e3"), 1000.0);
        assert_eq!(parse_ppm("2.5E-1"), 0.25);
    }

    #[test]
    fn ppm_takes_leading_float_prefix() {
        assert_eq!(parse_ppm(" 12.75ppm"), 12.75);
        assert_eq!(parse_ppm("4e"), 4.0);
        assert_eq!(parse_ppm("4e+"), 4.0);
        assert_eq!(parse_ppm("1.2.3"), 1.2);
    }

    #[test]
    fn ppm_falls_back_to_zero() {
        assert_eq!(parse_ppm("abc"), 0.0);
        assert_eq!(parse_ppm("."), 0.0);
        assert_eq!(parse_ppm(""), 0.0);
        assert_eq!(parse_ppm("1e999"), 0.0);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_payload(b"ok"), "ok");
        assert_eq!(decode_payload(&[b'a', 0xff, b'b']), "a\u{fffd}b");
    }

    #[test]
    fn field_names_round_trip_through_from_str() {
        for field in SensorField::ALL {
            assert_eq!(field.as_str().parse::<SensorField>().unwrap(), field);
        }
        assert_eq!(" PPM ".parse::<SensorField>().unwrap(), SensorField::Ppm);
        assert_matches!(
            "humidity".parse::<SensorField>(),
            Err(CoreError::UnknownField(name)) if name == "humidity"
        );
    }

    #[test]
    fn reading_serializes_timestamp_with_millis() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        let reading = Reading {
            gas: 7,
            ppm: 3.5,
            status: "ALERTA".into(),
            timestamp: at,
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["gas"], 7);
        assert_eq!(json["ppm"], 3.5);
        assert_eq!(json["status"], "ALERTA");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00.123Z");

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back, reading);
    }

    #[test]
    fn initial_reading_is_zeroed_and_waiting() {
        let reading = Reading::default();
        assert_eq!(reading.gas, 0);
        assert_eq!(reading.ppm, 0.0);
        assert_eq!(reading.status, DEFAULT_STATUS);
    }
}
