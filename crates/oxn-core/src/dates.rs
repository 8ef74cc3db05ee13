//! Timestamp rendering for tables.
//!
//! Everything renders as `YYYY-MM-DD HH:mm:ss` in one display zone. Input that
//! is not a recognizable timestamp is shown as-is; a bad date never breaks a table.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::error::OxnError;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Naive forms are what the backend's `isoformat()` produces; they are UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Zone used to display timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl FromStr for DisplayZone {
    type Err = OxnError;

    /// Accepts `local`, `utc`/`z`, or an offset such as `+02:00` / `-0530`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(DisplayZone::Local),
            "utc" | "z" => return Ok(DisplayZone::Utc),
            _ => {}
        }
        parse_offset(s)
            .map(DisplayZone::Fixed)
            .ok_or_else(|| OxnError::Config(format!("unrecognized timezone '{}'", s)))
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse the timestamp shapes the backend and result snapshots use.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Renders timestamps for one session in a fixed zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormatter {
    zone: DisplayZone,
}

impl DateFormatter {
    pub fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    pub fn utc() -> Self {
        Self::new(DisplayZone::Utc)
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    pub fn format(&self, input: &str) -> String {
        let Some(dt) = parse_timestamp(input) else {
            warn!(input = %input, "Invalid date");
            return input.to_string();
        };
        match self.zone {
            DisplayZone::Local => dt.with_timezone(&Local).format(DISPLAY_FORMAT).to_string(),
            DisplayZone::Utc => dt.format(DISPLAY_FORMAT).to_string(),
            DisplayZone::Fixed(offset) => {
                dt.with_timezone(&offset).format(DISPLAY_FORMAT).to_string()
            }
        }
    }

    /// Lifecycle timestamps are absent until the backend sets them.
    pub fn format_opt(&self, input: Option<&str>) -> String {
        match input {
            Some(s) => self.format(s),
            None => "-".to_string(),
        }
    }
}

/// Format with the viewer's local zone.
pub fn format_date(input: &str) -> String {
    DateFormatter::default().format(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_date_passes_through() {
        assert_eq!(DateFormatter::utc().format("invalid-date"), "invalid-date");
        assert_eq!(format_date("invalid-date"), "invalid-date");
        assert_eq!(DateFormatter::utc().format(""), "");
    }

    #[test]
    fn test_rfc3339_in_utc() {
        let f = DateFormatter::utc();
        assert_eq!(f.format("2024-12-10T13:21:02.143Z"), "2024-12-10 13:21:02");
        assert_eq!(f.format("2024-12-10T15:21:02+02:00"), "2024-12-10 13:21:02");
    }

    #[test]
    fn test_fixed_offset_zone() {
        let f = DateFormatter::new("+02:00".parse().unwrap());
        assert_eq!(f.format("2024-12-10T13:21:02.143Z"), "2024-12-10 15:21:02");
        let f = DateFormatter::new("-0530".parse().unwrap());
        assert_eq!(f.format("2024-12-10T13:21:02Z"), "2024-12-10 07:51:02");
    }

    #[test]
    fn test_naive_and_date_only_inputs() {
        let f = DateFormatter::utc();
        assert_eq!(f.format("2024-11-17T15:10:56.143211"), "2024-11-17 15:10:56");
        assert_eq!(f.format("2024-11-17 15:10:56"), "2024-11-17 15:10:56");
        assert_eq!(f.format("2024-11-17"), "2024-11-17 00:00:00");
    }

    #[test]
    fn test_format_opt() {
        let f = DateFormatter::utc();
        assert_eq!(f.format_opt(None), "-");
        assert_eq!(f.format_opt(Some("2024-01-20T16:02:11Z")), "2024-01-20 16:02:11");
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("local".parse::<DisplayZone>().unwrap(), DisplayZone::Local);
        assert_eq!("UTC".parse::<DisplayZone>().unwrap(), DisplayZone::Utc);
        assert_eq!(
            "+01:00".parse::<DisplayZone>().unwrap(),
            DisplayZone::Fixed(FixedOffset::east_opt(3600).unwrap())
        );
        assert!("Europe/Berlin".parse::<DisplayZone>().is_err());
        assert!("+25:00".parse::<DisplayZone>().is_err());
    }
}
