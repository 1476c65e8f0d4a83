//! Field-level decoders for the scraper's CSV columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::domain::ArtistCredit;
use crate::ingest::artists::parse_artist_list;

/// Blank is unknown. Accepts `1234`, `1234.0` and `1,234`; anything else is an error.
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_count(&s).map_err(D::Error::custom),
    }
}

pub fn parse_count(raw: &str) -> Result<Option<u64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    if let Ok(n) = cleaned.parse::<u64>() {
        return Ok(Some(n));
    }
    // pandas writes integer columns containing gaps as floats
    match cleaned.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f.is_finite() => Ok(Some(f as u64)),
        _ => Err(format!("expected a non-negative whole number, got '{}'", raw)),
    }
}

pub fn calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(D::Error::custom)
}

/// Keeps the local date component; offsets are ignored, never converted.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, String> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    Err(format!("unparseable date '{}'", raw))
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("True") | Some("true") | Some("1") => Ok(true),
        Some("False") | Some("false") | Some("0") => Ok(false),
        Some(other) => Err(D::Error::custom(format!("expected a boolean, got '{}'", other))),
    }
}

pub fn artist_list<'de, D>(deserializer: D) -> Result<Vec<ArtistCredit>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(Vec::new()),
        Some(s) => parse_artist_list(&s).map_err(D::Error::custom),
    }
}
