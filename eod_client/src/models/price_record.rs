//! Canonical in-memory representation of one end-of-day observation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// A single end-of-day price observation for one symbol.
///
/// `date` is kept exactly as received; use [`PriceRecord::calendar_date`] to
/// get a value that orders chronologically. Wire fields this type does not
/// name (`adj_close`, `split_factor`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Ticker symbol (e.g. "AAPL").
    pub symbol: String,

    /// Exchange MIC. Not every upstream supplies it.
    #[serde(default)]
    pub exchange: String,

    /// Timestamp text as sent by the upstream.
    pub date: String,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,

    /// Shares traded. Upstreams send this as either an integer or a float.
    #[serde(deserialize_with = "de_volume")]
    pub volume: u64,
}

impl PriceRecord {
    /// The calendar date of this observation, or `None` when `date` is not a
    /// recognised timestamp.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }
}

/// Parse upstream timestamp text into a calendar date.
///
/// Accepted forms:
/// - RFC 3339: `2024-01-15T00:00:00Z`, `2024-01-15T00:00:00+00:00`
/// - compact offset: `2024-01-15T00:00:00+0000`
/// - naive: `2024-01-15T00:00:00`
/// - date only: `2024-01-15`
///
/// The date is taken in the timestamp's own offset; no local time zone is
/// involved, so the result does not depend on where the process runs.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireVolume {
    Int(u64),
    Float(f64),
}

fn de_volume<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match WireVolume::deserialize(deserializer)? {
        WireVolume::Int(v) => Ok(v),
        WireVolume::Float(v) if v.is_finite() && v >= 0.0 => Ok(v.round() as u64),
        WireVolume::Float(v) => Err(D::Error::custom(format!("invalid volume: {v}"))),
    }
}
