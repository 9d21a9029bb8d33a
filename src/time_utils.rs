//! The single timestamp-normalization point.
//!
//! Backend payloads carry naive date-time strings that are implicitly UTC.
//! Every consumer goes through these helpers; appending the UTC marker at
//! individual call sites is exactly the off-by-timezone bug class this
//! module exists to remove.

use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::market_data::{TimeInterval, Timestamp};
use chrono::{DateTime, NaiveDateTime};

const BACKEND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a naive backend timestamp (`2024-03-01 12:30:00` or the ISO `T`
/// form) as UTC epoch seconds.
pub fn parse_utc_timestamp(raw: &str) -> ChartResult<Timestamp> {
    let naive = NaiveDateTime::parse_from_str(raw, BACKEND_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, ISO_FORMAT))
        .map_err(|e| ChartError::Parse(format!("invalid timestamp {raw:?}: {e}")))?;
    Ok(Timestamp::new(naive.and_utc().timestamp()))
}

/// Format for the history endpoint's `end_time` query parameter.
pub fn format_backend_timestamp(time: Timestamp) -> String {
    utc(time).format(BACKEND_FORMAT).to_string()
}

/// Format for the backtest request's `startTime`/`endTime` fields.
pub fn to_iso8601(time: Timestamp) -> String {
    utc(time).format(ISO_FORMAT).to_string()
}

/// Axis/readout label at the given granularity.
///
/// Intraday intervals show `HH:MM`, daily shows `DD.MM.YYYY`.
pub fn format_time_label(time: Timestamp, interval: TimeInterval) -> String {
    let date = utc(time);
    match interval {
        TimeInterval::OneDay => date.format("%d.%m.%Y").to_string(),
        _ => date.format("%H:%M").to_string(),
    }
}

fn utc(time: Timestamp) -> DateTime<chrono::Utc> {
    DateTime::from_timestamp(time.value(), 0).unwrap_or_default()
}
