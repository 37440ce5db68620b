pub mod connection;
pub mod schema;
pub mod tasks;
pub mod results;

pub use connection::Database;

use std::net::IpAddr;

use chrono::{DateTime, SecondsFormat, Utc};
use crate::errors::ScopeError;

/// LIMIT/OFFSET binding; values past `i64::MAX` clamp so SQLite never sees a negative.
pub(crate) fn sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Index key for an address: IPv4-mapped forms collapse to IPv4 and IPv6 is compressed lowercase.
/// Anything that is not an address is returned unchanged.
pub(crate) fn canonical_ip(raw: &str) -> String {
    match raw.trim().parse::<IpAddr>() {
        Ok(ip) => ip.to_canonical().to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, ScopeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScopeError::Database(format!("Invalid timestamp '{}': {}", raw, e)))
}
