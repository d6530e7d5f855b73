//! Failure ledger records
//!
//! The ledger maps a client identifier (normally the remote address) to a
//! [`FailureRecord`]. On disk it is a JSON object:
//!
//! ```json
//! {
//!   "203.0.113.7": { "count": 4, "locked_until": "2024-05-01T12:02:00.000000+00:00" }
//! }
//! ```
//!
//! Timestamps are written as RFC 3339 in UTC. Timestamps without an offset are
//! accepted on read and interpreted as local time.
use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// The whole ledger, loaded and saved as one unit.
pub type FailureLedger = BTreeMap<String, FailureRecord>;

/// Latest instant a lock may extend to (`9999-12-31T23:59:59Z`).
const LATEST_LOCK_TIMESTAMP: i64 = 253_402_300_799;

/// Failed attempts recorded for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Cumulative failures since the last reset. Never capped.
    pub count: u32,

    /// Expiry of the current lock, set once `count` reaches the threshold.
    #[serde(default, with = "iso8601_option")]
    pub locked_until: Option<DateTime<Utc>>,
}

impl FailureRecord {
    /// A lock is active only while `count` is at or over the threshold and
    /// `now` is still before `locked_until`.
    pub fn is_locked_at(&self, threshold: u32, now: DateTime<Utc>) -> bool {
        if self.count < threshold {
            return false;
        }
        self.locked_until.is_some_and(|until| now < until)
    }
}

/// Lockout state of an identifier at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockoutStatus {
    pub identifier: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    pub(crate) fn unlocked(identifier: &str, failed_attempts: u32) -> Self {
        Self {
            identifier: identifier.to_string(),
            failed_attempts,
            is_locked: false,
            locked_until: None,
        }
    }

    /// Seconds until the lock lifts, or `None` when not locked.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        self.retry_after_seconds_at(Utc::now())
    }

    pub fn retry_after_seconds_at(&self, now: DateTime<Utc>) -> Option<i64> {
        if !self.is_locked {
            return None;
        }
        self.locked_until.map(|until| (until - now).num_seconds().max(0))
    }
}

/// `start + delay`, clamped to the latest timestamp the ledger can represent.
pub(crate) fn lock_expiry(start: DateTime<Utc>, delay: Option<chrono::Duration>) -> DateTime<Utc> {
    let latest =
        DateTime::from_timestamp(LATEST_LOCK_TIMESTAMP, 0).unwrap_or(DateTime::<Utc>::MAX_UTC);
    delay
        .and_then(|delay| start.checked_add_signed(delay))
        .filter(|until| *until <= latest)
        .unwrap_or(latest)
}

/// Parse an ISO-8601 timestamp, with or without a UTC offset.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    value
        .parse::<NaiveDateTime>()
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, false)
}

mod iso8601_option {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => serializer.serialize_some(&format_timestamp(timestamp)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| {
            parse_timestamp(&value)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {value}")))
        })
        .transpose()
    }
}
