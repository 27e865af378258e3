//! # Temporal Types
//!
//! `Timestamp` is a UTC instant truncated to whole seconds and always
//! rendered as `YYYY-MM-DDTHH:MM:SSZ`. Block timestamps are part of the
//! hashed block content, so the rendering must be stable: a local offset
//! or a sub-second component would change the canonical bytes of an
//! otherwise identical block.
//!
//! `IssueDate` is the calendar date printed on a certificate.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A UTC-only timestamp with seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Wrap a `DateTime<Utc>`, discarding sub-second precision.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::Format {
                field: "timestamp",
                reason: format!("{s:?} must use the Z suffix"),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::Format {
            field: "timestamp",
            reason: format!("{s:?}: {e}"),
        })?;
        Ok(Self::from_utc(dt.with_timezone(&Utc)))
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// The calendar date of this instant in UTC.
    pub fn date(&self) -> IssueDate {
        IssueDate(self.0.date_naive())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A certificate issue date, rendered `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueDate(NaiveDate);

impl IssueDate {
    pub fn today() -> Self {
        Timestamp::now().date()
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| ValidationError::Format {
                field: "issue_date",
                reason: format!("{year:04}-{month:02}-{day:02} is not a calendar date"),
            })
    }
}

impl std::fmt::Display for IssueDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 30, 15)
            .unwrap()
            .with_nanosecond(999_999_999)
            .unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_iso8601(), "2026-03-01T09:30:15Z");
    }

    #[test]
    fn parse_rejects_offsets() {
        assert!(Timestamp::parse("2026-03-01T09:30:15Z").is_ok());
        assert!(Timestamp::parse("2026-03-01T09:30:15+00:00").is_err());
        assert!(Timestamp::parse("2026-03-01T14:30:15+05:00").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn serde_uses_iso8601_string() {
        let ts = Timestamp::parse("2026-03-01T09:30:15Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2026-03-01T09:30:15Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn issue_date_format() {
        let d = IssueDate::from_ymd(2026, 1, 5).unwrap();
        assert_eq!(d.to_string(), "2026-01-05");
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2026-01-05\"");
        assert!(IssueDate::from_ymd(2026, 2, 30).is_err());
    }

    #[test]
    fn date_of_timestamp() {
        let ts = Timestamp::parse("2026-12-31T23:59:59Z").unwrap();
        assert_eq!(ts.date().to_string(), "2026-12-31");
    }
}
