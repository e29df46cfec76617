use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_epoch_secs(epoch_secs: i64) -> Option<Self> {
        DateTime::from_timestamp(epoch_secs, 0).map(Self)
    }

    pub fn parse_rfc3339(raw: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|parsed| Self(parsed.with_timezone(&Utc)))
    }

    pub fn as_epoch_secs(self) -> i64 {
        self.0.timestamp()
    }

    pub fn signed_duration_since(self, earlier: Self) -> chrono::Duration {
        self.0.signed_duration_since(earlier.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let parsed = Timestamp::parse_rfc3339("2024-03-01T10:30:00+02:00").expect("valid rfc3339");
        assert_eq!(parsed, Timestamp::from_epoch_secs(1_709_281_800).expect("epoch"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse_rfc3339("yesterday").is_none());
    }
}
