//! ISO-8601 millisecond timestamp serialization.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp as ISO-8601 with millisecond precision and a `Z`
/// suffix, e.g. `2024-01-01T00:00:00.123Z`.
pub fn format_iso8601_millis(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for ISO-8601 millisecond timestamps.
pub mod iso8601_millis {
    use super::format_iso8601_millis;
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_iso8601_millis(timestamp))
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
    use chrono::TimeZone;

    #[test]
    fn formats_with_millis_and_z_suffix() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_iso8601_millis(&dt), "2024-01-01T00:00:00.000Z");

        let dt = dt + chrono::Duration::milliseconds(123);
        assert_eq!(format_iso8601_millis(&dt), "2024-01-01T00:00:00.123Z");
    }

    #[test]
    fn truncates_sub_millisecond_precision() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 45).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(format_iso8601_millis(&dt), "2024-06-01T12:30:45.123Z");
    }
}
