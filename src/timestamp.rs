use chrono::{DateTime, FixedOffset};

/// Parse a CAP date-time such as `2015-08-15T20:45:00-05:00`.
///
/// The UTC offset is kept as sent. Whitespace around the value is ignored.
pub fn parse_cap_timestamp(s: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s.trim())
}

/// Parse an optional field, treating an empty string as "not present".
pub(crate) fn parse_optional(s: &str) -> Result<Option<DateTime<FixedOffset>>, chrono::ParseError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        parse_cap_timestamp(s).map(Some)
    }
}
