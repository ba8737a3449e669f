use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses an ISO-8601 instant. A timestamp with no UTC offset ("naive") is
/// interpreted as UTC — the same fallback `mongo_handler.py` applies via
/// `timestamp.replace(tzinfo=timezone.utc)` when `datetime.fromisoformat`
/// returns a naive value.
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_aware() {
        let dt = parse_utc("2025-06-06T17:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-06T17:30:00+00:00");
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let dt = parse_utc("2025-06-06T17:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-06T17:30:00+00:00");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_utc("not-a-date").is_err());
    }
}
