//! Resolution-date parsing.
//!
//! Sources disagree on how they spell a resolution time. Accepted, in order:
//!
//! 1. warehouse epoch form: `"1749986095.300000000 1440"` (seconds, optional
//!    fraction, optional trailing offset token which is ignored; the epoch is UTC)
//! 2. RFC 3339: `2026-10-18T09:30:00Z`
//! 3. offset without colon: `2026-10-18T09:30:00.000+0000`
//! 4. naive datetime, `T` or space separated, read as UTC
//! 5. bare date, read as midnight UTC

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::DateParseError;

pub fn parse_resolution_date(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(DateParseError::Missing);
    }
    if let Some(ts) = parse_epoch(s) {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(DateParseError::Malformed(s.to_string()))
}

/// `<secs>[.<fraction>][ <offset>]`, all ASCII digits.
fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    let mut tokens = s.split_whitespace();
    let value = tokens.next()?;
    match (tokens.next(), tokens.next()) {
        (None, _) => {}
        (Some(offset), None) if is_digits(offset.trim_start_matches('-')) => {}
        _ => return None,
    }

    let (secs, frac) = match value.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (value, ""),
    };
    if !is_digits(secs) || !(frac.is_empty() || is_digits(frac)) {
        return None;
    }
    let secs: i64 = secs.parse().ok()?;

    // Keep nanosecond precision; digits past the ninth are truncated.
    let mut nanos: u32 = 0;
    for (i, d) in frac.bytes().take(9).enumerate() {
        nanos += u32::from(d - b'0') * 10u32.pow(8 - i as u32);
    }
    DateTime::from_timestamp(secs, nanos)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn warehouse_epoch_with_offset_token() {
        let ts = parse_resolution_date("1749986095.300000000 1440").unwrap();
        assert_eq!(ts.timestamp(), 1_749_986_095);
        assert_eq!(ts.nanosecond(), 300_000_000);
    }

    #[test]
    fn bare_epoch_seconds() {
        let ts = parse_resolution_date("1750937389").unwrap();
        assert_eq!(ts.timestamp(), 1_750_937_389);
    }

    #[test]
    fn rfc3339_and_offsets() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 18, 7, 30, 0).unwrap();
        assert_eq!(
            parse_resolution_date("2026-10-18T09:30:00+02:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_resolution_date("2026-10-18T07:30:00.000+0000").unwrap(),
            expected
        );
        assert_eq!(
            parse_resolution_date("2026-10-18T07:30:00Z").unwrap(),
            expected
        );
    }

    #[test]
    fn naive_forms_are_utc() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 18, 7, 30, 0).unwrap();
        assert_eq!(parse_resolution_date("2026-10-18T07:30:00").unwrap(), expected);
        assert_eq!(parse_resolution_date("2026-10-18 07:30:00").unwrap(), expected);
        assert_eq!(
            parse_resolution_date(" 2026-10-18 ").unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_is_missing() {
        assert_eq!(parse_resolution_date("   "), Err(DateParseError::Missing));
    }

    #[test]
    fn garbage_is_malformed() {
        for raw in ["soon", "17499.86.095", "1749986095 abc", "2026-13-40", "1 2 3"] {
            assert!(
                matches!(parse_resolution_date(raw), Err(DateParseError::Malformed(_))),
                "expected malformed: {raw}"
            );
        }
    }
}
