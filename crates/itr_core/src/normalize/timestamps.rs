use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::AppError;

/// Stored timestamp layout: RFC3339 UTC with fixed microsecond precision, so that lexical order
/// of the stored text is chronological order (sorting by `created_at` relies on this).
const STORED_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

pub fn format_timestamp(dt: OffsetDateTime) -> Result<String, AppError> {
    dt.to_offset(UtcOffset::UTC)
        .format(STORED_FORMAT)
        .map_err(|e| {
            AppError::new("DB_TIME_FORMAT_FAILED", "Failed to format timestamp")
                .with_details(e.to_string())
        })
}

pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, AppError> {
    PrimitiveDateTime::parse(raw, STORED_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| {
            AppError::new("DB_TIME_PARSE_FAILED", "Failed to parse stored timestamp")
                .with_details(format!("value={raw}; err={e}"))
        })
}

pub fn now_timestamp() -> Result<String, AppError> {
    format_timestamp(OffsetDateTime::now_utc())
}

/// Timestamp for a mutation of a row last touched at `previous`.
///
/// Strictly greater than `previous`: when the wall clock has not moved past it (coarse clocks,
/// skew), the previous value is bumped by one microsecond.
pub fn next_timestamp(previous: &str) -> Result<String, AppError> {
    let prev = parse_timestamp(previous)?;
    let now = OffsetDateTime::now_utc();
    let floor = prev + Duration::microseconds(1);
    format_timestamp(if now >= floor { now } else { floor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_format_round_trips_and_sorts_lexically() {
        let a = parse_timestamp("2026-01-01T00:00:00.000001Z").expect("parse a");
        let b = parse_timestamp("2026-01-01T00:00:00.000010Z").expect("parse b");
        assert!(a < b);
        assert_eq!(
            format_timestamp(a).expect("format"),
            "2026-01-01T00:00:00.000001Z"
        );
        assert!("2026-01-01T00:00:00.000001Z" < "2026-01-01T00:00:00.000010Z");
    }

    #[test]
    fn next_timestamp_advances_past_future_previous() {
        let future = "2999-01-01T00:00:00.000000Z";
        let next = next_timestamp(future).expect("next");
        assert_eq!(next, "2999-01-01T00:00:00.000001Z");
    }

    #[test]
    fn rejects_non_stored_layout() {
        let err = parse_timestamp("2026-01-01 00:00").unwrap_err();
        assert_eq!(err.code, "DB_TIME_PARSE_FAILED");
    }
}
