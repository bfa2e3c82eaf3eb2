// 📅 Date Normalizer - Resolve optional filter dates into a concrete range
//
// Missing start  -> epoch floor (include all history)
// Missing end    -> "today" as supplied by the caller
// Empty strings count as missing, the way report filter widgets submit them.

use crate::error::{Result, StatementError};
use crate::model::DateRange;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse one date input.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339; only the
/// calendar date is kept. Returns `Ok(None)` for empty input.
pub fn parse_date(input: &str) -> Result<Option<NaiveDate>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(Some(datetime.date()));
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(datetime.date_naive()));
    }

    Err(StatementError::InvalidDate {
        input: input.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

/// Resolve optional start/end inputs into an ordered range.
///
/// `start > end` after defaults are applied is a caller error and is never
/// swapped or clamped.
pub fn normalize_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
    epoch_floor: NaiveDate,
) -> Result<DateRange> {
    let start = match start {
        Some(raw) => parse_date(raw)?,
        None => None,
    }
    .unwrap_or(epoch_floor);

    let end = match end {
        Some(raw) => parse_date(raw)?,
        None => None,
    }
    .unwrap_or(today);

    if start > end {
        return Err(StatementError::InvalidRange { start, end });
    }

    Ok(DateRange { start, end })
}
