//! Business-date helpers
//!
//! Journal days follow the store's local timezone, not UTC; a payment at
//! 23:30 La Paz time belongs to that local date.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::db::repository::{RepoError, RepoResult};

/// Validate date format (YYYY-MM-DD)
pub fn parse_date(date: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| RepoError::Validation(format!("Invalid date format: {}", date)))
}

/// Validate date is not in the future (local to `tz`)
pub fn validate_not_future_date(date: &str, tz: Tz) -> RepoResult<NaiveDate> {
    let parsed = parse_date(date)?;
    let today = chrono::Utc::now().with_timezone(&tz).date_naive();
    if parsed > today {
        return Err(RepoError::Validation(format!(
            "Date cannot be in the future: {}",
            date
        )));
    }
    Ok(parsed)
}

/// UTC millis range [start, end) covering one local calendar date
pub fn local_day_bounds_millis(date: NaiveDate, tz: Tz) -> (i64, i64) {
    let start = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        // DST gap at midnight: fall back to interpreting midnight as UTC
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis());
    let next = date + chrono::Duration::days(1);
    let end = next
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| next.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis());
    (start, end)
}

/// Local calendar date of a UTC-millis instant
pub fn local_date_of_millis(millis: i64, tz: Tz) -> NaiveDate {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(chrono::Utc::now)
        .with_timezone(&tz)
        .date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2025-03-14").is_ok());
        assert!(parse_date("14/03/2025").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }

    #[test]
    fn test_local_day_bounds_cover_one_day() {
        let tz: Tz = "America/La_Paz".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let (start, end) = local_day_bounds_millis(date, tz);
        assert_eq!(end - start, 24 * 3600 * 1000); // no DST in Bolivia
        assert_eq!(local_date_of_millis(start, tz), date);
        assert_eq!(local_date_of_millis(end - 1, tz), date);
        assert_ne!(local_date_of_millis(end, tz), date);
    }
}
