//! Small helpers shared by handlers.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use error::{AppError, Result};

/// Round to two decimals, the precision of every hour and amount in responses.
pub fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }

/// Reject inverted ranges with 422.
pub fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(AppError::validation(
            "start_date must be on or before end_date",
        ));
    }
    Ok(())
}

/// Longest range, in days, an analytics report covers.
pub const MAX_REPORT_DAYS: i64 = 731;

/// [`check_date_range`] plus a cap on the span, since reports zero-fill every day.
pub fn check_report_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    check_date_range(start, end)?;
    if (end - start).num_days() >= MAX_REPORT_DAYS {
        return Err(AppError::validation(format!(
            "Date range must not exceed {} days",
            MAX_REPORT_DAYS
        )));
    }
    Ok(())
}

/// Half-open UTC bounds `[start 00:00, end + 1 day 00:00)` covering both dates.
pub fn day_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let until = end
        .checked_add_days(Days::new(1))
        .unwrap_or(end)
        .and_time(NaiveTime::MIN)
        .and_utc();
    (from, until)
}

/// Every date from `start` to `end` inclusive.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Monday to Friday between `start` and `end`, minus `holidays`.
pub fn working_days(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> u32 {
    days_in_range(start, end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|d| !holidays.contains(d))
        .count() as u32
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate { date.with_day(1).unwrap_or(date) }

/// Lowercased, trimmed email used for comparisons and storage.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_working_days_skips_weekends_and_holidays() {
        // 2024-01-01 is a Monday
        let none = HashSet::new();
        assert_eq!(working_days(date("2024-01-01"), date("2024-01-07"), &none), 5);

        let holidays: HashSet<_> = [date("2024-01-01"), date("2024-01-06")].into();
        assert_eq!(working_days(date("2024-01-01"), date("2024-01-07"), &holidays), 4);
        assert_eq!(working_days(date("2024-01-06"), date("2024-01-07"), &none), 0);
    }

    #[test]
    fn test_day_bounds_cover_end_date() {
        let (from, until) = day_bounds(date("2024-01-31"), date("2024-01-31"));
        assert_eq!(from.to_rfc3339(), "2024-01-31T00:00:00+00:00");
        assert_eq!(until.to_rfc3339(), "2024-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_check_date_range() {
        assert!(check_date_range(date("2024-01-01"), date("2024-01-01")).is_ok());
        assert_eq!(
            check_date_range(date("2024-02-01"), date("2024-01-01"))
                .unwrap_err()
                .code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_report_range_is_capped() {
        assert!(check_report_range(date("2024-01-01"), date("2025-12-31")).is_ok());
        assert_eq!(
            check_report_range(date("2024-01-01"), date("2026-01-01"))
                .unwrap_err()
                .code(),
            "VALIDATION_ERROR"
        );
        assert!(check_report_range(date("0001-01-01"), date("9999-12-31")).is_err());
    }

    #[test]
    fn test_first_of_month() {
        assert_eq!(first_of_month(date("2024-02-29")), date("2024-02-01"));
    }
}
