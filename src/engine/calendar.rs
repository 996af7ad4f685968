//! Due-date arithmetic for installment schedules.

use chrono::{Days, Months, NaiveDate};

/// Due date of the first installment: the day after the date given on the negotiation.
pub fn first_due_date(seed: NaiveDate) -> Option<NaiveDate> {
    seed.checked_add_days(Days::new(1))
}

/// Advance by one calendar month, keeping the day of month and clamping to the
/// last day when the target month is shorter (Jan 31 -> Feb 28/29).
pub fn add_one_month(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_due_date_is_next_day() {
        assert_eq!(first_due_date(date(2024, 1, 1)), Some(date(2024, 1, 2)));
        assert_eq!(first_due_date(date(2023, 12, 31)), Some(date(2024, 1, 1)));
        assert_eq!(first_due_date(date(2024, 2, 28)), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_add_one_month_same_day() {
        assert_eq!(add_one_month(date(2024, 1, 2)), Some(date(2024, 2, 2)));
        assert_eq!(add_one_month(date(2024, 12, 15)), Some(date(2025, 1, 15)));
    }

    #[test]
    fn test_add_one_month_clamps_end_of_month() {
        assert_eq!(add_one_month(date(2023, 1, 31)), Some(date(2023, 2, 28)));
        assert_eq!(add_one_month(date(2024, 1, 31)), Some(date(2024, 2, 29)));
        assert_eq!(add_one_month(date(2024, 3, 31)), Some(date(2024, 4, 30)));
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(first_due_date(NaiveDate::MAX), None);
        assert_eq!(add_one_month(NaiveDate::MAX), None);
    }
}
