// Calendar helpers. All calendar math is done in UTC.

use chrono::{DateTime, Datelike, Duration, Utc};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// True when `date` falls in `year` / `month0` (zero-based month index)
pub fn is_same_month(date: &DateTime<Utc>, year: i32, month0: u32) -> bool {
    date.year() == year && date.month0() == month0
}

/// Move a (year, zero-based month) pair by `delta` months, rolling the year over
pub fn shift_month(year: i32, month0: u32, delta: i32) -> (i32, u32) {
    let total = year * 12 + month0 as i32 + delta;
    (total.div_euclid(12), total.rem_euclid(12) as u32)
}

/// Whole days until `due`, rounded up. Negative when `due` is in the past.
pub fn days_until(due: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    let diff = (*due - *now).num_milliseconds();
    // ceil division for both signs
    let days = diff.div_euclid(MS_PER_DAY);
    if diff.rem_euclid(MS_PER_DAY) == 0 { days } else { days + 1 }
}

/// `at + by`, clamped to the representable range instead of overflowing
pub fn add_clamped(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(if by < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

pub fn is_today(date: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
    date.date_naive() == now.date_naive()
}

/// Day-granular overdue check: strictly before now and not on today's date
pub fn is_overdue_day(date: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
    date < now && !is_today(date, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_is_same_month_uses_zero_based_index() {
        let date = at(2024, 1, 15, 0);
        assert!(is_same_month(&date, 2024, 0));
        assert!(!is_same_month(&date, 2024, 1));
        assert!(!is_same_month(&date, 2023, 0));
    }

    #[test]
    fn test_shift_month_rolls_year() {
        assert_eq!(shift_month(2024, 0, -1), (2023, 11));
        assert_eq!(shift_month(2024, 11, 1), (2025, 0));
        assert_eq!(shift_month(2024, 3, -5), (2023, 10));
        assert_eq!(shift_month(2024, 5, 0), (2024, 5));
        assert_eq!(shift_month(2024, 0, -25), (2021, 11));
    }

    #[test]
    fn test_days_until_rounds_up() {
        let now = at(2024, 1, 1, 0);
        assert_eq!(days_until(&(now + Duration::hours(1)), &now), 1);
        assert_eq!(days_until(&(now + Duration::days(2)), &now), 2);
        assert_eq!(days_until(&now, &now), 0);
        assert_eq!(days_until(&(now - Duration::hours(1)), &now), 0);
        assert_eq!(days_until(&(now - Duration::hours(25)), &now), -1);
    }

    #[test]
    fn test_overdue_day_ignores_earlier_today() {
        let now = at(2024, 1, 10, 15);
        assert!(!is_overdue_day(&at(2024, 1, 10, 9), &now));
        assert!(is_overdue_day(&at(2024, 1, 9, 23), &now));
        assert!(!is_overdue_day(&at(2024, 1, 11, 0), &now));
        assert!(is_today(&at(2024, 1, 10, 0), &now));
    }

    #[test]
    fn test_add_clamped_saturates() {
        let now = at(2024, 1, 1, 0);
        assert_eq!(add_clamped(now, Duration::days(7)), at(2024, 1, 8, 0));
        assert_eq!(add_clamped(now, Duration::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(add_clamped(now, Duration::MIN), DateTime::<Utc>::MIN_UTC);
    }
}
