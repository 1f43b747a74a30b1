//! Human-readable due-date descriptions.

use chrono::{Datelike, NaiveDate};

/// Describe a due date relative to `today`, calendar-aware: "2 years
/// 1 month 3 days", "Today", "Date has passed", or "No due date".
pub fn describe_due_date(due_date: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(target) = due_date else {
        return "No due date".to_string();
    };
    if target < today {
        return "Date has passed".to_string();
    }

    let (years, months, days) = calendar_delta(today, target);
    let mut parts = Vec::new();
    if years > 0 {
        parts.push(plural(years, "year"));
    }
    if months > 0 {
        parts.push(plural(months, "month"));
    }
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if parts.is_empty() {
        "Today".to_string()
    } else {
        parts.join(" ")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Whole years, months, and days from `from` to `to` (`from <= to`),
/// borrowing days from the month preceding `to` when needed.
fn calendar_delta(from: NaiveDate, to: NaiveDate) -> (i64, i64, i64) {
    let mut years = (to.year() - from.year()) as i64;
    let mut months = to.month() as i64 - from.month() as i64;
    let mut days = to.day() as i64 - from.day() as i64;

    if days < 0 {
        months -= 1;
        let (year, month) = if to.month() == 1 {
            (to.year() - 1, 12)
        } else {
            (to.year(), to.month() - 1)
        };
        days += days_in_month(year, month);
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }

    (years, months, days)
}

fn days_in_month(year: i32, month: u32) -> i64 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days(),
        _ => 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn no_due_date() {
        assert_eq!(describe_due_date(None, date("2026-08-27")), "No due date");
    }

    #[test]
    fn past_date() {
        assert_eq!(
            describe_due_date(Some(date("2026-08-26")), date("2026-08-27")),
            "Date has passed"
        );
    }

    #[test]
    fn same_day_is_today() {
        assert_eq!(
            describe_due_date(Some(date("2026-08-27")), date("2026-08-27")),
            "Today"
        );
    }

    #[test]
    fn simple_day_counts() {
        assert_eq!(
            describe_due_date(Some(date("2026-08-28")), date("2026-08-27")),
            "1 day"
        );
        assert_eq!(
            describe_due_date(Some(date("2026-09-03")), date("2026-08-27")),
            "7 days"
        );
    }

    #[test]
    fn mixed_units_and_pluralization() {
        assert_eq!(
            describe_due_date(Some(date("2027-09-28")), date("2026-08-27")),
            "1 year 1 month 1 day"
        );
        assert_eq!(
            describe_due_date(Some(date("2028-11-30")), date("2026-08-27")),
            "2 years 3 months 3 days"
        );
    }

    #[test]
    fn day_borrow_crosses_month_boundary() {
        // 2026-08-27 to 2026-10-05: one month to 2026-09-27, then 8 days.
        assert_eq!(
            describe_due_date(Some(date("2026-10-05")), date("2026-08-27")),
            "1 month 8 days"
        );
    }
}
