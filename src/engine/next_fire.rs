//! The next-fire search.
//!
//! The search walks the fields top-down (year, month, day, hour, minute,
//! second). Its invariant: by the time a field is checked, every field above
//! it already matches the expression, so a mismatch is repaired by advancing
//! the field to the next set bit (resetting everything below to its minimum)
//! or, when the mask holds nothing further, bumping the field above and
//! re-entering the walk. Every step strictly increases the candidate instant
//! and the year mask is bounded, so the walk terminates.

use crate::cron_expr::{CronExpr, DateTime};
use crate::engine::{calendar, days};
use crate::first_set_at_or_after;

/// The smallest instant strictly after `from` satisfying `expr`, or `None`
/// once the year bounds are exhausted.
pub(crate) fn next_after(expr: &CronExpr, from: DateTime) -> Option<DateTime> {
    let debug = std::env::var_os("CRONMASK_DEBUG").is_some();

    // Strictly after: start the walk one second later.
    let mut t = tick(from);
    if debug {
        eprintln!("[next-fire] searching after {from}, candidate {t}");
    }

    loop {
        let Some(year) = expr.years.next_at_or_after(t.year) else {
            if debug {
                eprintln!("[next-fire] year bounds exhausted at {}", t.year);
            }
            return None;
        };
        if year != t.year {
            t = DateTime::new(year, 1, 1, 0, 0, 0);
        }

        let Some(month) = first_set_at_or_after(expr.months, t.month) else {
            t = DateTime::new(t.year + 1, 1, 1, 0, 0, 0);
            continue;
        };
        if month != t.month {
            t = DateTime::new(t.year, month, 1, 0, 0, 0);
        }

        let month_days = days::actual_days(expr, t.year, t.month);
        let Some(day) = first_set_at_or_after(month_days, t.day) else {
            t = advance_month(t);
            continue;
        };
        if day != t.day {
            t = DateTime::new(t.year, t.month, day, 0, 0, 0);
        }

        let Some(hour) = first_set_at_or_after(expr.hours, t.hour) else {
            t = DateTime::new(t.year, t.month, t.day + 1, 0, 0, 0);
            continue;
        };
        if hour != t.hour {
            t.hour = hour;
            t.minute = 0;
            t.second = 0;
        }

        let Some(minute) = first_set_at_or_after(expr.minutes, t.minute) else {
            t.hour += 1;
            t.minute = 0;
            t.second = 0;
            continue;
        };
        if minute != t.minute {
            t.minute = minute;
            t.second = 0;
        }

        let Some(second) = first_set_at_or_after(expr.seconds, t.second) else {
            t.minute += 1;
            t.second = 0;
            continue;
        };
        t.second = second;

        if debug {
            eprintln!("[next-fire] matched {t}");
        }
        return Some(t);
    }
}

/// `from` advanced by one second, rolling through the calendar as needed.
fn tick(from: DateTime) -> DateTime {
    let mut t = from;
    t.second += 1;
    if t.second > 59 {
        t.second = 0;
        t.minute += 1;
    }
    if t.minute > 59 {
        t.minute = 0;
        t.hour += 1;
    }
    if t.hour > 23 {
        t.hour = 0;
        t.day += 1;
    }
    if t.day > calendar::length_of_month(t.year, t.month) {
        t.day = 1;
        t.month += 1;
    }
    if t.month > 12 {
        t.month = 1;
        t.year += 1;
    }
    t
}

fn advance_month(t: DateTime) -> DateTime {
    if t.month >= 12 {
        DateTime::new(t.year + 1, 1, 1, 0, 0, 0)
    } else {
        DateTime::new(t.year, t.month + 1, 1, 0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compiler::compile;

    fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime {
        DateTime::new(year, month, day, hour, minute, second)
    }

    #[test]
    fn tick_rolls_through_calendar_boundaries() {
        assert_eq!(tick(dt(2013, 1, 1, 0, 0, 0)), dt(2013, 1, 1, 0, 0, 1));
        assert_eq!(tick(dt(2013, 1, 1, 0, 0, 59)), dt(2013, 1, 1, 0, 1, 0));
        assert_eq!(tick(dt(2013, 2, 28, 23, 59, 59)), dt(2013, 3, 1, 0, 0, 0));
        assert_eq!(tick(dt(2016, 2, 28, 23, 59, 59)), dt(2016, 2, 29, 0, 0, 0));
        assert_eq!(tick(dt(2013, 12, 31, 23, 59, 59)), dt(2014, 1, 1, 0, 0, 0));
    }

    #[test]
    fn exact_match_still_moves_strictly_forward() {
        let expr = compile("0 0 0 * * *").unwrap();
        let midnight = dt(2013, 5, 10, 0, 0, 0);
        assert_eq!(next_after(&expr, midnight), Some(dt(2013, 5, 11, 0, 0, 0)));
    }

    #[test]
    fn empty_month_days_cascade_to_later_months() {
        // Day 30 does not exist in February; fire in January then March.
        let expr = compile("0 0 0 30 * *").unwrap();
        assert_eq!(next_after(&expr, dt(2013, 1, 30, 0, 0, 0)), Some(dt(2013, 3, 30, 0, 0, 0)));
    }

    #[test]
    fn month_restriction_cascades_to_next_year() {
        let expr = compile("0 0 0 1 1 * *").unwrap();
        assert_eq!(next_after(&expr, dt(2013, 1, 1, 0, 0, 0)), Some(dt(2014, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn year_bounds_exhaust_to_none() {
        let expr = compile("0 0 0 1 1 * 1999").unwrap();
        assert_eq!(next_after(&expr, dt(2013, 6, 1, 0, 0, 0)), None);

        let every = compile("* * * * * * *").unwrap();
        assert_eq!(next_after(&every, dt(2199, 12, 31, 23, 59, 59)), None);
    }

    #[test]
    fn year_gap_resets_lower_fields() {
        let expr = compile("0 0 0 1 1 * 1999,2050").unwrap();
        assert_eq!(next_after(&expr, dt(2013, 6, 1, 12, 30, 30)), Some(dt(2050, 1, 1, 0, 0, 0)));
    }
}
