//! Per-month day resolution.
//!
//! The compiled day constraints live in several places: the base day-of-month
//! mask, the expanded day-of-week mask, and the `L`/`LW`/`dW`/`wL`/`w#n` side
//! channels. `actual_days` merges them with the real calendar of one
//! (year, month) into a single 31-bit mask of firing days. An unrestricted
//! side contributes nothing; when both sides are restricted the union is
//! taken, per the crontab convention.

use crate::cron_expr::{CronExpr, DomFlags};
use crate::engine::calendar;
use crate::{mask_range, set_bits, value_bit};

const SUNDAY: u32 = 0;
const SATURDAY: u32 = 6;

/// The days of (year, month) on which the expression fires, as a mask with
/// bit 1 = the first of the month.
pub(crate) fn actual_days(expr: &CronExpr, year: i32, month: u32) -> u64 {
    let last_day = calendar::length_of_month(year, month);
    let this_months_mask = mask_range(1, last_day);

    let dom_unrestricted = expr.day_of_month_unrestricted();
    let dow_unrestricted = expr.day_of_week_unrestricted();
    if dom_unrestricted && dow_unrestricted {
        return this_months_mask;
    }

    let first_weekday = calendar::day_of_week(year, month, 1);
    let last_weekday = calendar::day_of_week(year, month, last_day);
    let mut days = 0u64;

    if !dom_unrestricted {
        days |= expr.days_of_month;
        if expr.flags.contains(DomFlags::LAST_DAY) {
            days |= value_bit(last_day);
        }
        if expr.flags.contains(DomFlags::LAST_WORKDAY) {
            days |= value_bit(nearest_workday(last_day, last_weekday, last_day));
        }
        for target in set_bits(expr.workdays_of_month) {
            if target > last_day {
                continue;
            }
            let weekday = calendar::day_of_week(year, month, target);
            days |= value_bit(nearest_workday(target, weekday, last_day));
        }
    }

    if !dow_unrestricted {
        // The expanded mask has bit 1 = "day 1 of a Sunday-first month";
        // shifting by the actual first weekday lands every weekday bit on
        // every date of the month with that weekday.
        days |= expr.days_of_week << first_weekday;

        for index in set_bits(expr.nth_weekdays) {
            let (nth, weekday) = (index / 7, index % 7);
            let day = 1 + (7 + weekday - first_weekday) % 7 + 7 * nth;
            if day <= last_day {
                days |= value_bit(day);
            }
        }
        for weekday in set_bits(expr.last_weekdays) {
            days |= value_bit(last_day - (7 + last_weekday - weekday) % 7);
        }
    }

    days & this_months_mask
}

/// Nearest workday to `target` without leaving the month: Saturday pulls back
/// a day, Sunday pushes forward a day. A weekend on day 1 resolves to day 3,
/// and a Sunday on the last day falls back to the preceding Friday.
fn nearest_workday(target: u32, weekday: u32, last_day: u32) -> u32 {
    match weekday {
        SATURDAY => {
            if target == 1 {
                3
            } else {
                target - 1
            }
        }
        SUNDAY => {
            if target == 1 {
                3
            } else if target >= last_day {
                target - 2
            } else {
                target + 1
            }
        }
        _ => target,
    }
}
