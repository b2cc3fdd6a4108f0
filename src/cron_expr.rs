use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::engine::field::FieldSpec;
use crate::{api::Error, engine, first_set_at_or_after, mask_range, value_bit};

pub(crate) const YEAR_MIN: i32 = 1970;
pub(crate) const YEAR_MAX: i32 = 2199;

bitflags::bitflags! {
    /// Day-of-month modifiers that live outside the base bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct DomFlags: u8 {
        /// The expression contained `L` (last day of the month).
        const LAST_DAY     = 1 << 0;
        /// The expression contained `LW` (last workday of the month).
        const LAST_WORKDAY = 1 << 1;
    }
}

/// A compiled cron expression.
///
/// Every field is a bitmask in the crate's top-down encoding (bit `i` from the
/// most-significant end stands for value `i`). The day-of-week mask is stored
/// pre-expanded: the 7-bit weekday pattern is replicated across consecutive
/// week windows and shifted so that bit 1 lines up with "day-of-month 1 when
/// the month starts on Sunday" (see [`expand_days_of_week`]). The `L`, `LW`,
/// `dW`, `wL` and `w#n` modifiers do not fit the base masks and are carried in
/// side channels, combined by the days-of-month resolver.
///
/// A `CronExpr` is immutable once built. The only constructors are
/// [`crate::compile`] (and the equivalent `FromStr`) and
/// [`CronExpr::from_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronExpr {
    pub(crate) seconds: u64,
    pub(crate) minutes: u64,
    pub(crate) hours: u64,
    pub(crate) days_of_month: u64,
    pub(crate) months: u64,
    pub(crate) days_of_week: u64,
    pub(crate) years: YearMask,
    /// Bit `d` set: the expression contained `dW` (nearest workday to day `d`).
    pub(crate) workdays_of_month: u64,
    /// Bit `(n - 1) * 7 + w` set: the expression contained `w#n`.
    pub(crate) nth_weekdays: u64,
    /// Bit `w` set: the expression contained `wL` (last weekday `w`).
    pub(crate) last_weekdays: u64,
    pub(crate) flags: DomFlags,
}

impl CronExpr {
    /// Build an expression from six raw field masks.
    ///
    /// Masks use the top-down encoding: bit `i` from the most-significant end
    /// is value `i` (day-of-month and month start at bit 1, day-of-week
    /// accepts bits 0..=7 with 7 as a Sunday alias). Bits outside a field's
    /// valid window are discarded. The year defaults to every year in bounds,
    /// and no extended modifiers are set. This is the constructor behind the
    /// `@`-alias paths and is handy for tests.
    pub fn from_fields(
        seconds: u64,
        minutes: u64,
        hours: u64,
        days_of_month: u64,
        months: u64,
        days_of_week: u64,
    ) -> Self {
        CronExpr {
            seconds: seconds & FieldSpec::SECOND.full_mask(),
            minutes: minutes & FieldSpec::MINUTE.full_mask(),
            hours: hours & FieldSpec::HOUR.full_mask(),
            days_of_month: days_of_month & FieldSpec::DAY_OF_MONTH.full_mask(),
            months: months & FieldSpec::MONTH.full_mask(),
            days_of_week: expand_days_of_week(days_of_week & FieldSpec::DAY_OF_WEEK.full_mask()),
            years: YearMask::all(),
            workdays_of_month: 0,
            nth_weekdays: 0,
            last_weekdays: 0,
            flags: DomFlags::empty(),
        }
    }

    /// The next instant strictly after `from` that satisfies this expression,
    /// or `None` when no such instant exists within the year bounds.
    pub fn next_after(&self, from: DateTime) -> Option<DateTime> {
        engine::next_fire::next_after(self, from)
    }

    /// Like [`CronExpr::next_after`], over chrono's naive local datetime.
    pub fn next_after_naive(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        self.next_after(from.into())?.to_naive()
    }

    /// Iterate the fire times strictly after `from`, in order.
    pub fn upcoming(&self, from: DateTime) -> Upcoming<'_> {
        Upcoming { expr: self, cursor: Some(from) }
    }

    /// True when the day-of-month side places no constraint (`*` or `?` with
    /// no modifiers).
    pub(crate) fn day_of_month_unrestricted(&self) -> bool {
        self.days_of_month == FieldSpec::DAY_OF_MONTH.full_mask()
            && self.workdays_of_month == 0
            && self.flags.is_empty()
    }

    /// True when the day-of-week side places no constraint.
    pub(crate) fn day_of_week_unrestricted(&self) -> bool {
        self.days_of_week == expand_days_of_week(FieldSpec::DAY_OF_WEEK.full_mask())
            && self.nth_weekdays == 0
            && self.last_weekdays == 0
    }
}

impl FromStr for CronExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        engine::compiler::compile(s)
    }
}

/// Expand a raw day-of-week mask (bits 0..=7, Sunday first) into the aligned
/// multi-week form stored in [`CronExpr`].
///
/// Steps: fold the Sunday-as-7 alias onto bit 0, replicate the 7-bit weekday
/// window across six consecutive windows, then shift down one so that bit 1
/// is "day-of-month 1 when the month starts on Sunday". The resolver later
/// shifts the whole mask by the month's first weekday, which lands each
/// weekday bit on every date of the month with that weekday. Six windows (not
/// five) so that days 30/31 stay covered after a shift of up to six.
pub(crate) fn expand_days_of_week(raw: u64) -> u64 {
    let mut week = raw;
    if week & value_bit(7) != 0 {
        week |= value_bit(0);
    }
    week &= mask_range(0, 6);

    let mut replicated = 0u64;
    for i in 0..6 {
        replicated |= week >> (7 * i);
    }
    replicated >> 1
}

// --- Year mask ----------------------------------------------------------------

/// Bitmask over the supported years, 1970..=2199, one bit per year across four
/// 64-bit words (index = year − 1970, top-down within each word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMask([u64; 4]);

impl YearMask {
    pub(crate) fn empty() -> Self {
        YearMask([0; 4])
    }

    /// Every year in bounds: 230 bits across the four words.
    pub(crate) fn all() -> Self {
        YearMask([!0, !0, !0, !0 << 26])
    }

    pub(crate) fn set(&mut self, year: u32) {
        debug_assert!((YEAR_MIN as u32..=YEAR_MAX as u32).contains(&year));
        let index = year - YEAR_MIN as u32;
        self.0[(index / 64) as usize] |= value_bit(index % 64);
    }

    /// The smallest in-mask year at or after `year`, if any.
    pub(crate) fn next_at_or_after(&self, year: i32) -> Option<i32> {
        if year > YEAR_MAX {
            return None;
        }
        let start = (year - YEAR_MIN).max(0) as u32;
        let mut word = (start / 64) as usize;
        let mut pos = start % 64;
        while word < self.0.len() {
            if let Some(bit) = first_set_at_or_after(self.0[word], pos) {
                return Some(YEAR_MIN + word as i32 * 64 + bit as i32);
            }
            word += 1;
            pos = 0;
        }
        None
    }
}

// --- Broken-down instants -----------------------------------------------------

/// A broken-down instant with no time-zone semantics.
///
/// Conversion to and from absolute time is the caller's responsibility; the
/// engine only ever compares and advances these fields. Ordering is the
/// natural chronological one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl DateTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        DateTime { year, month, day, hour, minute, second }
    }

    /// Convert to a chrono naive datetime; `None` for out-of-range fields.
    pub fn to_naive(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_hms_opt(self.hour, self.minute, self.second)
    }
}

impl From<NaiveDateTime> for DateTime {
    fn from(dt: NaiveDateTime) -> Self {
        DateTime {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Iterator over successive fire times, each strictly after the previous.
#[derive(Debug, Clone)]
pub struct Upcoming<'a> {
    expr: &'a CronExpr,
    cursor: Option<DateTime>,
}

impl Iterator for Upcoming<'_> {
    type Item = DateTime;

    fn next(&mut self) -> Option<DateTime> {
        let fire = self.expr.next_after(self.cursor?)?;
        self.cursor = Some(fire);
        Some(fire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_replicates_weekday_pattern() {
        // Monday only: occurrences at offsets 2, 9, 16, ... in a Sunday-first month.
        let expanded = expand_days_of_week(value_bit(1));
        let expected: u64 = [2u32, 9, 16, 23, 30, 37].iter().map(|&i| value_bit(i)).fold(0, |a, b| a | b);
        assert_eq!(expanded, expected);
    }

    #[test]
    fn expand_folds_sunday_alias() {
        assert_eq!(expand_days_of_week(value_bit(7)), expand_days_of_week(value_bit(0)));
    }

    #[test]
    fn from_fields_discards_out_of_window_bits() {
        let expr = CronExpr::from_fields(!0, !0, !0, !0, !0, !0);
        assert_eq!(expr.seconds, FieldSpec::SECOND.full_mask());
        assert_eq!(expr.hours, FieldSpec::HOUR.full_mask());
        assert!(expr.day_of_month_unrestricted());
        assert!(expr.day_of_week_unrestricted());
    }

    #[test]
    fn year_mask_scans_across_words() {
        let mut years = YearMask::empty();
        years.set(1999);
        years.set(2120);
        assert_eq!(years.next_at_or_after(1970), Some(1999));
        assert_eq!(years.next_at_or_after(1999), Some(1999));
        assert_eq!(years.next_at_or_after(2000), Some(2120));
        assert_eq!(years.next_at_or_after(2121), None);
        assert_eq!(years.next_at_or_after(2500), None);
    }

    #[test]
    fn year_mask_all_spans_the_bounds() {
        let years = YearMask::all();
        assert_eq!(years.next_at_or_after(1969), Some(1970));
        assert_eq!(years.next_at_or_after(2199), Some(2199));
        assert_eq!(years.next_at_or_after(2200), None);
    }

    #[test]
    fn datetime_orders_chronologically() {
        let earlier = DateTime::new(2013, 2, 28, 23, 59, 59);
        let later = DateTime::new(2013, 3, 1, 0, 0, 0);
        assert!(earlier < later);
        assert_eq!(later.to_string(), "2013-03-01 00:00:00");
    }

    #[test]
    fn datetime_round_trips_through_chrono() {
        let naive = NaiveDate::from_ymd_opt(2016, 2, 29).unwrap().and_hms_opt(12, 30, 45).unwrap();
        let dt = DateTime::from(naive);
        assert_eq!(dt, DateTime::new(2016, 2, 29, 12, 30, 45));
        assert_eq!(dt.to_naive(), Some(naive));
    }
}
