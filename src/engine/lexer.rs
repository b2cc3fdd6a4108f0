//! Field lexing: one whitespace-delimited field into bitmask form.
//!
//! Each field understands the common grammar (`*`, single values, inclusive
//! ranges with wrap-around, `/step` forms, comma lists) plus the extended
//! day-of-month and day-of-week syntax (`?`, `L`, `LW`, `dW`, `wL`, `w#n`).
//! The base grammar produces bits in the field's own mask; the extended
//! tokens land in the side-channel masks and flags on `CronExpr`, to be
//! combined per month by the days resolver.
//!
//! Everything here is whole-token: any element that fails to parse rejects
//! the expression with the field kind and the offending field text. No
//! partially-lexed state escapes.

use crate::api::Error;
use crate::cron_expr::{CronExpr, DomFlags, YearMask};
use crate::engine::field::{FieldKind, FieldSpec};
use crate::value_bit;

/// Lex a field with the common grammar only (seconds, minutes, hours, month,
/// and the plain parts of day fields).
pub(crate) fn lex(spec: &FieldSpec, field: &str) -> Result<u64, Error> {
    let mut mask = 0u64;
    for element in field.split(',') {
        mask |= lex_element(spec, element, field)?;
    }
    Ok(mask)
}

/// Lex the day-of-month field, including `?`, `L`, `LW` and `dW`.
///
/// `?` must stand alone and compiles to the full mask (the unrestricted
/// sentinel, indistinguishable from `*`). Modifiers may appear as list
/// elements; their effects are additive.
pub(crate) fn lex_day_of_month(field: &str, expr: &mut CronExpr) -> Result<(), Error> {
    let spec = &FieldSpec::DAY_OF_MONTH;
    if field == "?" {
        expr.days_of_month = spec.full_mask();
        return Ok(());
    }

    let mut base = 0u64;
    for element in field.split(',') {
        if element.eq_ignore_ascii_case("l") {
            expr.flags |= DomFlags::LAST_DAY;
        } else if element.eq_ignore_ascii_case("lw") {
            expr.flags |= DomFlags::LAST_WORKDAY;
        } else if let Some(caps) = regex!(r"(?i)^([0-9]{1,2})w$").captures(element) {
            let day = caps[1].parse().ok().filter(|day| spec.contains(*day)).ok_or_else(|| invalid(spec, field))?;
            expr.workdays_of_month |= value_bit(day);
        } else {
            base |= lex_element(spec, element, field)?;
        }
    }
    // A modifiers-only field (say `L`) leaves the base mask empty; the
    // resolver still treats the side as restricted.
    expr.days_of_month = base;
    Ok(())
}

/// Lex the day-of-week field, including `?`, `wL` and `w#n`.
///
/// Weekdays may be numeric (0..7, 7 = Sunday alias) or named; `w` in the
/// extended forms is normalized to Sunday = 0 here, while the base mask keeps
/// raw bit 7 for the compiler's adjustment pass to fold.
pub(crate) fn lex_day_of_week(field: &str, expr: &mut CronExpr) -> Result<(), Error> {
    let spec = &FieldSpec::DAY_OF_WEEK;
    if field == "?" {
        expr.days_of_week = spec.full_mask();
        return Ok(());
    }

    let mut base = 0u64;
    for element in field.split(',') {
        if let Some(caps) = regex!(r"(?i)^([0-9a-z]+)#([0-9])$").captures(element) {
            let weekday = weekday_of(&caps[1]).ok_or_else(|| invalid(spec, field))?;
            let nth: u32 = caps[2].parse().ok().filter(|n| (1..=5).contains(n)).ok_or_else(|| invalid(spec, field))?;
            expr.nth_weekdays |= value_bit((nth - 1) * 7 + weekday);
        } else if let Some(caps) = regex!(r"(?i)^([0-9a-z]+)l$").captures(element) {
            let weekday = weekday_of(&caps[1]).ok_or_else(|| invalid(spec, field))?;
            expr.last_weekdays |= value_bit(weekday);
        } else {
            base |= lex_element(spec, element, field)?;
        }
    }
    expr.days_of_week = base;
    Ok(())
}

/// Lex the year field into its four-word mask. Wrap-around is forbidden.
pub(crate) fn lex_year(field: &str) -> Result<YearMask, Error> {
    let spec = &FieldSpec::YEAR;
    let mut years = YearMask::empty();
    for element in field.split(',') {
        let (base, step_token) = split_step(element);
        let step = match step_token {
            Some(token) => parse_step(spec, token, field)?,
            None => 1,
        };
        let (lo, hi) = if base == "*" {
            (spec.min, spec.max)
        } else if let Some((a, b)) = base.split_once('-') {
            let a = spec.value_of(a).ok_or_else(|| invalid(spec, field))?;
            let b = spec.value_of(b).ok_or_else(|| invalid(spec, field))?;
            if a > b {
                return Err(invalid(spec, field));
            }
            (a, b)
        } else {
            let value = spec.value_of(base).ok_or_else(|| invalid(spec, field))?;
            if step_token.is_some() { (value, spec.max) } else { (value, value) }
        };

        let mut year = lo;
        while year <= hi {
            years.set(year);
            year += step;
        }
    }
    Ok(years)
}

fn lex_element(spec: &FieldSpec, element: &str, field: &str) -> Result<u64, Error> {
    if element == "*" {
        return Ok(spec.full_mask());
    }

    let (base, step_token) = split_step(element);
    let step = match step_token {
        Some(token) => parse_step(spec, token, field)?,
        None => 1,
    };

    let (from, to) = if base == "*" {
        (spec.min, spec.max)
    } else if let Some((a, b)) = base.split_once('-') {
        let a = spec.value_of(a).ok_or_else(|| invalid(spec, field))?;
        let b = spec.value_of(b).ok_or_else(|| invalid(spec, field))?;
        (a, b)
    } else {
        let value = spec.value_of(base).ok_or_else(|| invalid(spec, field))?;
        // `n/step` means n..max; a bare value is just itself.
        if step_token.is_some() { (value, spec.max) } else { (value, value) }
    };

    Ok(stepped(spec, from, to, step))
}

/// Emit every `step`-th value of the inclusive span, wrapping through the
/// field's window when `from > to`. The wrap re-enters at 1 for day-of-week
/// (7 is a Sunday alias, folded later) and at the field minimum otherwise.
fn stepped(spec: &FieldSpec, from: u32, to: u32, step: u32) -> u64 {
    let mut mask = 0u64;
    if from <= to {
        let mut value = from;
        while value <= to {
            mask |= value_bit(value);
            value += step;
        }
    } else {
        let low = if matches!(spec.kind, FieldKind::DayOfWeek) { 1 } else { spec.min };
        for (index, value) in (from..=spec.max).chain(low..=to).enumerate() {
            if index as u32 % step == 0 {
                mask |= value_bit(value);
            }
        }
    }
    mask
}

fn split_step(element: &str) -> (&str, Option<&str>) {
    match element.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (element, None),
    }
}

fn parse_step(spec: &FieldSpec, token: &str, field: &str) -> Result<u32, Error> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(spec, field));
    }
    let step: u32 = token.parse().map_err(|_| invalid(spec, field))?;
    if step == 0 || step > spec.max - spec.min {
        return Err(invalid(spec, field));
    }
    Ok(step)
}

fn weekday_of(token: &str) -> Option<u32> {
    let value = FieldSpec::DAY_OF_WEEK.value_of(token)?;
    Some(if value == 7 { 0 } else { value })
}

fn invalid(spec: &FieldSpec, field: &str) -> Error {
    Error::InvalidField { field: spec.kind, token: field.to_string() }
}
