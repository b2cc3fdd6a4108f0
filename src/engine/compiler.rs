//! Top-level expression compilation.
//!
//! `compile` owns the overall shape of an expression: trimming, the
//! `@`-alias table, splitting into 5/6/7 whitespace-delimited fields,
//! dispatching each field to the lexer, and finalizing the day-of-week
//! adjustment. Field token count decides the layout:
//!
//! ```text
//! 5 fields:        min hour dom mon dow          (seconds fixed at 0)
//! 6 fields:   sec  min hour dom mon dow          (every year)
//! 7 fields:   sec  min hour dom mon dow year
//! ```
//!
//! Aliases are built through `CronExpr::from_fields` rather than by
//! re-parsing substituted text.

use crate::api::Error;
use crate::cron_expr::{CronExpr, DomFlags, YearMask, expand_days_of_week};
use crate::engine::field::FieldSpec;
use crate::engine::lexer;
use crate::value_bit;

pub(crate) fn compile(text: &str) -> Result<CronExpr, Error> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Empty);
    }
    if let Some(alias) = text.strip_prefix('@') {
        return compile_alias(alias);
    }

    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(Error::MissingFields(fields.len()));
    }
    if fields.len() > 7 {
        return Err(Error::TooManyFields(fields.len()));
    }

    // The classic five-field crontab form carries no seconds column and
    // fires on second 0.
    let (seconds_field, rest) = if fields.len() == 5 { ("0", &fields[..]) } else { (fields[0], &fields[1..]) };

    let mut expr = CronExpr {
        seconds: lexer::lex(&FieldSpec::SECOND, seconds_field)?,
        minutes: lexer::lex(&FieldSpec::MINUTE, rest[0])?,
        hours: lexer::lex(&FieldSpec::HOUR, rest[1])?,
        days_of_month: 0,
        months: lexer::lex(&FieldSpec::MONTH, rest[3])?,
        days_of_week: 0,
        years: match rest.get(5) {
            Some(&year_field) => lexer::lex_year(year_field)?,
            None => YearMask::all(),
        },
        workdays_of_month: 0,
        nth_weekdays: 0,
        last_weekdays: 0,
        flags: DomFlags::empty(),
    };
    lexer::lex_day_of_month(rest[2], &mut expr)?;
    lexer::lex_day_of_week(rest[4], &mut expr)?;
    expr.days_of_week = expand_days_of_week(expr.days_of_week);

    Ok(expr)
}

fn compile_alias(name: &str) -> Result<CronExpr, Error> {
    let zero = value_bit(0);
    let first = value_bit(1);
    let every_dom = FieldSpec::DAY_OF_MONTH.full_mask();
    let every_month = FieldSpec::MONTH.full_mask();
    let every_dow = FieldSpec::DAY_OF_WEEK.full_mask();

    match name.to_ascii_lowercase().as_str() {
        "yearly" | "annually" => Ok(CronExpr::from_fields(zero, zero, zero, first, first, every_dow)),
        "monthly" => Ok(CronExpr::from_fields(zero, zero, zero, first, every_month, every_dow)),
        "weekly" => Ok(CronExpr::from_fields(zero, zero, zero, every_dom, every_month, value_bit(0))),
        "daily" | "midnight" => Ok(CronExpr::from_fields(zero, zero, zero, every_dom, every_month, every_dow)),
        "hourly" => {
            Ok(CronExpr::from_fields(zero, zero, FieldSpec::HOUR.full_mask(), every_dom, every_month, every_dow))
        }
        _ => Err(Error::UnknownAlias(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_fields_default_seconds_to_zero() {
        let expr = compile("30 12 * * *").unwrap();
        assert_eq!(expr.seconds, value_bit(0));
        assert_eq!(expr.minutes, value_bit(30));
        assert_eq!(expr.hours, value_bit(12));
        assert!(expr.day_of_month_unrestricted());
        assert!(expr.day_of_week_unrestricted());
    }

    #[test]
    fn six_fields_take_explicit_seconds_and_every_year() {
        let expr = compile("15 30 12 * * *").unwrap();
        assert_eq!(expr.seconds, value_bit(15));
        assert_eq!(expr.years, YearMask::all());
    }

    #[test]
    fn seven_fields_take_a_year() {
        let expr = compile("0 0 0 1 1 * 2020").unwrap();
        assert_eq!(expr.years.next_at_or_after(1970), Some(2020));
        assert_eq!(expr.years.next_at_or_after(2021), None);
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(compile("  0  0 0   1 1 * *  ").unwrap(), compile("0 0 0 1 1 * *").unwrap());
    }

    #[test]
    fn field_count_is_bounded() {
        assert_eq!(compile("* * * *"), Err(Error::MissingFields(4)));
        assert_eq!(compile("* * * * * * * *"), Err(Error::TooManyFields(8)));
        assert_eq!(compile("   "), Err(Error::Empty));
        assert_eq!(compile(""), Err(Error::Empty));
    }

    #[test]
    fn aliases_match_their_expansions() {
        assert_eq!(compile("@yearly").unwrap(), compile("0 0 0 1 1 * *").unwrap());
        assert_eq!(compile("@annually").unwrap(), compile("@yearly").unwrap());
        assert_eq!(compile("@monthly").unwrap(), compile("0 0 0 1 * * *").unwrap());
        assert_eq!(compile("@weekly").unwrap(), compile("0 0 0 * * 0 *").unwrap());
        assert_eq!(compile("@daily").unwrap(), compile("0 0 0 * * * *").unwrap());
        assert_eq!(compile("@midnight").unwrap(), compile("@daily").unwrap());
        assert_eq!(compile("@hourly").unwrap(), compile("0 0 * * * * *").unwrap());
        assert_eq!(compile("@YEARLY").unwrap(), compile("@yearly").unwrap());
    }

    #[test]
    fn unknown_aliases_are_rejected() {
        assert_eq!(compile("@fortnightly"), Err(Error::UnknownAlias("fortnightly".into())));
    }

    #[test]
    fn question_mark_equals_star_after_compilation() {
        assert_eq!(compile("0 0 12 ? * *").unwrap(), compile("0 0 12 * * *").unwrap());
        assert_eq!(compile("0 0 12 * * ?").unwrap(), compile("0 0 12 * * *").unwrap());
    }

    #[test]
    fn sunday_alias_folds_onto_zero() {
        assert_eq!(compile("0 0 * * 7").unwrap(), compile("0 0 * * 0").unwrap());
        assert_eq!(compile("0 0 * * sun").unwrap(), compile("0 0 * * 0").unwrap());
    }
}
