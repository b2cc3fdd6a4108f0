use crate::cron_expr::CronExpr;
use crate::engine::compiler;
use crate::engine::field::FieldKind;

/// Why a cron expression failed to compile.
///
/// Compilation validates every token before returning; no partially compiled
/// expression ever escapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input was empty (or whitespace only).
    #[error("cron expression is empty")]
    Empty,
    /// Fewer than five whitespace-delimited fields.
    #[error("cron expression has {0} fields, expected at least 5")]
    MissingFields(usize),
    /// More than seven whitespace-delimited fields.
    #[error("cron expression has {0} fields, expected at most 7")]
    TooManyFields(usize),
    /// A field failed to parse. Carries the field and its full text.
    #[error("invalid {field} field `{token}`")]
    InvalidField { field: FieldKind, token: String },
    /// An `@`-prefixed name outside the known alias table.
    #[error("unknown alias `@{0}`")]
    UnknownAlias(String),
}

/// Compile a cron expression.
///
/// Accepts 5 fields (`min hour dom mon dow`, firing at second 0), 6 fields
/// (leading seconds), 7 fields (trailing year), or one of the `@yearly`,
/// `@annually`, `@monthly`, `@weekly`, `@daily`, `@midnight`, `@hourly`
/// aliases. Tokens are case-insensitive; months and weekdays may be named.
///
/// # Example
/// ```
/// use cronmask::{DateTime, compile};
///
/// let expr = compile("0 0 12 * * MON-FRI").unwrap();
/// let next = expr.next_after(DateTime::new(2013, 2, 12, 4, 30, 0)).unwrap();
/// assert_eq!(next, DateTime::new(2013, 2, 12, 12, 0, 0));
/// ```
pub fn compile(text: &str) -> Result<CronExpr, Error> {
    compiler::compile(text)
}
