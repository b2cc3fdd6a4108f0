//! Expression compilation and next-fire evaluation engine.
//!
//! This module is the internal core of the crate. The public surface in
//! `api.rs` is a thin layer over it.
//!
//! ## How the parts work together
//!
//! Compiling and evaluating an expression is a pipeline:
//!
//! ```text
//! text ── compiler::compile ──┬─ alias table (@daily, ...)
//!                             ├─ lexer (one call per field)    (lexer.rs)
//!                             │    └─ field metadata           (field.rs)
//!                             └─ weekday bit adjustment
//!                                     │
//!                                     v
//!                                 CronExpr
//!
//! (CronExpr, instant) ── next_fire::next_after ── instant-or-none
//!                             │
//!                             ├─ days::actual_days   per (year, month)
//!                             └─ calendar probes     (calendar.rs)
//! ```
//!
//! All masks use the crate-wide top-down bit encoding (see `lib.rs`), so the
//! whole next-fire search reduces to "first set bit at or after position"
//! scans plus a per-month day resolution step.
//!
//! ## Responsibilities by module
//!
//! - `field.rs`: static per-field metadata: valid ranges, full-range masks,
//!   month/weekday name tables, token-to-integer conversion.
//! - `lexer.rs`: one whitespace-delimited field into bitmask form, including
//!   the extended `L`/`LW`/`dW`/`wL`/`w#n`/`?` day syntax.
//! - `compiler.rs`: the top-level driver: splitting, aliases, optional
//!   seconds/year fields, finalizing the weekday adjustment.
//! - `calendar.rs`: pure Gregorian probes (leap years, month lengths,
//!   Rata Die day counts, weekday-of-date).
//! - `days.rs`: merges day-of-month, day-of-week and the modifier side
//!   channels with the real calendar into one per-month day mask.
//! - `next_fire.rs`: the top-down field walk producing the next instant.
//!
//! ## Debugging
//!
//! Set `CRONMASK_DEBUG=1` to print next-fire search traces.

#[path = "engine/calendar.rs"]
pub(crate) mod calendar;
#[path = "engine/compiler.rs"]
pub(crate) mod compiler;
#[path = "engine/days.rs"]
pub(crate) mod days;
#[path = "engine/field.rs"]
pub(crate) mod field;
#[path = "engine/lexer.rs"]
pub(crate) mod lexer;
#[path = "engine/next_fire.rs"]
pub(crate) mod next_fire;
