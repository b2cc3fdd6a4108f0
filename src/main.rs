use chrono::{Local, NaiveDateTime};
use cronmask::{DateTime, compile};

const REFERENCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let expr = match compile(&config.expression) {
        Ok(expr) => expr,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let mut printed = 0;
    for fire in expr.upcoming(config.reference).take(config.count) {
        println!("{fire}");
        printed += 1;
    }
    if printed == 0 {
        eprintln!("no upcoming fire times after {}", config.reference);
    }
}

struct CliConfig {
    expression: String,
    reference: DateTime,
    count: usize,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut expression: Option<String> = None;
    let mut reference: Option<DateTime> = None;
    let mut count = 5usize;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("cronmask {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--reference" | "-r" => {
                let value = args.next().ok_or_else(|| "error: --reference expects a value".to_string())?;
                reference = Some(parse_reference(&value)?);
            }
            "--count" | "-n" => {
                let value = args.next().ok_or_else(|| "error: --count expects a value".to_string())?;
                count = parse_count(&value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if expression.is_some() {
                        return Err("error: expression provided multiple times".to_string());
                    }
                    expression = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--reference=") => {
                let value = arg.trim_start_matches("--reference=");
                reference = Some(parse_reference(value)?);
            }
            _ if arg.starts_with("--count=") => {
                let value = arg.trim_start_matches("--count=");
                count = parse_count(value)?;
            }
            _ if arg.starts_with("--") => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                // Everything from here on is the expression.
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                expression = Some(rest);
                break;
            }
        }
    }

    let expression = match expression {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(format!("error: no expression provided\n\n{}", help_text())),
    };

    let reference = match reference {
        Some(value) => value,
        None => Local::now().naive_local().into(),
    };

    Ok(CliConfig { expression, reference, count })
}

fn parse_reference(value: &str) -> Result<DateTime, String> {
    NaiveDateTime::parse_from_str(value, REFERENCE_FORMAT)
        .map(DateTime::from)
        .map_err(|_| format!("error: invalid --reference '{value}' (expected YYYY-MM-DDTHH:MM:SS)"))
}

fn parse_count(value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| format!("error: invalid --count '{value}' (expected a positive integer)"))
}

fn help_text() -> String {
    format!(
        "cronmask {version}

Cron expression next-fire evaluator.

Usage:
  cronmask [OPTIONS] [--] <expression...>

Options:
  -r, --reference <timestamp>  Reference time in YYYY-MM-DDTHH:MM:SS.
                               Default: the current local time.
  -n, --count <n>              Number of upcoming fire times to print.
                               Default: 5.
  -h, --help                   Show this help message.
  -V, --version                Print version information.

The expression may be quoted as one argument or given as separate fields.

Exit codes:
  0  Success.
  1  The expression failed to compile.
  2  Invalid arguments or missing expression.
",
        version = env!("CARGO_PKG_VERSION")
    )
}
