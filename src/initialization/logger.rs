//! Logger initialization.
//!
//! Plain or JSON log lines tagged with the scanner component that emitted them.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Short name of the scanner component that emitted a record.
///
/// `pagespeed_scan::fetch::transport` becomes `fetch`; dependency targets
/// such as `reqwest::connect` are returned unchanged.
fn component(target: &str) -> &str {
    match target.strip_prefix("pagespeed_scan") {
        Some("") => "main",
        Some(rest) => rest
            .trim_start_matches("::")
            .split("::")
            .next()
            .unwrap_or(rest),
        None => target,
    }
}

/// Initializes the logger with the specified level and format.
///
/// Plain output is `HH:MM:SS LEVEL component: message`, with the level
/// colored. JSON output is one object per line with `ts` (Unix millis),
/// `level`, `component`, `target` and `msg`.
///
/// `RUST_LOG` is read first; `level` then overrides the global filter and
/// this crate's own module filter. HTTP client internals stay at Info.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=reqwest=debug pagespeed_scan --csv routes.csv --log-format json
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    for noisy in ["reqwest", "hyper", "hyper_util"] {
        builder.filter_module(noisy, LevelFilter::Info);
    }
    builder.filter_module("pagespeed_scan", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = serde_json::json!({
                    "ts": chrono::Utc::now().timestamp_millis(),
                    "level": record.level().as_str(),
                    "component": component(record.target()),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{line}")
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = format!("{:<5}", record.level());
                let level = match record.level() {
                    log::Level::Error => level.red().bold(),
                    log::Level::Warn => level.yellow(),
                    log::Level::Info => level.green(),
                    log::Level::Debug | log::Level::Trace => level.dimmed(),
                };
                writeln!(
                    buf,
                    "{} {} {}: {}",
                    chrono::Local::now().format("%H:%M:%S"),
                    level,
                    component(record.target()).cyan(),
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}
