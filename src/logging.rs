//! Logging setup for the propdex binary.
//!
//! The library only talks to the `log` facade; this module installs the
//! `env_logger` backend. The level is chosen by, in priority order:
//!
//! 1. `RUST_LOG` (if set)
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. Info otherwise
//!
//! Debug builds prefix each line with a timestamp and, from `-v` on, the
//! module path. Release builds print `LEVEL message` only.
//!
//! # Example
//!
//! ```rust,no_run
//! use propdex::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Environment variable that overrides the CLI verbosity flags.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

/// Install the global logger.
///
/// Returns `false` if a logger was already installed (for example when
/// called twice from tests); the existing logger is left in place.
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    let from_env = env::var(LOG_ENV_VAR).ok();

    let mut builder = Builder::new();
    match &from_env {
        Some(spec) => {
            builder.parse_filters(spec);
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return false;
    }

    match from_env {
        Some(spec) => log::debug!("Logging configured from {LOG_ENV_VAR}={spec}"),
        None => log::debug!(
            "Logging initialized at level {:?}",
            determine_level(verbose, quiet)
        ),
    }
    true
}

/// Map CLI flags to a level. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let timestamp = buf.timestamp_seconds();
        let level = record.level();
        let style = buf.default_level_style(level);

        if verbose >= 1 {
            writeln!(
                buf,
                "{timestamp} {style}{level:<5}{style:#} [{}] {}",
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{timestamp} {style}{level:<5}{style:#} {}", record.args())
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
    });
}

/// Name of the currently active maximum level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
