//! Logging infrastructure.
//!
//! Structured logging uses the `log` facade with an `env_logger` backend
//! writing to stderr. The level is determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. The `--verbose` CLI flag (debug level)
//! 3. Default: info level

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem based on the CLI verbosity flag.
///
/// Must be called once, before any logging calls are made. If `RUST_LOG`
/// is set it takes precedence over `verbose`.
pub fn init_logging(verbose: bool) {
    let mut builder = Builder::new();

    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose));
    }

    builder.format(|buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        writeln!(
            buf,
            "{level_style}{:<5}{level_style:#} {}",
            level,
            record.args()
        )
    });

    builder.init();
}

fn determine_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
