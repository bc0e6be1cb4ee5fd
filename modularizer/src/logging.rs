//! Diagnostic logging for the `jarmod` binary.
//!
//! Library code logs through the `log` facade. The binary installs a
//! `tracing-subscriber` formatter on stderr, which also bridges `log`
//! records, so every diagnostic line is printed with its level. Warnings are
//! shown by default; `-v` raises the level and `-q` lowers it to errors only.

use tracing_subscriber::filter::LevelFilter;

/// Maps the command-line verbosity flags to a level filter.
///
/// # Example
///
/// ```
/// use jarmod_modularizer::logging::level_for;
/// use tracing_subscriber::filter::LevelFilter;
///
/// assert_eq!(level_for(0, false), LevelFilter::WARN);
/// assert_eq!(level_for(2, false), LevelFilter::DEBUG);
/// assert_eq!(level_for(2, true), LevelFilter::ERROR);
/// ```
#[must_use]
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the stderr subscriber at `level`.
///
/// Only the first call has any effect. If another subscriber or `log`
/// backend is already installed it is left in place.
pub fn init(level: LevelFilter) {
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(shows_target(level))
        .without_time()
        .try_init();
    if installed.is_err() {
        // A global subscriber already exists; keep it.
    }
}

fn shows_target(level: LevelFilter) -> bool {
    level >= LevelFilter::DEBUG
}
