//! Logging setup for the command-line binary.
//!
//! The engine only emits `tracing` events; installing a subscriber is left
//! to whoever embeds it.

use tracing_subscriber::EnvFilter;

use crate::error::Error;
use crate::types::Result;

/// Log level for the given flags (0=WARN, 1=INFO, 2=DEBUG, 3+=TRACE; quiet
/// wins and shows errors only)
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::INFO,
        (false, 2) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging on stderr.
///
/// `RUST_LOG`, when set, overrides the level derived from the flags. Logs
/// never go to stdout, which may carry the anonymized table.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A subscriber can only be installed once per process, so only the
    // flag mapping is tested here.
    #[test]
    fn test_verbosity_levels() {
        let test_cases = [
            ((true, 0), tracing::Level::ERROR),
            ((true, 5), tracing::Level::ERROR),
            ((false, 0), tracing::Level::WARN),
            ((false, 1), tracing::Level::INFO),
            ((false, 2), tracing::Level::DEBUG),
            ((false, 10), tracing::Level::TRACE),
        ];

        for ((quiet, verbose), expected) in test_cases {
            assert_eq!(
                level_for(verbose, quiet),
                expected,
                "Failed for quiet={}, verbose={}",
                quiet,
                verbose
            );
        }
    }
}
