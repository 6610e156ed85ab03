//! Logging initialisation for the dbswap binary.
//!
//! Log output goes to stderr so that nothing interferes with files written by
//! the rewriter.

use crate::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Maps the verbosity flags onto a maximum log level.
///
/// `quiet` wins over any verbosity; otherwise 0 is INFO, 1 is DEBUG and
/// anything higher is TRACE.
pub const fn level_for(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Initializes process-wide logging based on verbosity level.
///
/// When neither `-v` nor `-q` is given, a `RUST_LOG` directive takes
/// precedence over the INFO default.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Errors
/// Returns [`crate::DbSwapError::Internal`] if a global subscriber is already
/// installed.
///
/// # Example
/// ```rust,no_run
/// use dbswap_core::logging::init_logging;
///
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);

    let filter = if verbose == 0 && !quiet {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
    } else {
        EnvFilter::new(level.as_str())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::DbSwapError::Internal {
                context: "Failed to initialize logging".to_string(),
                source: e,
            }
        })?;

    Ok(())
}
