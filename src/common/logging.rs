//! Logging and tracing configuration
//!
//! Event reporting for test runs goes through the event sinks, not the
//! logger; tracing carries diagnostics only (connection attempts, prompt
//! matching, spec scanning).

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
/// `--debug` forces DEBUG for this crate regardless of the environment.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("testrig=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("testrig=info,warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
