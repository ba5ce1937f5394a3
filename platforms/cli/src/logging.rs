//! Diagnostic logging for the CLI.
//!
//! Machine output (tapes, status, JSON summaries) goes to stdout. Everything emitted through
//! `tracing`, including rule set warnings, goes to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset, which still shows analyzer warnings.
///
/// # Example
/// ```bash
/// RUST_LOG=tmsim=trace tmsim-cli --builtin "binary increment"
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
