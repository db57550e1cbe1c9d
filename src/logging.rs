// ==========================================
// Logging setup
// ==========================================
// tracing + tracing-subscriber, level taken from RUST_LOG
// Logs go to stderr so `--json` reports on stdout stay parseable.
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialise human-readable logging for the CLI
///
/// # Environment
/// - RUST_LOG: filter directive (default: info)
///   e.g. RUST_LOG=debug or RUST_LOG=roster_import=trace
///
/// # Example
/// ```no_run
/// use roster_import::logging;
/// logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Same as `init`, one JSON object per event (for log shippers)
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialise logging for tests (debug level, captured by the test harness)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
