//! Logging setup.
//!
//! Configure via RUST_LOG:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=stdocs_core::highlighter=info` - highlighter construction only
//! - `RUST_LOG=stdocs::diagnostics=warn` - editor diagnostics that got through the shim

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber. Logs go to stderr so rendered HTML on
/// stdout stays clean.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry().with(console_layer).init();
}
