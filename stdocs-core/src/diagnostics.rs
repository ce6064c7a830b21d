//! Diagnostic output channels and the filter that keeps editor noise out of
//! them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, trace, warn};

/// A diagnostic output channel (error or warning level).
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, args: &[&str]);
}

/// Decides whether a joined diagnostic message is dropped.
pub trait DiagnosticFilter: Send + Sync {
    fn suppresses(&self, message: &str) -> bool;
}

impl<F> DiagnosticFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn suppresses(&self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warn,
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&self, args: &[&str]) {
        let message = args.join(" ");
        match self.level {
            Level::Error => error!(target: "stdocs::diagnostics", "{}", message),
            Level::Warn => warn!(target: "stdocs::diagnostics", "{}", message),
        }
    }
}

/// Substrings identifying messages to drop, checked in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SuppressionPatterns(Vec<String>);

impl SuppressionPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    /// The first pattern contained in `message`.
    pub fn matching(&self, message: &str) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|pattern| message.contains(pattern))
    }
}

impl Default for SuppressionPatterns {
    /// Source-map and worker-loading noise the embedded editor produces
    /// when no worker runtime is provisioned.
    fn default() -> Self {
        Self::new([
            "marked.umd.js.map",
            "monaco-editor/esm",
            "Failed to load source map",
            "DevTools failed to load source map",
            "Could not load worker",
            "monaco-editor/min/vs",
            "Refused to load the script",
            "net::ERR_ABORTED 404",
        ])
    }
}

impl DiagnosticFilter for SuppressionPatterns {
    fn suppresses(&self, message: &str) -> bool {
        self.matching(message).is_some()
    }
}

/// Passes diagnostics to `inner` unless `filter` suppresses them.
pub struct FilteredSink {
    inner: Arc<dyn DiagnosticSink>,
    filter: Arc<dyn DiagnosticFilter>,
}

impl FilteredSink {
    pub fn new(inner: Arc<dyn DiagnosticSink>, filter: Arc<dyn DiagnosticFilter>) -> Self {
        Self { inner, filter }
    }

    pub fn inner(&self) -> &Arc<dyn DiagnosticSink> {
        &self.inner
    }
}

impl DiagnosticSink for FilteredSink {
    fn emit(&self, args: &[&str]) {
        let message = args.join(" ");
        if self.filter.suppresses(&message) {
            trace!(%message, "suppressed diagnostic");
            return;
        }
        self.inner.emit(args);
    }
}

/// The error and warning channels of a host.
#[derive(Clone)]
pub struct DiagnosticSinks {
    pub error: Arc<dyn DiagnosticSink>,
    pub warn: Arc<dyn DiagnosticSink>,
}

impl DiagnosticSinks {
    pub fn new(error: Arc<dyn DiagnosticSink>, warn: Arc<dyn DiagnosticSink>) -> Self {
        Self { error, warn }
    }

    pub fn tracing() -> Self {
        Self::new(
            Arc::new(TracingSink::new(Level::Error)),
            Arc::new(TracingSink::new(Level::Warn)),
        )
    }

    /// Wrap both channels with the same filter.
    pub fn filtered(&self, filter: Arc<dyn DiagnosticFilter>) -> Self {
        Self::new(
            Arc::new(FilteredSink::new(Arc::clone(&self.error), Arc::clone(&filter))),
            Arc::new(FilteredSink::new(Arc::clone(&self.warn), filter)),
        )
    }

    /// Whether both channels are the very same sinks as `other`'s.
    pub fn same_as(&self, other: &DiagnosticSinks) -> bool {
        Arc::ptr_eq(&self.error, &other.error) && Arc::ptr_eq(&self.warn, &other.warn)
    }
}

impl Default for DiagnosticSinks {
    fn default() -> Self {
        Self::tracing()
    }
}

impl std::fmt::Debug for DiagnosticSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticSinks").finish_non_exhaustive()
    }
}
