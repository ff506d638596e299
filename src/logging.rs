//! Diagnostic sinks for non-fatal failures
//!
//! Snapshot rendering never fails from the caller's point of view. When
//! something does go wrong internally it is reported to a `DiagnosticSink`
//! instead of a process-wide logger, so callers (and tests) can capture it.

use log::warn;

/// Receiver for non-fatal diagnostic messages
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Forwards diagnostics to the `log` facade at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, message: &str) {
        warn!("{message}");
    }
}
