//! The error sink.
//!
//! Validation never throws: every violation becomes a [`Diagnostic`]
//! appended to an [`ErrorSink`]. Combinators speculate by evaluating
//! branches against fresh local sinks and deciding afterwards what, if
//! anything, reaches the outer one.

use vouch_value::{Path, Value};

use crate::error::ValidationError;

/// How much of the offending value is quoted in a diagnostic.
const SNIPPET_LIMIT: usize = 60;

/// One diagnostic: where, what it looked like, what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// JSON-Pointer-style path to the offending location.
    pub path: String,
    /// Compact rendering of the offending subtree, truncated.
    pub snippet: String,
    /// Human-readable message.
    pub message: String,
}

/// Ordered collection of diagnostics plus a had-error flag.
#[derive(Debug, Default)]
pub struct ErrorSink {
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation against the given location.
    pub fn record(&mut self, path: &Path, instance: &Value, error: ValidationError) {
        self.had_error = true;
        self.diagnostics.push(Diagnostic {
            path: path.to_string(),
            snippet: instance.snippet(SNIPPET_LIMIT),
            message: error.to_string(),
        });
    }

    pub fn has_error(&self) -> bool {
        self.had_error
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drain another sink into this one, keeping order.
    pub fn extend_from(&mut self, mut other: ErrorSink) {
        self.had_error |= other.had_error;
        self.diagnostics.append(&mut other.diagnostics);
    }

    /// Reset for reuse as a speculation buffer.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.had_error = false;
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.had_error = false;
        std::mem::take(&mut self.diagnostics)
    }
}
