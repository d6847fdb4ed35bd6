//! # Synchronous diagnostic fan-out to multiple sinks.
//!
//! Provides [`DiagnosticSet`] — delivers each diagnostic to every sink, in the
//! order the sinks were given.
//!
//! ```text
//! on_diagnostic(d)
//!     │
//!     ├──► sink 1.on_diagnostic(d)
//!     │        └──► panic → SinkPanicked to the other sinks
//!     ├──► sink 2.on_diagnostic(d)
//!     └──► sink N.on_diagnostic(d)
//! ```
//!
//! ## Rules
//! - **Ordered**: sinks see each diagnostic in registration order.
//! - **Isolation**: a panicking sink does not stop delivery to the others.
//! - **No loops**: `SinkPanicked` diagnostics that panic again are not re-reported.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a sink uses `Mutex<T>` and panics while holding the lock.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::{Diagnose, Diagnostic, DiagnosticKind};

/// Fan-out coordinator for multiple diagnostic sinks.
#[derive(Clone, Default)]
pub struct DiagnosticSet {
    sinks: Vec<Arc<dyn Diagnose>>,
}

impl DiagnosticSet {
    /// Creates a set delivering to `sinks` in order.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn Diagnose>>) -> Self {
        Self { sinks }
    }

    /// Appends a sink.
    pub fn push(&mut self, sink: Arc<dyn Diagnose>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn deliver(&self, d: &Diagnostic, skip: Option<usize>) {
        let is_panic_report = matches!(d.kind, DiagnosticKind::SinkPanicked);

        for (idx, sink) in self.sinks.iter().enumerate() {
            if Some(idx) == skip {
                continue;
            }
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| sink.on_diagnostic(d))) {
                if is_panic_report {
                    continue;
                }
                let info = panic_info(panic_err.as_ref());
                self.deliver(&Diagnostic::sink_panicked(sink.name(), info), Some(idx));
            }
        }
    }
}

impl Diagnose for DiagnosticSet {
    fn on_diagnostic(&self, d: &Diagnostic) {
        self.deliver(d, None);
    }

    fn name(&self) -> &'static str {
        "DiagnosticSet"
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_info(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
