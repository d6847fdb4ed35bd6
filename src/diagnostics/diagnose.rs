//! # Core diagnostic sink trait
//!
//! `Diagnose` is the extension point for routing diagnostics somewhere useful.
//! A rendezvous point calls its sink synchronously from whatever operation
//! noticed the condition, so implementations must be cheap and must not block.
//!
//! ## Contract
//! - Called without any rendezvous lock held; a sink may inspect the point.
//! - Must not push events into the point that reported the diagnostic.
//! - Panics are isolated only when the sink is part of a
//!   [`DiagnosticSet`](crate::DiagnosticSet).
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use rendezvous::{Diagnose, Diagnostic, DiagnosticKind};
//!
//! #[derive(Default)]
//! struct LateCounter(AtomicUsize);
//!
//! impl Diagnose for LateCounter {
//!     fn on_diagnostic(&self, d: &Diagnostic) {
//!         if d.kind == DiagnosticKind::LateEvent {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "late-counter" }
//! }
//! ```

use super::Diagnostic;

/// Contract for diagnostic sinks.
pub trait Diagnose: Send + Sync + 'static {
    /// Handle a single diagnostic.
    fn on_diagnostic(&self, diagnostic: &Diagnostic);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
