//! # Diagnostics reported by rendezvous points and bound producers.
//!
//! The [`DiagnosticKind`] enum classifies conditions across three categories:
//! - **Late/duplicate termination**: expected races after a point has ended
//! - **Producer outcomes**: how a bound producer finished, when it matters
//! - **Callback health**: panics in observers and diagnostic sinks
//!
//! The [`Diagnostic`] struct carries additional metadata such as timestamps,
//! the label of the reporting point or producer, and a reason.
//!
//! ## Ordering guarantees
//! Each diagnostic has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use rendezvous::{Diagnostic, DiagnosticKind};
//!
//! let d = Diagnostic::new(DiagnosticKind::ProducerFailed)
//!     .with_label("render /sensors/temp")
//!     .with_reason("connection reset");
//!
//! assert_eq!(d.kind, DiagnosticKind::ProducerFailed);
//! assert_eq!(d.label.as_deref(), Some("render /sensors/temp"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for diagnostic ordering.
static DIAGNOSTIC_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    // === Late/duplicate termination ===
    /// A response or failure was pushed after the point had ended; it was dropped.
    ///
    /// Sets:
    /// - `label`: rendezvous label
    /// - `reason`: what kind of event was dropped
    LateEvent,

    /// An interest-end callback was registered after the point had ended; it fired immediately.
    ///
    /// Sets:
    /// - `label`: rendezvous label
    LateInterestEnd,

    /// An event observer was registered after the point had ended; it received the tombstone.
    ///
    /// Sets:
    /// - `label`: rendezvous label
    LateRegistration,

    /// A registration was attempted from inside the point's own dispatch and was rejected.
    ///
    /// Sets:
    /// - `label`: rendezvous label
    /// - `reason`: usage error label
    ReentrantCall,

    /// `poke()` was called but the responder installed no liveness handler.
    ///
    /// Sets:
    /// - `label`: rendezvous label
    PokeUnsupported,

    // === Producer outcomes ===
    /// The producer raised a renderable failure; its response is being pushed.
    ///
    /// Sets:
    /// - `label`: producer name
    /// - `reason`: failure message
    RenderableFailure,

    /// A renderable failure could not be rendered; an internal error is pushed instead.
    ///
    /// Sets:
    /// - `label`: producer name
    /// - `reason`: render error message
    RenderFailed,

    /// The producer failed with an unclassified error; an internal error is pushed.
    ///
    /// Sets:
    /// - `label`: producer name
    /// - `reason`: error message with source chain
    ProducerFailed,

    /// The producer panicked; an internal error is pushed.
    ///
    /// Sets:
    /// - `label`: producer name
    /// - `reason`: panic info/message
    ProducerPanicked,

    /// The producer exceeded its configured deadline and was cancelled.
    ///
    /// Sets:
    /// - `label`: producer name
    /// - `reason`: configured deadline
    ProducerTimedOut,

    /// The producer stopped because it was cancelled (usually: interest ended).
    ///
    /// Sets:
    /// - `label`: producer name
    ProducerCanceled,

    // === Callback health ===
    /// An observer or interest-end callback panicked during a dispatch pass.
    /// It was removed; the pass went on with the remaining observers.
    ///
    /// Sets:
    /// - `label`: rendezvous label
    /// - `reason`: panic info/message
    ObserverPanicked,

    /// A diagnostic sink panicked while handling a diagnostic.
    ///
    /// Sets:
    /// - `label`: sink name
    /// - `reason`: panic info/message
    SinkPanicked,
}

impl DiagnosticKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DiagnosticKind::LateEvent => "late_event",
            DiagnosticKind::LateInterestEnd => "late_interest_end",
            DiagnosticKind::LateRegistration => "late_registration",
            DiagnosticKind::ReentrantCall => "reentrant_call",
            DiagnosticKind::PokeUnsupported => "poke_unsupported",
            DiagnosticKind::RenderableFailure => "renderable_failure",
            DiagnosticKind::RenderFailed => "render_failed",
            DiagnosticKind::ProducerFailed => "producer_failed",
            DiagnosticKind::ProducerPanicked => "producer_panicked",
            DiagnosticKind::ProducerTimedOut => "producer_timed_out",
            DiagnosticKind::ProducerCanceled => "producer_canceled",
            DiagnosticKind::ObserverPanicked => "observer_panicked",
            DiagnosticKind::SinkPanicked => "sink_panicked",
        }
    }
}

/// Diagnostic with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`DiagnosticKind`]
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Diagnostic classification.
    pub kind: DiagnosticKind,
    /// Label of the reporting rendezvous point, producer or sink.
    pub label: Option<Arc<str>>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Diagnostic {
    /// Creates a new diagnostic of the given kind with current timestamp and next sequence number.
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            seq: DIAGNOSTIC_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            label: None,
            reason: None,
        }
    }

    /// Attaches a label.
    #[inline]
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a sink panic diagnostic.
    #[inline]
    pub fn sink_panicked(sink: &'static str, info: String) -> Self {
        Diagnostic::new(DiagnosticKind::SinkPanicked)
            .with_label(sink)
            .with_reason(info)
    }
}
