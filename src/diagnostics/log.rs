//! # TracingSink — diagnostics as `tracing` records
//!
//! The default sink. Every [`Diagnostic`] becomes one `tracing` record at a
//! level chosen by its kind.
//!
//! ## Levels
//! ```text
//! warn   late_event, late_interest_end, late_registration, reentrant_call
//! info   renderable_failure
//! error  render_failed, producer_failed, producer_panicked, producer_timed_out,
//!        observer_panicked, sink_panicked
//! debug  producer_canceled, poke_unsupported
//! ```
//!
//! ## Example output
//! ```text
//! WARN rendezvous: response added after point has already ended kind="late_event" label="rendezvous#3" seq=12
//! ERROR rendezvous: producer failed kind="producer_failed" label="render" reason="disk full" seq=13
//! ```

use tracing::Level;

use super::{Diagnose, Diagnostic, DiagnosticKind};

/// Diagnostic sink writing to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    /// Construct a new [`TracingSink`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Level used for a given diagnostic kind.
    pub fn level(kind: DiagnosticKind) -> Level {
        match kind {
            DiagnosticKind::LateEvent
            | DiagnosticKind::LateInterestEnd
            | DiagnosticKind::LateRegistration
            | DiagnosticKind::ReentrantCall => Level::WARN,
            DiagnosticKind::RenderableFailure => Level::INFO,
            DiagnosticKind::RenderFailed
            | DiagnosticKind::ProducerFailed
            | DiagnosticKind::ProducerPanicked
            | DiagnosticKind::ProducerTimedOut
            | DiagnosticKind::ObserverPanicked
            | DiagnosticKind::SinkPanicked => Level::ERROR,
            DiagnosticKind::ProducerCanceled | DiagnosticKind::PokeUnsupported => Level::DEBUG,
        }
    }

    fn message(kind: DiagnosticKind) -> &'static str {
        match kind {
            DiagnosticKind::LateEvent => "event added after point has already ended",
            DiagnosticKind::LateInterestEnd => "interest-end callback added after point has already ended",
            DiagnosticKind::LateRegistration => "observer registered after point has already ended",
            DiagnosticKind::ReentrantCall => "registration attempted from inside a dispatch",
            DiagnosticKind::PokeUnsupported => "poke ignored, responder has no liveness handler",
            DiagnosticKind::RenderableFailure => "producer raised a renderable failure, responding accordingly",
            DiagnosticKind::RenderFailed => "rendering the renderable failure failed",
            DiagnosticKind::ProducerFailed => "producer failed",
            DiagnosticKind::ProducerPanicked => "producer panicked",
            DiagnosticKind::ProducerTimedOut => "producer exceeded its deadline",
            DiagnosticKind::ProducerCanceled => "producer cancelled",
            DiagnosticKind::ObserverPanicked => "observer panicked during dispatch, removed",
            DiagnosticKind::SinkPanicked => "diagnostic sink panicked",
        }
    }
}

macro_rules! emit {
    ($level:expr, $d:expr, $msg:expr) => {{
        let kind = $d.kind.as_label();
        let label = $d.label.as_deref().unwrap_or("-");
        let reason = $d.reason.as_deref().unwrap_or("");
        match $level {
            Level::ERROR => tracing::error!(kind, label, reason, seq = $d.seq, "{}", $msg),
            Level::WARN => tracing::warn!(kind, label, reason, seq = $d.seq, "{}", $msg),
            Level::INFO => tracing::info!(kind, label, reason, seq = $d.seq, "{}", $msg),
            Level::DEBUG => tracing::debug!(kind, label, reason, seq = $d.seq, "{}", $msg),
            _ => tracing::trace!(kind, label, reason, seq = $d.seq, "{}", $msg),
        }
    }};
}

impl Diagnose for TracingSink {
    fn on_diagnostic(&self, d: &Diagnostic) {
        emit!(Self::level(d.kind), d, Self::message(d.kind));
    }

    fn name(&self) -> &'static str {
        "TracingSink"
    }
}
