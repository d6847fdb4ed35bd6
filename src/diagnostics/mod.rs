//! # Diagnostics for rendezvous points and bound producers.
//!
//! Noteworthy but non-fatal conditions (late pushes, failed producers, ...) are
//! reported as [`Diagnostic`] values to a [`Diagnose`] sink handed to each
//! rendezvous point at construction time.
//!
//! ## Architecture
//! ```text
//! Rendezvous ──┐
//!              ├── on_diagnostic(&Diagnostic) ──► Arc<dyn Diagnose>
//! Binder     ──┘                                     │
//!                                        ┌───────────┼────────────┐
//!                                        ▼           ▼            ▼
//!                                   TracingSink  DiagnosticSet  Custom
//!                                                 (fan-out)
//! ```
//!
//! ## Sink types
//! - [`TracingSink`] - default; writes `tracing` records
//! - [`DiagnosticSet`] - forwards to several sinks with panic isolation

mod diagnose;
mod diagnostic;
mod log;
mod set;

pub use diagnose::Diagnose;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use log::TracingSink;
pub use set::DiagnosticSet;

pub(crate) use set::panic_info;
