//! # rendezvous
//!
//! **Rendezvous** is a small library connecting the originator of a request
//! with whatever produces its responses.
//!
//! A [`Rendezvous`] point carries one request, fans the responses (or a single
//! error) out to any number of observers, and knows when nobody is interested
//! in the outcome anymore. A [`Binder`] ties a producer task to that interest:
//! once the last interested observer goes away, the producer is cancelled, and
//! when the producer fails, its failure is turned into a final response.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────┐                                     ┌──────────────┐
//!  │  Originator  │                                     │   Producer   │
//!  │ (observer #1)│                                     │ (bound task) │
//!  └──────┬───────┘                                     └──────┬───────┘
//!         │ register / unregister          push_response /     │
//!         ▼                                push_error          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Rendezvous<R, M, E>                                              │
//! │  - request (immutable, shared)                                    │
//! │  - observers (ordered; Active / Passive interest)                 │
//! │  - state: Open ─► Dispatching ─► Open … ─► Ended                  │
//! │  - Diagnose sink (late events, reentrancy, producer outcomes)     │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!   observer #1        observer #2        interest-end         │
//!   (callback)         (passive log)      callback ────────────┘
//!                                         (cancels producer)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Rendezvous::new(request)
//!   ├─► register(observer, interest)        (any number)
//!   ├─► bind(point, producer)               (interest end ─► token.cancel())
//!   │
//!   ├─► push_response(m, false) ─► every observer, registration order
//!   │       ├─ observer returns false ─► dropped; no interest left ─► tombstone, Ended
//!   │       └─ observer panics        ─► dropped, ObserverPanicked diagnostic
//!   ├─► push_response(m, true)  ─► every observer, then Ended
//!   ├─► push_error(e)           ─► every observer, then Ended
//!   │
//!   └─ after Ended:
//!        - push_*        ─► dropped, LateEvent diagnostic
//!        - register      ─► tombstone delivered at once, inert handle
//!        - on_interest_end ─► fires at once
//! ```
//!
//! ## Features
//! | Area            | Description                                                     | Key types / traits                              |
//! |-----------------|-----------------------------------------------------------------|-------------------------------------------------|
//! | **Rendezvous**  | Request carrier with ordered fan-out and interest tracking.     | [`Rendezvous`], [`Registration`], [`Interest`]  |
//! | **Events**      | Response / error / tombstone value delivered to observers.      | [`Event`]                                       |
//! | **Binder**      | Spawn producers, cancel on interest loss, render failures.      | [`Binder`], [`bind`], [`BoundTask`], [`Producer`] |
//! | **Rendering**   | Turn producer failures into responses.                          | [`RenderableError`], [`ErrorResponse`]          |
//! | **Diagnostics** | Report misuse and producer outcomes (tracing by default).       | [`Diagnose`], [`TracingSink`], [`DiagnosticSet`] |
//! | **Errors**      | Typed errors for API misuse and producer failures.              | [`UsageError`], [`ProduceError`], [`RenderError`] |
//! | **Configuration** | Producer deadline and panic handling.                         | [`BindConfig`]                                  |
//!
//! ## Example
//! ```rust
//! use rendezvous::{bind, ErrorResponse, Event, Interest, ProduceError, ProducerFn, Rendezvous};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Reply(u16);
//! impl ErrorResponse for Reply {
//!     fn internal_error() -> Self { Reply(500) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let point: Rendezvous<String, Reply, std::io::Error> =
//!         Rendezvous::with_tracing("GET /temperature".to_string());
//!
//!     // The originator wants exactly one final answer.
//!     point.register(
//!         |ev: &Event<Reply, std::io::Error>| {
//!             println!("got {:?}", ev.response);
//!             !ev.is_last
//!         },
//!         Interest::Active,
//!     )?;
//!
//!     // The producer answers through a clone of the point.
//!     let responder = point.clone();
//!     let task = bind(&point, ProducerFn::new("temperature", move |_ctx| async move {
//!         responder.push_response(Reply(205), true);
//!         Ok::<(), ProduceError<Reply>>(())
//!     }));
//!
//!     task.join().await;
//!     assert!(point.is_ended());
//!     Ok(())
//! }
//! ```
mod binder;
mod config;
mod diagnostics;
mod error;
mod events;
mod rendezvous;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use binder::{
    bind, BindOutcome, Binder, BoundTask, BoxProduceFuture, ErrorResponse, Producer, ProducerFn,
    RenderableError,
};
pub use config::BindConfig;
pub use diagnostics::{Diagnose, Diagnostic, DiagnosticKind, DiagnosticSet, TracingSink};
pub use error::{BoxError, ProduceError, RenderError, UsageError};
pub use events::Event;
pub use rendezvous::{Interest, Registration, Rendezvous};
