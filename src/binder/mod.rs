//! # Lifecycle binder: producers feeding rendezvous points.
//!
//! This module provides the producer side of a rendezvous:
//! - [`Producer`] / [`ProducerFn`] - one-shot cancelable computations
//! - [`Binder`] / [`bind`] - spawn a producer tied to a point's interest
//! - [`BoundTask`] / [`BindOutcome`] - handle and terminal outcome of a bound producer
//! - [`RenderableError`] / [`ErrorResponse`] - failure-to-response conversion
//!
//! ## Lifecycle
//! ```text
//! bind(point, producer)
//!   ├─► on_interest_end ─► cancel token
//!   └─► spawn ─► producer runs ─► pushes responses
//!                    │
//!                    ├─ Ok(())          ─► nothing more
//!                    ├─ Render(e)       ─► e.to_response() | internal_error
//!                    ├─ Fail(e) / panic ─► internal_error
//!                    └─ Canceled        ─► nothing
//! ```

mod bind;
mod producer;
mod render;
mod runner;

pub use bind::{bind, Binder, BoundTask};
pub use producer::{BoxProduceFuture, Producer, ProducerFn};
pub use render::{ErrorResponse, RenderableError};
pub use runner::BindOutcome;
