//! Response events fanned out by a rendezvous point.
//!
//! ## Contents
//! - [`Event`] response/failure/final triple, including the tombstone
//!
//! ## Quick reference
//! - **Publishers**: responders via `Rendezvous::push_response` / `Rendezvous::push_error`,
//!   and the rendezvous point itself (tombstone on loss of interest).
//! - **Consumers**: observers registered with `Rendezvous::register`.

mod event;

pub use event::Event;
