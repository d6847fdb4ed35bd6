//! Rendezvous point: one request, many observers, any number of responders.
//!
//! - [`Rendezvous`]: holds the request, fans out events, tracks interest;
//! - [`Registration`]: handle removing one observer;
//! - [`Interest`]: whether an observer keeps the point open.

mod point;
mod registration;
mod state;

pub use point::Rendezvous;
pub use registration::Registration;
pub use state::Interest;
