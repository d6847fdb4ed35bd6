//! # Events delivered by a rendezvous point to its observers.
//!
//! An [`Event`] carries at most one of a response payload or a failure value,
//! plus an `is_last` flag:
//! - **Intermediate responses**: `response = Some`, `is_last = false`
//! - **Final responses**: `response = Some`, `is_last = true`
//! - **Failures**: `error = Some`, always `is_last = true`
//! - **Tombstone**: neither set, `is_last = true`; synthesized when interest ends
//!
//! ## Example
//! ```rust
//! use rendezvous::Event;
//!
//! let ev: Event<&str, ()> = Event::response("2.05 Content", false);
//! assert!(!ev.is_last);
//!
//! let t: Event<&str, ()> = Event::tombstone();
//! assert!(t.is_tombstone());
//! ```

/// Immutable response/failure/final triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<M, E> {
    /// Response payload, if this event carries one.
    pub response: Option<M>,
    /// Failure value, if this event carries one.
    pub error: Option<E>,
    /// Whether no further events follow this one.
    pub is_last: bool,
}

impl<M, E> Event<M, E> {
    /// Creates a response event.
    #[inline]
    pub fn response(response: M, is_last: bool) -> Self {
        Self {
            response: Some(response),
            error: None,
            is_last,
        }
    }

    /// Creates a failure event. Failures are always final.
    #[inline]
    pub fn error(error: E) -> Self {
        Self {
            response: None,
            error: Some(error),
            is_last: true,
        }
    }

    /// Creates the synthetic final event delivered when interest ends.
    #[inline]
    pub fn tombstone() -> Self {
        Self {
            response: None,
            error: None,
            is_last: true,
        }
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.is_last && self.response.is_none() && self.error.is_none()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
