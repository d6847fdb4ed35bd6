//! # Failure-to-response conversion.
//!
//! The binder consumes these traits; the protocol layer implements them.
//!
//! - [`RenderableError`]: a domain failure that knows which response expresses it;
//! - [`ErrorResponse`]: the response type can express a generic internal error.
//!
//! ## Example
//! ```rust
//! use rendezvous::{ErrorResponse, RenderError, RenderableError};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Reply { code: u16 }
//!
//! impl ErrorResponse for Reply {
//!     fn internal_error() -> Self { Reply { code: 500 } }
//! }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("not found")]
//! struct NotFound;
//!
//! impl RenderableError<Reply> for NotFound {
//!     fn to_response(&self) -> Result<Option<Reply>, RenderError> {
//!         Ok(Some(Reply { code: 404 }))
//!     }
//! }
//!
//! assert_eq!(NotFound.to_response().unwrap(), Some(Reply { code: 404 }));
//! ```

use crate::error::RenderError;

/// Domain failure that can express itself as a response payload.
pub trait RenderableError<M>: std::error::Error + Send + Sync {
    /// Produces the response representing this failure.
    ///
    /// `Ok(None)` and `Err(_)` both make the binder fall back to
    /// [`ErrorResponse::internal_error`].
    fn to_response(&self) -> Result<Option<M>, RenderError>;
}

/// Response payloads able to express generic failures.
pub trait ErrorResponse: Sized {
    /// Response sent for unclassified failures.
    fn internal_error() -> Self;

    /// Response sent when a producer exceeds its deadline.
    fn timeout() -> Self {
        Self::internal_error()
    }
}
