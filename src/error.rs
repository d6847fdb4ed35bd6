//! Error types used by rendezvous points and bound producers.
//!
//! This module defines three error types:
//!
//! - [`UsageError`] — misuse of a [`Rendezvous`](crate::Rendezvous) detected at call time.
//! - [`ProduceError`] — the terminal failure of a producer computation.
//! - [`RenderError`] — a renderable failure that could not be turned into a response.
//!
//! All of them provide `as_label` (stable snake_case, for logs/metrics) and
//! `as_message` helpers.

use std::fmt;

use thiserror::Error;

use crate::binder::RenderableError;

/// Boxed, thread-safe error used for unclassified producer failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Misuse of a rendezvous point.
///
/// Returned when an operation is attempted from inside the point's own dispatch
/// pass, where applying it immediately would corrupt the observer list.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    /// An observer tried to register a new observer while being dispatched to.
    #[error("observer registered from inside its own dispatch")]
    ReentrantRegistration,
}

impl UsageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use rendezvous::UsageError;
    ///
    /// assert_eq!(UsageError::ReentrantRegistration.as_label(), "usage_reentrant_registration");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UsageError::ReentrantRegistration => "usage_reentrant_registration",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Terminal failure of a producer computation.
///
/// The lifecycle binder classifies the producer's outcome by variant:
/// - [`ProduceError::Render`] knows how to express itself as a response;
/// - [`ProduceError::Canceled`] is the cooperative answer to a cancellation request;
/// - [`ProduceError::Fail`] is anything else and is answered with an internal error.
#[non_exhaustive]
#[derive(Error)]
pub enum ProduceError<M> {
    /// Domain failure that can render itself as a response payload.
    #[error("renderable failure: {0}")]
    Render(Box<dyn RenderableError<M>>),

    /// The producer observed its cancellation token and stopped.
    #[error("producer cancelled")]
    Canceled,

    /// Unclassified failure.
    #[error("producer failed: {0}")]
    Fail(#[source] BoxError),
}

impl<M> ProduceError<M> {
    /// Wraps a renderable domain failure.
    pub fn render(err: impl RenderableError<M> + 'static) -> Self {
        ProduceError::Render(Box::new(err))
    }

    /// Wraps any other failure.
    pub fn fail(err: impl Into<BoxError>) -> Self {
        ProduceError::Fail(err.into())
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProduceError::Render(_) => "produce_renderable",
            ProduceError::Canceled => "produce_canceled",
            ProduceError::Fail(_) => "produce_failed",
        }
    }

    /// Returns a human-readable message including the whole source chain.
    pub fn as_message(&self) -> String {
        match self {
            ProduceError::Render(err) => format!("renderable: {err}"),
            ProduceError::Canceled => "cancelled".to_string(),
            ProduceError::Fail(err) => format!("error: {}", error_chain(err.as_ref())),
        }
    }

    /// Indicates whether this is the cooperative cancellation outcome.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ProduceError::Canceled)
    }
}

impl<M> fmt::Debug for ProduceError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProduceError::Render(err) => f.debug_tuple("Render").field(err).finish(),
            ProduceError::Canceled => f.write_str("Canceled"),
            ProduceError::Fail(err) => f.debug_tuple("Fail").field(err).finish(),
        }
    }
}

/// # A renderable failure that did not produce a response.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The conversion succeeded but yielded no response.
    #[error("renderable failure produced no response")]
    Empty,

    /// The conversion itself failed.
    #[error("rendering failed: {reason}")]
    Failed {
        /// Why the conversion failed.
        reason: String,
    },

    /// The conversion panicked.
    #[error("rendering panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl RenderError {
    /// Shorthand for [`RenderError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        RenderError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RenderError::Empty => "render_empty",
            RenderError::Failed { .. } => "render_failed",
            RenderError::Panicked { .. } => "render_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// Formats an error followed by its `source()` chain, `: `-separated.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(src) = cur {
        out.push_str(": ");
        out.push_str(&src.to_string());
        cur = src.source();
    }
    out
}
