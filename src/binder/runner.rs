//! # Drive one bound producer to completion.
//!
//! Runs a [`Producer`] against a [`Rendezvous`], racing it against the binding's
//! cancellation token and an optional deadline, then turns its terminal outcome
//! into at most one final event.
//!
//! ## Outcome handling
//!
//! ```text
//! Ok(())                       → nothing pushed            → Completed
//! Err(Render(e)) → response    → push(response, last)      → Rendered
//!                → None / Err  → push(internal_error, last) → RenderFailed
//! Err(Fail(e))                 → push(internal_error, last) → Failed
//! panic (catch_panics)         → push(internal_error, last) → Panicked
//! deadline exceeded            → cancel, push(timeout, last) → TimedOut
//! token cancelled / Canceled   → nothing pushed            → Canceled
//! ```
//!
//! ## Rules
//! - The binder never synthesizes a success event; a producer returning `Ok(())`
//!   has pushed its final event itself.
//! - Cancellation wins ties (`biased` select): once interest is gone the
//!   producer future is dropped without being polled again.
//! - A push after the producer already ended the point is dropped by the point
//!   and reported as late; that race is expected.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    binder::{ErrorResponse, Producer, RenderableError},
    config::BindConfig,
    diagnostics::{panic_info, Diagnose, Diagnostic, DiagnosticKind},
    error::{error_chain, ProduceError, RenderError},
    rendezvous::Rendezvous,
};

/// How a bound producer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The producer returned `Ok(())`; the binder pushed nothing.
    Completed,
    /// A renderable failure was rendered and pushed as final response.
    Rendered,
    /// A renderable failure could not be rendered; an internal error was pushed.
    RenderFailed,
    /// An unclassified failure; an internal error was pushed.
    Failed,
    /// The producer panicked.
    Panicked,
    /// The producer exceeded its deadline; a timeout response was pushed.
    TimedOut,
    /// The producer was cancelled; the binder pushed nothing.
    Canceled,
}

impl BindOutcome {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BindOutcome::Completed => "completed",
            BindOutcome::Rendered => "rendered",
            BindOutcome::RenderFailed => "render_failed",
            BindOutcome::Failed => "failed",
            BindOutcome::Panicked => "panicked",
            BindOutcome::TimedOut => "timed_out",
            BindOutcome::Canceled => "canceled",
        }
    }

    /// Whether the binder itself pushed a final event.
    pub fn pushed_final(&self) -> bool {
        !matches!(self, BindOutcome::Completed | BindOutcome::Canceled)
    }
}

/// Runs `producer` against `point` until completion, cancellation or deadline.
pub(crate) async fn drive<R, M, E, P>(
    point: Rendezvous<R, M, E>,
    producer: P,
    token: CancellationToken,
    cfg: BindConfig,
    diagnostics: Arc<dyn Diagnose>,
) -> BindOutcome
where
    R: Send + Sync + 'static,
    M: ErrorResponse + Send + 'static,
    E: Send + 'static,
    P: Producer<M>,
{
    let name: Arc<str> = Arc::from(producer.name());
    let report = |kind: DiagnosticKind, reason: Option<String>| {
        let mut d = Diagnostic::new(kind).with_label(Arc::clone(&name));
        if let Some(reason) = reason {
            d = d.with_reason(reason);
        }
        diagnostics.on_diagnostic(&d);
    };

    let fut = Box::new(producer).spawn(token.clone());
    let catch_panics = cfg.catch_panics;
    let guarded = async move {
        if catch_panics {
            AssertUnwindSafe(fut)
                .catch_unwind()
                .await
                .map_err(|panic_err| panic_info(panic_err.as_ref()))
        } else {
            Ok(fut.await)
        }
    };
    let deadline = cfg.deadline();
    let bounded = async move {
        match deadline {
            Some(dur) => time::timeout(dur, guarded).await.map_err(|_elapsed| dur),
            None => Ok(guarded.await),
        }
    };

    let res = tokio::select! {
        biased;
        _ = token.cancelled() => {
            report(DiagnosticKind::ProducerCanceled, None);
            return BindOutcome::Canceled;
        }
        res = bounded => res,
    };

    match res {
        Err(dur) => {
            token.cancel();
            report(DiagnosticKind::ProducerTimedOut, Some(format!("{dur:?}")));
            point.push_response(M::timeout(), true);
            BindOutcome::TimedOut
        }
        Ok(Err(info)) => {
            report(DiagnosticKind::ProducerPanicked, Some(info));
            point.push_response(M::internal_error(), true);
            BindOutcome::Panicked
        }
        Ok(Ok(Ok(()))) => BindOutcome::Completed,
        Ok(Ok(Err(ProduceError::Canceled))) => {
            report(DiagnosticKind::ProducerCanceled, None);
            BindOutcome::Canceled
        }
        Ok(Ok(Err(ProduceError::Render(err)))) => {
            report(DiagnosticKind::RenderableFailure, Some(err.to_string()));
            match render(err.as_ref(), catch_panics) {
                Ok(response) => {
                    point.push_response(response, true);
                    BindOutcome::Rendered
                }
                Err(render_err) => {
                    report(DiagnosticKind::RenderFailed, Some(render_err.as_message()));
                    point.push_response(M::internal_error(), true);
                    BindOutcome::RenderFailed
                }
            }
        }
        Ok(Ok(Err(ProduceError::Fail(err)))) => {
            report(DiagnosticKind::ProducerFailed, Some(error_chain(err.as_ref())));
            point.push_response(M::internal_error(), true);
            BindOutcome::Failed
        }
    }
}

/// Asks a renderable failure for its response; `None` counts as a failure.
fn render<M>(err: &dyn RenderableError<M>, catch_panics: bool) -> Result<M, RenderError> {
    let attempt = if catch_panics {
        catch_unwind(AssertUnwindSafe(|| err.to_response())).unwrap_or_else(|panic_err| {
            Err(RenderError::Panicked {
                info: panic_info(panic_err.as_ref()),
            })
        })
    } else {
        err.to_response()
    };
    attempt?.ok_or(RenderError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("teapot")]
    struct Teapot(Option<u16>);

    impl RenderableError<u16> for Teapot {
        fn to_response(&self) -> Result<Option<u16>, RenderError> {
            Ok(self.0)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("broken")]
    struct Broken;

    impl RenderableError<u16> for Broken {
        fn to_response(&self) -> Result<Option<u16>, RenderError> {
            Err(RenderError::failed("no template"))
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("explosive")]
    struct Explosive;

    impl RenderableError<u16> for Explosive {
        fn to_response(&self) -> Result<Option<u16>, RenderError> {
            panic!("render blew up")
        }
    }

    #[test]
    fn render_returns_response() {
        assert_eq!(render(&Teapot(Some(418)), true), Ok(418));
    }

    #[test]
    fn render_without_response_is_empty() {
        assert_eq!(render(&Teapot(None), true), Err(RenderError::Empty));
    }

    #[test]
    fn render_error_is_passed_through() {
        assert_eq!(render(&Broken, true), Err(RenderError::failed("no template")));
    }

    #[test]
    fn render_panic_is_caught() {
        assert_eq!(
            render(&Explosive, true),
            Err(RenderError::Panicked {
                info: "render blew up".to_string()
            })
        );
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(BindOutcome::TimedOut.as_label(), "timed_out");
        assert!(BindOutcome::Failed.pushed_final());
        assert!(!BindOutcome::Canceled.pushed_final());
        assert!(!BindOutcome::Completed.pushed_final());
    }
}
