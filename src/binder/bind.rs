//! # Binder: tie a producer task to a rendezvous point's interest.
//!
//! [`Binder::bind`] spawns a [`Producer`] as a tokio task and registers an
//! interest-end callback on the point that cancels it, so "nobody cares about
//! the response anymore" propagates upstream and stops wasted work.
//!
//! ## Architecture
//! ```text
//! Binder::bind(point, producer)
//!   ├─► point.on_interest_end(cancel token)   (fires now if nobody is interested)
//!   └─► tokio::spawn(drive(..)) ─► producer.spawn(token) ─► point.push_*(..)
//!                                     │
//!            interest ends ──► token.cancel() ──► producer future dropped
//! ```
//!
//! ## Rules
//! - Cancellation flows one way: interest loss cancels the producer; the
//!   producer's own end never cancels anything else.
//! - Dropping the returned [`BoundTask`] detaches it; the interest binding
//!   still cancels the producer when interest ends.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    binder::{runner::drive, BindOutcome, ErrorResponse, Producer},
    config::BindConfig,
    diagnostics::Diagnose,
    rendezvous::Rendezvous,
};

/// Spawns producers bound to rendezvous points.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use rendezvous::{BindConfig, Binder, ErrorResponse, Event, ProduceError, ProducerFn, Rendezvous};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Reply(u16);
/// impl ErrorResponse for Reply {
///     fn internal_error() -> Self { Reply(500) }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let point: Rendezvous<&str, Reply, ()> = Rendezvous::with_tracing("GET /hello");
/// point.on_event(|ev: &Event<Reply, ()>| !ev.is_last).unwrap();
///
/// let responder = point.clone();
/// let binder = Binder::new(BindConfig::default().with_timeout(Duration::from_secs(5)));
/// let task = binder.bind(
///     &point,
///     ProducerFn::new("hello", move |_ctx| async move {
///         responder.push_response(Reply(205), true);
///         Ok::<(), ProduceError<Reply>>(())
///     }),
/// );
///
/// task.join().await;
/// assert!(point.is_ended());
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Binder {
    config: BindConfig,
    diagnostics: Option<Arc<dyn Diagnose>>,
}

impl Binder {
    /// Creates a binder applying `config` to every producer.
    pub fn new(config: BindConfig) -> Self {
        Self {
            config,
            diagnostics: None,
        }
    }

    /// Reports producer outcomes to `sink` instead of the point's own sink.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn Diagnose>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Spawns `producer` and ties its cancellation to `point`'s interest.
    ///
    /// If `point` currently has no interested observer, the producer is
    /// cancelled before it first runs.
    ///
    /// Called from inside `point`'s own dispatch, the producer is spawned right
    /// away and its interest binding takes effect when the pass completes.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn bind<R, M, E, P>(&self, point: &Rendezvous<R, M, E>, producer: P) -> BoundTask
    where
        R: Send + Sync + 'static,
        M: ErrorResponse + Send + 'static,
        E: Send + 'static,
        P: Producer<M>,
    {
        let name: Arc<str> = Arc::from(producer.name());
        let token = CancellationToken::new();

        let on_end = token.clone();
        point.on_interest_end(move || on_end.cancel());

        let diagnostics = self
            .diagnostics
            .clone()
            .unwrap_or_else(|| point.diagnostics());
        let span = tracing::info_span!("producer", name = %name, rendezvous = %point.label());
        let handle = tokio::spawn(
            drive(
                point.clone(),
                producer,
                token.clone(),
                self.config.clone(),
                diagnostics,
            )
            .instrument(span),
        );

        BoundTask {
            name,
            token,
            handle,
        }
    }
}

/// Binds `producer` to `point` with default settings.
///
/// Shorthand for `Binder::default().bind(point, producer)`.
pub fn bind<R, M, E, P>(point: &Rendezvous<R, M, E>, producer: P) -> BoundTask
where
    R: Send + Sync + 'static,
    M: ErrorResponse + Send + 'static,
    E: Send + 'static,
    P: Producer<M>,
{
    Binder::default().bind(point, producer)
}

/// Handle to a spawned, bound producer.
pub struct BoundTask {
    name: Arc<str>,
    token: CancellationToken,
    handle: JoinHandle<BindOutcome>,
}

impl BoundTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancels the producer. Nothing is pushed on its behalf.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the producer task to finish.
    pub async fn join(self) -> BindOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => BindOutcome::Panicked,
            Err(_) => BindOutcome::Canceled,
        }
    }
}

impl fmt::Debug for BoundTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTask")
            .field("name", &self.name)
            .field("cancelled", &self.token.is_cancelled())
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}
