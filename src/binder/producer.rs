//! # Producer abstraction and function-backed implementation.
//!
//! A [`Producer`] is a one-shot computation feeding a rendezvous point. It has a
//! stable [`name`](Producer::name) and is consumed by [`spawn`](Producer::spawn),
//! which receives a [`CancellationToken`] cancelled once nobody is interested
//! in the responses anymore.
//!
//! [`ProducerFn`] wraps a closure `F: FnOnce(CancellationToken) -> Fut`.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use rendezvous::{ProduceError, Producer, ProducerFn};
//!
//! let p = ProducerFn::new("render", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(ProduceError::<u16>::Canceled);
//!     }
//!     // push responses...
//!     Ok(())
//! });
//!
//! assert_eq!(Producer::<u16>::name(&p), "render");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::ProduceError;

/// Boxed future returned by [`Producer::spawn`].
pub type BoxProduceFuture<M> =
    Pin<Box<dyn Future<Output = Result<(), ProduceError<M>>> + Send + 'static>>;

/// # One-shot, cancelable computation feeding a rendezvous point.
///
/// By contract the producer pushes whatever final event it needs before
/// returning `Ok(())`; the binder never synthesizes a success event.
/// Implementors should check `ctx` and return [`ProduceError::Canceled`]
/// (or just stop) once it is cancelled.
pub trait Producer<M>: Send + 'static {
    /// Returns a stable, human-readable name.
    fn name(&self) -> &str;

    /// Creates the future performing the work.
    fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxProduceFuture<M>;
}

/// Function-backed producer.
#[derive(Debug)]
pub struct ProducerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ProducerFn<F> {
    /// Creates a new function-backed producer.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the producer and returns it boxed, ready for a binder.
    pub fn boxed<M, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Box<dyn Producer<M>>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ProduceError<M>>> + Send + 'static,
        M: 'static,
    {
        Box::new(Self::new(name, f))
    }
}

impl<M, F, Fut> Producer<M> for ProducerFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ProduceError<M>>> + Send + 'static,
    M: 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxProduceFuture<M> {
        Box::pin((self.f)(ctx))
    }
}

impl<M: 'static> Producer<M> for Box<dyn Producer<M>> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxProduceFuture<M> {
        <dyn Producer<M>>::spawn(*self, ctx)
    }
}
