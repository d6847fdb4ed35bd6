//! # Rendezvous: meeting point between one request and its responses.
//!
//! A single request value is placed in the [`Rendezvous`] at creation time.
//! Responses, and any failure happening while producing them, are passed back
//! to the requester through it. A response can carry an indication of whether
//! it is final; a failure always is.
//!
//! ## Two-phase setup
//! ```text
//! originator:  new(request) ─► register(..) ─► on_interest_end? ─► hand to responder
//! responder:   on_interest_end(release) ─► push_response(..)* ─► push_response(.., true) | push_error(..)
//! ```
//! Response observers must be in place before the point is handed to the
//! responder: a responder registering `on_interest_end` on a point nobody
//! observes is told immediately that nobody cares.
//!
//! ## Dispatch
//! ```text
//! push ─► Open{observers} ─► Dispatching{thread}   (lock released)
//!                               │
//!                               ├─► observer 1 (event) ─► keep?
//!                               ├─► observer 2 (event) ─► keep?
//!                               └─► ...
//!                               ▼
//!         survivors − deferred removals ─► Open{survivors}
//!                               │
//!              final or no interest ─► Ended ─► tombstone to survivors (if not final)
//!                               │
//!              deferred pushes ─► next pass
//! ```
//!
//! ## Rules
//! - Observers see events in registration order.
//! - One dispatch pass per point at a time: callers on other threads wait for it,
//!   callers from inside it (same thread) are deferred, except `register`, which
//!   is rejected.
//! - A panicking callback is removed and reported as
//!   [`DiagnosticKind::ObserverPanicked`]; the pass goes on without it.
//! - Every observer sees exactly one final event: the producer's, or the tombstone.
//! - The point ends exactly once; late pushes are dropped with a [`DiagnosticKind::LateEvent`].
//! - No lock is held while observer or interest-end callbacks run.

use std::fmt;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;

use crate::diagnostics::{panic_info, Diagnose, Diagnostic, DiagnosticKind, TracingSink};
use crate::error::UsageError;
use crate::events::Event;

use super::registration::{Detach, Registration};
use super::state::{any_interest, Deferred, Interest, Observer, State};

/// Global counter naming rendezvous points in diagnostics.
static RENDEZVOUS_SEQ: AtomicU64 = AtomicU64::new(0);

type PokeHandler = Arc<dyn Fn() + Send + Sync>;

/// Meeting point between one request and any responses coming back on it.
///
/// Cheap to clone: all clones refer to the same point.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use rendezvous::{Event, Interest, Rendezvous};
///
/// let point: Rendezvous<&str, u16, String> = Rendezvous::with_tracing("GET /temp");
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// point
///     .register(
///         move |ev: &Event<u16, String>| {
///             sink.lock().unwrap().push(ev.clone());
///             !ev.is_last
///         },
///         Interest::Active,
///     )
///     .unwrap();
///
/// point.push_response(205, true);
/// assert!(point.is_ended());
/// assert_eq!(seen.lock().unwrap().as_slice(), &[Event::response(205, true)]);
/// ```
pub struct Rendezvous<R, M, E> {
    inner: Arc<Inner<R, M, E>>,
}

struct Inner<R, M, E> {
    id: u64,
    request: R,
    state: Mutex<State<M, E>>,
    /// Signalled whenever the state leaves `Dispatching`.
    idle: Condvar,
    next_observer: AtomicU64,
    poke: Mutex<Option<PokeHandler>>,
    diagnostics: Arc<dyn Diagnose>,
}

/// Result of acquiring the state for an operation.
enum Entry<'a, M, E> {
    /// No dispatch is in flight.
    Ready(MutexGuard<'a, State<M, E>>),
    /// The caller runs inside this point's dispatch on the current thread.
    Reentrant(MutexGuard<'a, State<M, E>>),
}

impl<R, M, E> Clone for Rendezvous<R, M, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, M, E> Rendezvous<R, M, E>
where
    R: Send + Sync + 'static,
    M: Send + 'static,
    E: Send + 'static,
{
    /// Creates an open point holding `request`, reporting to `diagnostics`.
    pub fn new(request: R, diagnostics: Arc<dyn Diagnose>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: RENDEZVOUS_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
                request,
                state: Mutex::new(State::Open {
                    observers: Vec::new(),
                }),
                idle: Condvar::new(),
                next_observer: AtomicU64::new(1),
                poke: Mutex::new(None),
                diagnostics,
            }),
        }
    }

    /// Creates an open point reporting to a [`TracingSink`].
    pub fn with_tracing(request: R) -> Self {
        Self::new(request, Arc::new(TracingSink::new()))
    }

    /// The request this point was created for.
    pub fn request(&self) -> &R {
        &self.inner.request
    }

    /// The diagnostic sink this point reports to.
    pub fn diagnostics(&self) -> Arc<dyn Diagnose> {
        Arc::clone(&self.inner.diagnostics)
    }

    /// Label used for this point in diagnostics.
    pub fn label(&self) -> String {
        self.inner.label()
    }

    /// Whether the point has ended.
    pub fn is_ended(&self) -> bool {
        matches!(*self.inner.lock(), State::Ended)
    }

    /// Whether at least one interested observer is registered.
    ///
    /// While a dispatch is in flight the observer list is checked out and
    /// this reports `true`: the point cannot end before the pass commits.
    pub fn has_interest(&self) -> bool {
        match &*self.inner.lock() {
            State::Open { observers } => any_interest(observers),
            State::Dispatching { .. } => true,
            State::Ended => false,
        }
    }

    /// Registers `callback` for every event until it returns `false`.
    ///
    /// The callback must return `true` to be called again. It must not produce
    /// events on this point or deregister unrelated observers; if it does, the
    /// operation is deferred until the current pass completes.
    ///
    /// An [`Interest::Passive`] observer does not keep the point open, but
    /// still receives events and eventually a final event.
    ///
    /// Registering on an ended point delivers the tombstone to `callback`
    /// immediately and returns an inert handle.
    ///
    /// # Errors
    /// [`UsageError::ReentrantRegistration`] when called from inside this
    /// point's own dispatch.
    pub fn register<F>(
        &self,
        callback: F,
        interest: Interest,
    ) -> Result<Registration, UsageError>
    where
        F: FnMut(&Event<M, E>) -> bool + Send + 'static,
    {
        let mut guard = match self.inner.enter() {
            Entry::Ready(guard) => guard,
            Entry::Reentrant(guard) => {
                drop(guard);
                let err = UsageError::ReentrantRegistration;
                self.inner.report(DiagnosticKind::ReentrantCall, Some(err.as_label()));
                return Err(err);
            }
        };

        match &mut *guard {
            State::Open { observers } => {
                let id = self.inner.next_observer.fetch_add(1, AtomicOrdering::Relaxed);
                observers.push(Observer::Event {
                    id,
                    interest,
                    callback: Box::new(callback),
                });
                drop(guard);
                let target: Weak<dyn Detach> = Arc::downgrade(&self.inner) as Weak<Inner<R, M, E>>;
                Ok(Registration::new(target, id))
            }
            _ => {
                drop(guard);
                self.inner.report(DiagnosticKind::LateRegistration, None);
                let mut callback = callback;
                callback(&Event::tombstone());
                Ok(Registration::inert())
            }
        }
    }

    /// Shorthand for `register(callback, Interest::Active)`.
    pub fn on_event<F>(&self, callback: F) -> Result<Registration, UsageError>
    where
        F: FnMut(&Event<M, E>) -> bool + Send + 'static,
    {
        self.register(callback, Interest::Active)
    }

    /// Calls `callback` exactly once: right now if there is no interest, or at
    /// the first final event (including the tombstone) otherwise.
    ///
    /// Called from inside this point's own dispatch, the registration is
    /// applied when the pass completes; the callback fires right then if the
    /// pass ended the point.
    ///
    /// Registering on an ended point fires immediately and reports
    /// [`DiagnosticKind::LateInterestEnd`]; this typically means two responders
    /// race on one logical exchange.
    pub fn on_interest_end<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut guard = match self.inner.enter() {
            Entry::Ready(guard) => guard,
            Entry::Reentrant(mut guard) => {
                if let State::Dispatching { deferred, .. } = &mut *guard {
                    deferred.push(Deferred::InterestEnd(Box::new(callback)));
                }
                return;
            }
        };

        match &mut *guard {
            State::Open { observers } if any_interest(observers) => {
                observers.push(Observer::InterestEnd {
                    callback: Box::new(callback),
                });
            }
            State::Open { .. } => {
                drop(guard);
                callback();
            }
            _ => {
                drop(guard);
                self.inner.report(DiagnosticKind::LateInterestEnd, None);
                callback();
            }
        }
    }

    /// Pushes a response; `is_last` ends the point after delivery.
    pub fn push_response(&self, response: M, is_last: bool) {
        self.inner.dispatch(Event::response(response, is_last));
    }

    /// Pushes a failure; failures always end the point.
    pub fn push_error(&self, error: E) {
        self.inner.dispatch(Event::error(error));
    }

    /// Asks the responder for a life sign.
    ///
    /// It is up to the responder to ignore this, to check the underlying
    /// connection, or to retransmit the request. Nothing is reported back
    /// directly; if whatever the responder does fails, it pushes an error.
    pub fn poke(&self) {
        if self.is_ended() {
            return;
        }
        let handler = self
            .inner
            .poke
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler(),
            None => self.inner.report(DiagnosticKind::PokeUnsupported, None),
        }
    }

    /// Installs the responder's liveness handler called by [`poke`](Self::poke),
    /// replacing any previous one.
    pub fn on_poke<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.inner.poke.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }
}

impl<R, M, E> Inner<R, M, E> {
    fn label(&self) -> String {
        format!("rendezvous#{}", self.id)
    }

    fn lock(&self) -> MutexGuard<'_, State<M, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the state, waiting out dispatch passes running on other threads.
    fn enter(&self) -> Entry<'_, M, E> {
        let me = thread::current().id();
        let mut guard = self.lock();
        loop {
            match &*guard {
                State::Dispatching { thread, .. } if *thread == me => {
                    return Entry::Reentrant(guard)
                }
                State::Dispatching { .. } => {
                    guard = self.idle.wait(guard).unwrap_or_else(PoisonError::into_inner);
                }
                State::Open { .. } | State::Ended => return Entry::Ready(guard),
            }
        }
    }

    fn report(&self, kind: DiagnosticKind, reason: Option<&str>) {
        let mut d = Diagnostic::new(kind).with_label(self.label());
        if let Some(reason) = reason {
            d = d.with_reason(reason);
        }
        self.diagnostics.on_diagnostic(&d);
    }

    fn report_late(&self, event: &Event<M, E>) {
        let what = if event.is_error() {
            "error"
        } else if event.is_last {
            "final response"
        } else {
            "response"
        };
        self.report(DiagnosticKind::LateEvent, Some(what));
    }

    /// Moves the point to `Ended` and delivers the tombstone to `observers`.
    fn finish(&self, mut guard: MutexGuard<'_, State<M, E>>, observers: Vec<Observer<M, E>>) {
        *guard = State::Ended;
        drop(guard);
        self.idle.notify_all();

        let tombstone = Event::tombstone();
        for observer in observers {
            let _ = self.deliver(observer, &tombstone);
        }
    }

    /// Delivers `event` to one observer; a panicking callback is dropped.
    fn deliver(&self, observer: Observer<M, E>, event: &Event<M, E>) -> Option<Observer<M, E>> {
        match catch_unwind(AssertUnwindSafe(|| observer.deliver(event))) {
            Ok(kept) => kept,
            Err(panic_err) => {
                let info = panic_info(panic_err.as_ref());
                self.report(DiagnosticKind::ObserverPanicked, Some(&info));
                None
            }
        }
    }

    fn dispatch(&self, event: Event<M, E>) {
        let mut guard = match self.enter() {
            Entry::Ready(guard) => guard,
            Entry::Reentrant(mut guard) => {
                if let State::Dispatching { deferred, .. } = &mut *guard {
                    deferred.push(Deferred::Push(event));
                }
                return;
            }
        };

        let me = thread::current().id();
        let mut pending = std::collections::VecDeque::from([event]);

        while let Some(event) = pending.pop_front() {
            let checked_out = mem::replace(
                &mut *guard,
                State::Dispatching {
                    thread: me,
                    deferred: Vec::new(),
                },
            );
            let observers = match checked_out {
                State::Open { observers } => observers,
                other => {
                    *guard = other;
                    drop(guard);
                    self.idle.notify_all();
                    self.report_late(&event);
                    for late in pending {
                        self.report_late(&late);
                    }
                    return;
                }
            };
            drop(guard);

            let mut survivors = Vec::with_capacity(observers.len());
            for observer in observers {
                if let Some(kept) = self.deliver(observer, &event) {
                    survivors.push(kept);
                }
            }

            guard = self.lock();
            let committed = mem::replace(
                &mut *guard,
                State::Open {
                    observers: Vec::new(),
                },
            );
            if let State::Dispatching { deferred, .. } = committed {
                for op in deferred {
                    match op {
                        Deferred::Unregister(id) => survivors.retain(|o| o.id() != Some(id)),
                        Deferred::Push(ev) => pending.push_back(ev),
                        Deferred::InterestEnd(callback) => {
                            survivors.push(Observer::InterestEnd { callback })
                        }
                    }
                }
            }

            if event.is_last {
                // Every survivor has just seen a final event; no tombstone.
                *guard = State::Ended;
                drop(guard);
                self.idle.notify_all();
                // interest-end callbacks deferred during this pass
                for observer in survivors.into_iter().filter(|o| o.id().is_none()) {
                    let _ = self.deliver(observer, &event);
                }
                for late in pending {
                    self.report_late(&late);
                }
                return;
            }
            if !any_interest(&survivors) {
                self.finish(guard, survivors);
                for late in pending {
                    self.report_late(&late);
                }
                return;
            }
            *guard = State::Open {
                observers: survivors,
            };
        }

        drop(guard);
        self.idle.notify_all();
    }
}

impl<R, M, E> Detach for Inner<R, M, E>
where
    R: Send + Sync,
    M: Send,
    E: Send,
{
    fn detach(&self, id: u64) {
        let mut guard = match self.enter() {
            Entry::Ready(guard) => guard,
            Entry::Reentrant(mut guard) => {
                if let State::Dispatching { deferred, .. } = &mut *guard {
                    deferred.push(Deferred::Unregister(id));
                }
                return;
            }
        };

        let State::Open { observers } = &mut *guard else {
            return;
        };
        observers.retain(|o| o.id() != Some(id));
        if !any_interest(observers) {
            let observers = mem::take(observers);
            self.finish(guard, observers);
        }
    }
}

impl<R: fmt::Debug, M, E> fmt::Debug for Rendezvous<R, M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.lock();
        let observers = match &*guard {
            State::Open { observers } => Some(observers.len()),
            _ => None,
        };
        f.debug_struct("Rendezvous")
            .field("id", &self.inner.id)
            .field("request", &self.inner.request)
            .field("state", &guard.as_label())
            .field("observers", &observers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::testing::{Journal, Recorder};

    type Point = Rendezvous<&'static str, u16, &'static str>;

    fn point() -> (Point, Arc<Recorder>) {
        let rec = Recorder::arc();
        (Rendezvous::new("GET /temp", rec.clone()), rec)
    }

    fn describe(ev: &Event<u16, &'static str>) -> String {
        match (&ev.response, &ev.error) {
            (Some(code), _) if ev.is_last => format!("{code}!"),
            (Some(code), _) => code.to_string(),
            (None, Some(err)) => format!("err:{err}"),
            (None, None) => "tombstone".to_string(),
        }
    }

    fn observer(
        journal: &Journal,
        name: &'static str,
    ) -> impl FnMut(&Event<u16, &'static str>) -> bool + Send + 'static {
        let journal = journal.clone();
        move |ev| {
            journal.push(format!("{name}:{}", describe(ev)));
            !ev.is_last
        }
    }

    #[test]
    fn observers_see_events_in_registration_order() {
        let (p, _) = point();
        let j = Journal::default();
        for name in ["A", "B", "C"] {
            p.on_event(observer(&j, name)).unwrap();
        }

        p.push_response(1, false);
        p.push_response(2, true);

        assert_eq!(
            j.entries(),
            vec!["A:1", "B:1", "C:1", "A:2!", "B:2!", "C:2!"]
        );
        assert!(p.is_ended());
    }

    #[test]
    fn final_response_is_the_only_final_event() {
        let (p, _) = point();
        let j = Journal::default();
        p.on_event(observer(&j, "A")).unwrap();
        p.register(observer(&j, "P"), Interest::Passive).unwrap();

        p.push_response(205, true);

        assert_eq!(j.entries(), vec!["A:205!", "P:205!"]);
        assert!(p.is_ended());
    }

    #[test]
    fn error_ends_the_point() {
        let (p, _) = point();
        let j = Journal::default();
        p.on_event(observer(&j, "A")).unwrap();

        p.push_error("reset");

        assert_eq!(j.entries(), vec!["A:err:reset"]);
        assert!(p.is_ended());
        assert!(!p.has_interest());
    }

    #[test]
    fn observer_declining_further_events_is_removed() {
        let (p, _) = point();
        let j = Journal::default();
        let jj = j.clone();
        p.on_event(move |ev| {
            jj.push(format!("once:{}", describe(ev)));
            false
        })
        .unwrap();
        p.on_event(observer(&j, "B")).unwrap();

        p.push_response(1, false);
        p.push_response(2, false);

        assert_eq!(j.entries(), vec!["once:1", "B:1", "B:2"]);
        assert!(!p.is_ended());
    }

    #[test]
    fn losing_all_interest_delivers_tombstone_to_passive_observers() {
        let (p, _) = point();
        let j = Journal::default();
        let jj = j.clone();
        p.on_event(move |ev| {
            jj.push(format!("A:{}", describe(ev)));
            false
        })
        .unwrap();
        p.register(observer(&j, "P"), Interest::Passive).unwrap();

        p.push_response(1, false);

        assert_eq!(j.entries(), vec!["A:1", "P:1", "P:tombstone"]);
        assert!(p.is_ended());
    }

    #[test]
    fn unregistering_last_interest_ends_point() {
        let (p, _) = point();
        let j = Journal::default();
        let a = p.on_event(observer(&j, "A")).unwrap();
        let b = p.on_event(observer(&j, "B")).unwrap();
        p.register(observer(&j, "P"), Interest::Passive).unwrap();

        a.unregister();
        assert!(!p.is_ended());
        b.unregister();

        assert!(p.is_ended());
        assert_eq!(j.entries(), vec!["P:tombstone"]);

        // idempotent, and no-op after end
        b.unregister();
        a.unregister();
        assert_eq!(j.entries(), vec!["P:tombstone"]);
    }

    #[test]
    fn every_observer_sees_exactly_one_final_event() {
        let (p, _) = point();
        let finals = Arc::new(AtomicUsize::new(0));
        let after_final = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();
        for i in 0..4 {
            let finals = finals.clone();
            let after_final = after_final.clone();
            let mut done = false;
            let interest = if i % 2 == 0 { Interest::Active } else { Interest::Passive };
            handles.push(
                p.register(
                    move |ev: &Event<u16, &'static str>| {
                        if done {
                            after_final.store(true, Ordering::SeqCst);
                        }
                        if ev.is_last {
                            done = true;
                            finals.fetch_add(1, Ordering::SeqCst);
                        }
                        // keeps asking for more, even after the final one
                        true
                    },
                    interest,
                )
                .unwrap(),
            );
        }

        p.push_response(1, false);
        handles[0].unregister();
        p.push_response(2, false);
        handles[2].unregister();
        p.push_response(3, true);
        p.push_error("late");

        assert_eq!(finals.load(Ordering::SeqCst), 2, "two passive observers got the tombstone");
        assert!(!after_final.load(Ordering::SeqCst));
    }

    #[test]
    fn interest_end_fires_at_final_event() {
        let (p, _) = point();
        let j = Journal::default();
        p.on_event(observer(&j, "A")).unwrap();
        let jj = j.clone();
        p.on_interest_end(move || jj.push("end"));

        p.push_response(1, false);
        assert_eq!(j.entries(), vec!["A:1"]);

        p.push_response(2, true);
        assert_eq!(j.entries(), vec!["A:1", "A:2!", "end"]);
    }

    #[test]
    fn interest_end_fires_immediately_without_interest() {
        let (p, rec) = point();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        p.on_interest_end(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(rec.kinds().is_empty());
    }

    #[test]
    fn interest_end_fires_on_unregister() {
        let (p, _) = point();
        let fired = Arc::new(AtomicUsize::new(0));
        let a = p.on_event(|_| true).unwrap();
        let f = fired.clone();
        p.on_interest_end(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        a.unregister();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        a.unregister();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn interest_end_after_end_fires_and_reports() {
        let (p, rec) = point();
        p.on_event(|_| true).unwrap();
        p.push_response(1, true);

        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        p.on_interest_end(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(rec.kinds(), vec![DiagnosticKind::LateInterestEnd]);
    }

    #[test]
    fn late_push_is_dropped_and_reported() {
        let (p, rec) = point();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        p.register(
            move |_| {
                c.fetch_add(1, Ordering::SeqCst);
                true
            },
            Interest::Active,
        )
        .unwrap();
        p.push_response(1, true);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        p.push_response(2, false);
        p.push_error("again");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            rec.reasons(DiagnosticKind::LateEvent),
            vec!["response".to_string(), "error".to_string()]
        );
    }

    #[test]
    fn push_without_observers_ends_point() {
        let (p, _) = point();
        p.push_response(1, false);
        assert!(p.is_ended());
    }

    #[test]
    fn push_from_inside_callback_is_deferred() {
        let (p, _) = point();
        let j = Journal::default();
        let jj = j.clone();
        let responder = p.clone();
        p.on_event(move |ev| {
            jj.push(format!("A:{}", describe(ev)));
            if ev.response == Some(1) {
                responder.push_response(2, false);
            }
            !ev.is_last
        })
        .unwrap();
        p.on_event(observer(&j, "B")).unwrap();

        p.push_response(1, false);

        assert_eq!(j.entries(), vec!["A:1", "B:1", "A:2", "B:2"]);
        assert!(!p.is_ended());
    }

    #[test]
    fn deferred_push_after_final_is_late() {
        let (p, rec) = point();
        let responder = p.clone();
        p.on_event(move |ev| {
            if ev.is_last {
                responder.push_response(9, false);
            }
            true
        })
        .unwrap();

        p.push_response(1, true);

        assert!(p.is_ended());
        assert_eq!(rec.kinds(), vec![DiagnosticKind::LateEvent]);
    }

    #[test]
    fn self_unregister_inside_callback_is_deferred() {
        let (p, _) = point();
        let j = Journal::default();
        let slot: Arc<Mutex<Option<Registration>>> = Arc::new(Mutex::new(None));
        let s = slot.clone();
        let jj = j.clone();
        let handle = p
            .on_event(move |ev| {
                jj.push(format!("A:{}", describe(ev)));
                if let Some(reg) = s.lock().unwrap().as_ref() {
                    reg.unregister();
                }
                true
            })
            .unwrap();
        *slot.lock().unwrap() = Some(handle);
        p.register(observer(&j, "P"), Interest::Passive).unwrap();

        p.push_response(1, false);

        assert_eq!(j.entries(), vec!["A:1", "P:1", "P:tombstone"]);
        assert!(p.is_ended());
    }

    #[test]
    fn registration_from_inside_callback_is_rejected() {
        let (p, rec) = point();
        let inner = p.clone();
        let outcome = Arc::new(Mutex::new(Vec::new()));
        let o = outcome.clone();
        p.on_event(move |_| {
            o.lock().unwrap().push(inner.on_event(|_| true).err());
            true
        })
        .unwrap();

        p.push_response(1, false);

        assert_eq!(*outcome.lock().unwrap(), vec![Some(UsageError::ReentrantRegistration)]);
        assert_eq!(rec.kinds(), vec![DiagnosticKind::ReentrantCall]);
        assert!(!p.is_ended());
    }

    #[test]
    fn interest_end_from_inside_callback_joins_after_the_pass() {
        let (p, rec) = point();
        let j = Journal::default();
        let inner = p.clone();
        let jj = j.clone();
        p.on_event(move |ev| {
            jj.push(format!("A:{}", describe(ev)));
            if ev.response == Some(1) {
                let jjj = jj.clone();
                inner.on_interest_end(move || jjj.push("end"));
            }
            !ev.is_last
        })
        .unwrap();

        p.push_response(1, false);
        assert_eq!(j.entries(), vec!["A:1"]);

        p.push_response(2, true);
        assert_eq!(j.entries(), vec!["A:1", "A:2!", "end"]);
        assert!(rec.kinds().is_empty());
    }

    #[test]
    fn interest_end_from_inside_final_dispatch_fires_after_it() {
        let (p, _) = point();
        let j = Journal::default();
        let inner = p.clone();
        let jj = j.clone();
        p.on_event(move |ev| {
            jj.push(format!("A:{}", describe(ev)));
            let jjj = jj.clone();
            inner.on_interest_end(move || jjj.push("end"));
            !ev.is_last
        })
        .unwrap();
        p.register(observer(&j, "P"), Interest::Passive).unwrap();

        p.push_response(7, true);

        assert_eq!(j.entries(), vec!["A:7!", "P:7!", "end"]);
        assert!(p.is_ended());
    }

    #[test]
    fn interest_end_from_inside_last_interested_callback_fires_with_tombstone() {
        let (p, _) = point();
        let fired = Arc::new(AtomicUsize::new(0));
        let inner = p.clone();
        let f = fired.clone();
        p.on_event(move |_| {
            let f = f.clone();
            inner.on_interest_end(move || {
                f.fetch_add(1, Ordering::SeqCst);
            });
            false
        })
        .unwrap();

        p.push_response(1, false);

        assert!(p.is_ended());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_observer_is_removed_and_dispatch_goes_on() {
        let (p, rec) = point();
        let j = Journal::default();
        p.on_event(|ev| {
            if ev.response == Some(1) {
                panic!("observer blew up");
            }
            true
        })
        .unwrap();
        p.on_event(observer(&j, "B")).unwrap();

        p.push_response(1, false);

        assert_eq!(j.entries(), vec!["B:1"]);
        assert_eq!(
            rec.reasons(DiagnosticKind::ObserverPanicked),
            vec!["observer blew up".to_string()]
        );
        assert!(format!("{p:?}").contains("\"open\""));

        // the point is usable again from this thread and from others
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        p.on_interest_end(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        std::thread::scope(|s| {
            let p = p.clone();
            s.spawn(move || p.push_response(2, false));
        });
        p.push_response(3, true);

        assert_eq!(j.entries(), vec!["B:1", "B:2", "B:3!"]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(p.is_ended());
    }

    #[test]
    fn panic_of_only_interested_observer_ends_the_point() {
        let (p, rec) = point();
        let j = Journal::default();
        p.on_event(|_| panic!("gone")).unwrap();
        p.register(observer(&j, "P"), Interest::Passive).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        p.on_interest_end(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        p.push_response(1, false);

        assert_eq!(j.entries(), vec!["P:1", "P:tombstone"]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(rec.kinds(), vec![DiagnosticKind::ObserverPanicked]);
        assert!(p.is_ended());
    }

    #[test]
    fn panicking_interest_end_callback_does_not_wedge_the_point() {
        let (p, rec) = point();
        let j = Journal::default();
        p.on_event(observer(&j, "A")).unwrap();
        p.on_interest_end(|| panic!("cleanup failed"));

        p.push_response(1, true);

        assert!(p.is_ended());
        assert_eq!(j.entries(), vec!["A:1!"]);
        p.push_response(2, false);
        assert_eq!(
            rec.kinds(),
            vec![DiagnosticKind::ObserverPanicked, DiagnosticKind::LateEvent]
        );
    }

    #[test]
    fn unregister_from_other_thread_waits_for_the_pass() {
        let (p, _) = point();
        let j = Journal::default();
        let entered = Arc::new(Barrier::new(2));
        let e = entered.clone();
        let jj = j.clone();
        let a = p
            .on_event(move |ev| {
                jj.push(format!("A:{}", describe(ev)));
                if ev.response == Some(1) {
                    e.wait();
                    std::thread::sleep(Duration::from_millis(30));
                    jj.push("A:done");
                }
                true
            })
            .unwrap();
        p.register(observer(&j, "P"), Interest::Passive).unwrap();

        std::thread::scope(|s| {
            let jj = j.clone();
            s.spawn(move || {
                entered.wait();
                a.unregister();
                jj.push("unregistered");
            });
            p.push_response(1, false);
        });

        // the last interest went away only after the pass committed
        assert_eq!(
            j.entries(),
            vec!["A:1", "A:done", "P:1", "P:tombstone", "unregistered"]
        );
        assert!(p.is_ended());
    }

    #[test]
    fn registrations_from_other_thread_wait_for_the_pass() {
        let (p, rec) = point();
        let j = Journal::default();
        let entered = Arc::new(Barrier::new(2));
        let e = entered.clone();
        let jj = j.clone();
        p.on_event(move |ev| {
            jj.push(format!("A:{}", describe(ev)));
            if ev.response == Some(1) {
                e.wait();
                std::thread::sleep(Duration::from_millis(30));
                jj.push("A:done");
            }
            !ev.is_last
        })
        .unwrap();

        std::thread::scope(|s| {
            let (other, jj) = (p.clone(), j.clone());
            s.spawn(move || {
                entered.wait();
                other.on_event(observer(&jj, "N")).unwrap();
                other.on_interest_end(move || jj.push("end"));
            });
            p.push_response(1, false);
        });

        // N joined after the pass, so it never saw the first event
        assert_eq!(j.entries(), vec!["A:1", "A:done"]);

        p.push_response(2, true);
        assert_eq!(j.entries(), vec!["A:1", "A:done", "A:2!", "N:2!", "end"]);
        assert!(rec.kinds().is_empty());
    }

    #[test]
    fn registration_after_end_receives_tombstone() {
        let (p, rec) = point();
        p.push_response(1, true);

        let j = Journal::default();
        let handle = p.on_event(observer(&j, "late")).unwrap();

        assert!(handle.is_inert());
        handle.unregister();
        assert_eq!(j.entries(), vec!["late:tombstone"]);
        assert_eq!(rec.kinds(), vec![DiagnosticKind::LateRegistration]);
    }

    #[test]
    fn poke_forwards_to_responder() {
        let (p, rec) = point();
        p.on_event(|_| true).unwrap();

        p.poke();
        assert_eq!(rec.kinds(), vec![DiagnosticKind::PokeUnsupported]);

        let pokes = Arc::new(AtomicUsize::new(0));
        let c = pokes.clone();
        p.on_poke(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        p.poke();
        p.poke();
        assert_eq!(pokes.load(Ordering::SeqCst), 2);

        p.push_response(1, true);
        p.poke();
        assert_eq!(pokes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_pushes_never_overlap() {
        let (p, _) = point();
        let busy = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));
        let count = Arc::new(AtomicUsize::new(0));
        {
            let (busy, overlapped, count) = (busy.clone(), overlapped.clone(), count.clone());
            p.on_event(move |_| {
                if busy.swap(true, Ordering::SeqCst) {
                    overlapped.store(true, Ordering::SeqCst);
                }
                count.fetch_add(1, Ordering::SeqCst);
                std::thread::yield_now();
                busy.store(false, Ordering::SeqCst);
                true
            })
            .unwrap();
        }

        std::thread::scope(|s| {
            for _ in 0..4 {
                let p = p.clone();
                s.spawn(move || {
                    for code in 0..100 {
                        p.push_response(code, false);
                    }
                });
            }
        });

        assert_eq!(count.load(Ordering::SeqCst), 400);
        assert!(!overlapped.load(Ordering::SeqCst));
        assert!(!p.is_ended());
    }

    #[test]
    fn debug_shows_request_and_state() {
        let (p, _) = point();
        p.on_event(|_| true).unwrap();
        let open = format!("{p:?}");
        assert!(open.contains("GET /temp"));
        assert!(open.contains("\"open\""));
        assert!(open.contains("Some(1)"));

        p.push_response(1, true);
        assert!(format!("{p:?}").contains("\"ended\""));
        assert!(p.label().starts_with("rendezvous#"));
        assert_eq!(*p.request(), "GET /temp");
    }
}
