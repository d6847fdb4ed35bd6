//! Observer list and the three-state machine guarding it.

use std::thread::ThreadId;

use crate::events::Event;

pub(crate) type EventCallback<M, E> = Box<dyn FnMut(&Event<M, E>) -> bool + Send>;
pub(crate) type InterestEndCallback = Box<dyn FnOnce() + Send>;

/// Whether an observer counts toward the point's aggregate interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interest {
    /// The observer wants events; while any such observer is registered the point stays open.
    #[default]
    Active,
    /// The observer only wants to see the end (it still receives every event and the tombstone).
    Passive,
}

/// One entry of the observer list.
pub(crate) enum Observer<M, E> {
    /// Registered through `register`; called for every event until it returns `false`.
    Event {
        id: u64,
        interest: Interest,
        callback: EventCallback<M, E>,
    },
    /// Deferred interest-end callback; fires on the first final event.
    InterestEnd { callback: InterestEndCallback },
}

impl<M, E> Observer<M, E> {
    pub(crate) fn id(&self) -> Option<u64> {
        match self {
            Observer::Event { id, .. } => Some(*id),
            Observer::InterestEnd { .. } => None,
        }
    }

    pub(crate) fn is_interested(&self) -> bool {
        matches!(
            self,
            Observer::Event {
                interest: Interest::Active,
                ..
            }
        )
    }

    /// Delivers `event`, returning the observer if it stays registered.
    pub(crate) fn deliver(self, event: &Event<M, E>) -> Option<Self> {
        match self {
            Observer::Event {
                id,
                interest,
                mut callback,
            } => callback(event).then_some(Observer::Event {
                id,
                interest,
                callback,
            }),
            Observer::InterestEnd { callback } if event.is_last => {
                callback();
                None
            }
            keep @ Observer::InterestEnd { .. } => Some(keep),
        }
    }
}

pub(crate) fn any_interest<M, E>(observers: &[Observer<M, E>]) -> bool {
    observers.iter().any(Observer::is_interested)
}

/// Operation that arrived from inside a dispatch pass and is applied after it.
pub(crate) enum Deferred<M, E> {
    Unregister(u64),
    Push(Event<M, E>),
    /// Joins the survivors, or fires if the pass ended the point.
    InterestEnd(InterestEndCallback),
}

/// Lifecycle of a rendezvous point.
///
/// ```text
/// Open ──dispatch──► Dispatching ──commit──► Open
///  │                      │
///  └──no interest──► Ended ◄──final event / no interest
/// ```
pub(crate) enum State<M, E> {
    Open {
        observers: Vec<Observer<M, E>>,
    },
    /// Observer list is checked out by the thread delivering an event.
    Dispatching {
        thread: ThreadId,
        deferred: Vec<Deferred<M, E>>,
    },
    Ended,
}

impl<M, E> State<M, E> {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            State::Open { .. } => "open",
            State::Dispatching { .. } => "dispatching",
            State::Ended => "ended",
        }
    }
}
