// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Observer registry with replay for one-time events.
//!
//! Events are grouped by kind. Each kind has one registration holding its
//! subscribers, how many times it fired and the last event it carried. A
//! one-time kind that has already fired hands its last event straight to
//! late subscribers instead of queueing them.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::trace;

/// An event that can travel on an [`EventBus`]
pub trait BusEvent: Clone + 'static {
    /// Discriminant used as the registration key
    type Kind: Copy + Eq + Hash + fmt::Debug;

    /// Get the kind of this event
    fn kind(&self) -> Self::Kind;
}

/// Shared subscriber callback, handed the bus owner and the event
pub type Callback<E, C = ()> = Rc<dyn Fn(&C, &E)>;

/// Bookkeeping for one event kind
pub struct Registration<E, C = ()> {
    subscribers: Vec<Callback<E, C>>,
    dispatch_count: u64,
    one_time: bool,
    last_event: Option<E>,
}

impl<E, C> Registration<E, C> {
    fn new(one_time: bool) -> Self {
        Self {
            subscribers: Vec::new(),
            dispatch_count: 0,
            one_time,
            last_event: None,
        }
    }

    /// Number of callbacks waiting for the next dispatch
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// How many times this kind has been dispatched
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// Whether late subscribers get the last event replayed
    pub fn is_one_time(&self) -> bool {
        self.one_time
    }

    /// The event passed to the most recent dispatch
    pub fn last_event(&self) -> Option<&E> {
        self.last_event.as_ref()
    }
}

impl<E: fmt::Debug, C> fmt::Debug for Registration<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("subscribers", &self.subscribers.len())
            .field("dispatch_count", &self.dispatch_count)
            .field("one_time", &self.one_time)
            .field("last_event", &self.last_event)
            .finish()
    }
}

/// Synchronous fan-out of events to subscribers, keyed by event kind.
///
/// `C` is the owner of the bus. Callbacks receive it next to the event so
/// they can read the owner's state, or dispatch again, while a dispatch is
/// in progress. Subscribing and dispatching only need `&self`; no borrow of
/// the registrations is held while callbacks run.
pub struct EventBus<E: BusEvent, C = ()> {
    registrations: RefCell<HashMap<E::Kind, Registration<E, C>>>,
}

impl<E: BusEvent, C> EventBus<E, C> {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            registrations: RefCell::new(HashMap::new()),
        }
    }

    /// Register a kind if it is not registered yet.
    ///
    /// An existing registration is returned untouched, including its
    /// one-time flag.
    pub fn register(&mut self, kind: E::Kind, one_time: bool) -> &Registration<E, C> {
        self.registrations
            .get_mut()
            .entry(kind)
            .or_insert_with(|| Registration::new(one_time))
    }

    /// Add a callback for `kind`, registering the kind as re-firing if needed.
    ///
    /// If `kind` is one-time and has fired, the callback runs right away with
    /// `owner` and the last event and is not kept.
    pub fn subscribe<F>(&self, kind: E::Kind, owner: &C, callback: F)
    where
        F: Fn(&C, &E) + 'static,
    {
        let replay = {
            let mut registrations = self.registrations.borrow_mut();
            let registration = registrations
                .entry(kind)
                .or_insert_with(|| Registration::new(false));
            if registration.one_time && registration.dispatch_count != 0 {
                Some(registration.last_event.clone())
            } else {
                None
            }
        };

        match replay {
            Some(last_event) => {
                trace!(?kind, "replaying one-time event to late subscriber");
                if let Some(event) = last_event {
                    callback(owner, &event);
                }
            }
            None => {
                if let Some(registration) = self.registrations.borrow_mut().get_mut(&kind) {
                    registration.subscribers.push(Rc::new(callback));
                }
            }
        }
    }

    /// Deliver `event` to every subscriber of its kind, in subscription order.
    ///
    /// Returns `false` without side effects when the kind is not registered.
    /// Callbacks subscribed while the dispatch runs wait for the next one.
    pub fn dispatch(&self, owner: &C, event: E) -> bool {
        let kind = event.kind();
        let subscribers = {
            let mut registrations = self.registrations.borrow_mut();
            let Some(registration) = registrations.get_mut(&kind) else {
                trace!(?kind, "dispatch of unregistered event ignored");
                return false;
            };
            registration.dispatch_count += 1;
            registration.last_event = Some(event.clone());
            registration.subscribers.clone()
        };
        trace!(?kind, subscribers = subscribers.len(), "dispatching event");

        for callback in subscribers {
            callback(owner, &event);
        }
        true
    }

    /// Check whether `kind` has a registration
    pub fn is_registered(&self, kind: E::Kind) -> bool {
        self.registrations.borrow().contains_key(&kind)
    }

    /// Get the registration for `kind`.
    ///
    /// The returned guard must be dropped before the next subscribe or
    /// dispatch on this bus.
    pub fn registration(&self, kind: E::Kind) -> Option<Ref<'_, Registration<E, C>>> {
        Ref::filter_map(self.registrations.borrow(), |registrations| {
            registrations.get(&kind)
        })
        .ok()
    }
}

impl<E: BusEvent, C> Default for EventBus<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent + fmt::Debug, C> fmt::Debug for EventBus<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("EventBus");
        match self.registrations.try_borrow() {
            Ok(registrations) => out.field("registrations", &*registrations),
            Err(_) => out.field("registrations", &"<dispatching>"),
        };
        out.finish()
    }
}
