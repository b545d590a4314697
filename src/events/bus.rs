//! In-process event bus for the demo tour.
//!
//! Dispatch is synchronous and single-threaded: `emit` runs every matching
//! handler to completion before returning. Handlers registered for the
//! event's type run first, in registration order, followed by handlers
//! registered on the wildcard topic.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::types::DemoEvent;

/// Topic string that subscribes to every event
pub const WILDCARD: &str = "*";

/// Subscription key: a single event type or every event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Event(String),
    All,
}

impl Topic {
    pub fn event(event_type: impl Into<String>) -> Self {
        Topic::Event(event_type.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Topic::Event(event_type) => event_type,
            Topic::All => WILDCARD,
        }
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        if value == WILDCARD {
            Topic::All
        } else {
            Topic::Event(value.to_string())
        }
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Topic::from(value.as_str())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a subscriber. Logged by the bus, never propagated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type HandlerResult = Result<(), HandlerError>;

type Handler = Rc<dyn Fn(&DemoEvent) -> HandlerResult>;

struct Registration {
    id: u64,
    handler: Handler,
    active: Rc<Cell<bool>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: HashMap<Topic, Vec<Registration>>,
}

impl Registry {
    fn snapshot(&self, topic: &Topic) -> Vec<(u64, Handler, Rc<Cell<bool>>)> {
        self.topics
            .get(topic)
            .map(|registrations| {
                registrations
                    .iter()
                    .map(|r| (r.id, Rc::clone(&r.handler), Rc::clone(&r.active)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn remove(&mut self, topic: &Topic, id: u64) {
        if let Some(registrations) = self.topics.get_mut(topic) {
            registrations.retain(|r| r.id != id);
            if registrations.is_empty() {
                self.topics.remove(topic);
            }
        }
    }
}

/// Outcome counts for a single `emit` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn handlers_invoked(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Publish/subscribe channel for [`DemoEvent`]s.
///
/// Cloning the bus yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic` (an event type or `"*"`).
    ///
    /// Any topic is accepted, including event types no producer emits yet.
    pub fn subscribe<T, F>(&self, topic: T, handler: F) -> Subscription
    where
        T: Into<Topic>,
        F: Fn(&DemoEvent) -> HandlerResult + 'static,
    {
        let topic = topic.into();
        let active = Rc::new(Cell::new(true));

        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .topics
                .entry(topic.clone())
                .or_default()
                .push(Registration {
                    id,
                    handler: Rc::new(handler),
                    active: Rc::clone(&active),
                });
            id
        };

        trace!(topic = %topic, subscription_id = id, "Handler subscribed");

        Subscription {
            registry: Rc::downgrade(&self.registry),
            topic,
            id,
            active,
        }
    }

    /// Deliver `event` to every handler for its type, then to every wildcard
    /// handler. A failing or panicking handler is logged and skipped.
    pub fn emit(&self, event: DemoEvent) -> DispatchReport {
        // Registry borrow is released before any handler runs so handlers may
        // subscribe, unsubscribe or emit.
        let (typed, wildcard) = {
            let registry = self.registry.borrow();
            (
                registry.snapshot(&Topic::event(event.event_type())),
                registry.snapshot(&Topic::All),
            )
        };

        let mut report = DispatchReport::default();
        for (id, handler, active) in typed.into_iter().chain(wildcard) {
            if !active.get() {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(error)) => {
                    report.failed += 1;
                    warn!(
                        event_type = %event.event_type(),
                        subscription_id = id,
                        error = %error,
                        "Event handler failed"
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    warn!(
                        event_type = %event.event_type(),
                        subscription_id = id,
                        panic = %panic_message(payload.as_ref()),
                        "Event handler panicked"
                    );
                }
            }
        }

        debug!(
            event_type = %event.event_type(),
            delivered = report.delivered,
            failed = report.failed,
            "Event dispatched"
        );
        report
    }

    /// Number of live registrations across all topics
    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().topics.values().map(Vec::len).sum()
    }

    /// Number of live registrations for one topic
    pub fn handler_count(&self, topic: &Topic) -> usize {
        self.registry
            .borrow()
            .topics
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle for one registration. Dropping it leaves the handler registered.
#[must_use = "keep the Subscription to be able to unsubscribe the handler"]
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    topic: Topic,
    id: u64,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Remove exactly this registration. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.topic, self.id);
        }
        trace!(topic = %self.topic, subscription_id = self.id, "Handler unsubscribed");
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}
