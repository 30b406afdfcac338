//! Publish/subscribe channel for watch-mode notifications.
//!
//! Delivery is synchronous, to every subscriber of the event's topic, in
//! registration order. Handlers run outside the subscriber lock and may
//! subscribe or unsubscribe from within a callback.

use crate::error::BuildError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    WatchChange,
    WatchComplete,
    WatchError,
}

#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A rebuild of the named category started.
    Change(String),
    /// A rebuild of the named category finished and the status is ready.
    Complete(String),
    /// A watcher or a triggered rebuild failed.
    Error(Arc<BuildError>),
}

impl WatchEvent {
    pub fn topic(&self) -> Topic {
        match self {
            WatchEvent::Change(_) => Topic::WatchChange,
            WatchEvent::Complete(_) => Topic::WatchComplete,
            WatchEvent::Error(_) => Topic::WatchError,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&WatchEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Topic, EventHandler)>,
}

/// Cloning shares the subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Subscribers>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionHandle
    where
        F: Fn(&WatchEvent) + Send + Sync + 'static,
    {
        let mut subs = self.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.entries.push((id, topic, Arc::new(handler)));
        SubscriptionHandle(id)
    }

    /// Returns false when the handle was already removed.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut subs = self.lock();
        let before = subs.entries.len();
        subs.entries.retain(|(id, _, _)| *id != handle.0);
        subs.entries.len() != before
    }

    pub fn publish(&self, event: &WatchEvent) {
        let topic = event.topic();
        let handlers: Vec<EventHandler> = self
            .lock()
            .entries
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }
}
