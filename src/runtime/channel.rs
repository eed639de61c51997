//! Typed publish/subscribe channel for run events.
//!
//! Handlers are invoked synchronously, in subscription order, on the task
//! that publishes. This keeps the event order observed by every subscriber
//! identical to the order the engine produced.

use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use crate::events::{EventKind, WorkflowEvent};

pub type WorkflowEventHandle = Arc<dyn Fn(&WorkflowEvent) + Send + Sync>;

/// Token returned by [`Channel::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Subscription {
    id: HandlerId,
    /// `None` subscribes to every kind
    kind: Option<EventKind>,
    handle: WorkflowEventHandle,
}

#[derive(Default)]
pub struct Channel {
    handlers: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one kind of event.
    pub fn on(
        &self,
        kind: EventKind,
        f: impl Fn(&WorkflowEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.subscribe(Some(kind), Arc::new(f))
    }

    /// Subscribe to every event.
    pub fn on_any(
        &self,
        f: impl Fn(&WorkflowEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.subscribe(None, Arc::new(f))
    }

    /// Unsubscribe. Returns false if the handler was not registered.
    pub fn off(
        &self,
        id: HandlerId,
    ) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|s| s.id != id);
        handlers.len() != before
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn publish(
        &self,
        event: &WorkflowEvent,
    ) {
        let kind = event.kind();
        // clone out of the lock so handlers may subscribe or unsubscribe
        let matching: Vec<WorkflowEventHandle> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.kind.is_none_or(|k| k == kind))
            .map(|s| s.handle.clone())
            .collect();

        for handle in matching {
            (handle)(event);
        }
    }

    fn subscribe(
        &self,
        kind: Option<EventKind>,
        handle: WorkflowEventHandle,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().unwrap_or_else(PoisonError::into_inner).push(Subscription {
            id,
            kind,
            handle,
        });
        id
    }
}
