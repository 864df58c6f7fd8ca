use crate::events::{EventKind, SessionEvent};
use crate::interviewer::AssistantConfig;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A callback registered for one kind of session event.
pub type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Identifies a registered handler so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// What the call should run: a stored workflow or an inline assistant.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Workflow(String),
    Assistant(AssistantConfig),
}

/// Everything the call session service needs to open a call.
#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    pub target: CallTarget,
    pub variable_values: BTreeMap<String, String>,
}

/// A real-time voice call session provider.
///
/// Implementations own the connection to the speech backend. Events are
/// delivered to handlers registered with `on`; `start` and `stop` only
/// request state changes, the resulting `call-start`/`call-end` events arrive
/// through the handlers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CallSessionService: Send + Sync {
    /// Requests a new call. An error means the call could not be opened.
    async fn start(&self, request: StartRequest) -> Result<()>;

    /// Requests the current call to stop.
    async fn stop(&self) -> Result<()>;

    /// Registers a handler for one event kind.
    fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId;

    /// Removes a handler previously registered with `on`.
    fn off(&self, kind: EventKind, id: HandlerId);
}

/// An in-process handler registry that call session adapters build on.
#[derive(Default)]
pub struct EventHub {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<EventKind, Vec<(HandlerId, EventHandler)>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.handlers.lock() {
            Ok(mut handlers) => handlers.entry(kind).or_default().push((id, handler)),
            Err(e) => tracing::error!("event hub lock poisoned, handler not registered: {}", e),
        }
        id
    }

    /// Returns `true` if a handler was removed.
    pub fn off(&self, kind: EventKind, id: HandlerId) -> bool {
        let Ok(mut handlers) = self.handlers.lock() else {
            tracing::error!("event hub lock poisoned, handler not removed");
            return false;
        };
        let Some(registered) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|(registered_id, _)| *registered_id != id);
        before != registered.len()
    }

    /// Invokes every handler registered for the event's kind, in registration
    /// order. Handlers run outside the registry lock.
    pub fn emit(&self, event: &SessionEvent) {
        let handlers: Vec<EventHandler> = match self.handlers.lock() {
            Ok(handlers) => handlers
                .get(&event.kind())
                .map(|registered| registered.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::error!("event hub lock poisoned, dropping {:?}: {}", event.kind(), e);
                return;
            }
        };
        for handler in handlers {
            handler(event);
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .lock()
            .map(|handlers| handlers.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_handler(counter: Arc<AtomicUsize>) -> EventHandler {
        Arc::new(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn emit_reaches_only_handlers_of_that_kind() {
        let hub = EventHub::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let ends = Arc::new(AtomicUsize::new(0));
        hub.on(EventKind::CallStart, counting_handler(starts.clone()));
        hub.on(EventKind::CallEnd, counting_handler(ends.clone()));

        hub.emit(&SessionEvent::CallStart);
        hub.emit(&SessionEvent::CallStart);

        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(ends.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn off_removes_exactly_one_handler() {
        let hub = EventHub::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let first = hub.on(EventKind::Error, counting_handler(counter.clone()));
        hub.on(EventKind::Error, counting_handler(counter.clone()));

        assert!(hub.off(EventKind::Error, first));
        assert!(!hub.off(EventKind::Error, first));
        assert_eq!(hub.handler_count(EventKind::Error), 1);

        hub.emit(&SessionEvent::Error("boom".into()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_with_wrong_kind_keeps_handler() {
        let hub = EventHub::new();
        let id = hub.on(EventKind::SpeechStart, Arc::new(|_| {}));

        assert!(!hub.off(EventKind::SpeechEnd, id));
        assert_eq!(hub.handler_count(EventKind::SpeechStart), 1);
    }
}
