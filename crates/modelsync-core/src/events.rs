//! Event system
//!
//! Observers register a handler for one event kind and get back a
//! [`Subscription`] that can cancel it. Delivery is synchronous: handlers run
//! on the task that completed the triggering operation, in registration order.
//!
//! The registry lock is only held while registering or collecting handlers,
//! so a handler may itself subscribe or cancel.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// An event that can be routed to observers by kind
pub trait Event {
    type Kind: PartialEq + Clone + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Which operation produced a model event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Set,
    Unset,
    Fetch,
    Save,
    /// Explicit `is_valid` check
    Check,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Origin::Set => "set",
            Origin::Unset => "unset",
            Origin::Fetch => "fetch",
            Origin::Save => "save",
            Origin::Check => "check",
        };
        write!(f, "{}", s)
    }
}

/// Detail carried by a `change` notification
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDetail {
    pub origin: Origin,
    /// Location used for fetch/save
    pub location: Option<String>,
    /// Whether validation was requested for the operation
    pub validate: bool,
    /// Attributes whose value changed
    pub changed: Vec<String>,
}

/// Notifications emitted by a model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// Attributes were updated
    Change(ChangeDetail),
    /// A candidate attribute set was rejected
    Invalid { origin: Origin, reason: String },
    /// A fetch or save failed
    Error {
        origin: Origin,
        location: String,
        message: String,
    },
}

/// Model event kinds observers can register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    Invalid,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Change => "change",
            EventKind::Invalid => "invalid",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Event for ModelEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            ModelEvent::Change(_) => EventKind::Change,
            ModelEvent::Invalid { .. } => EventKind::Invalid,
            ModelEvent::Error { .. } => EventKind::Error,
        }
    }
}

type Handler<S, E> = Arc<dyn Fn(&S, &E) + Send + Sync>;

struct Entry<S, E: Event> {
    id: u64,
    kind: E::Kind,
    handler: Handler<S, E>,
}

struct Registry<S, E: Event> {
    next_id: u64,
    entries: Vec<Entry<S, E>>,
}

/// Type-erased view of a registry, held weakly by subscriptions
trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

impl<S, E: Event> Detach for Mutex<Registry<S, E>> {
    fn detach(&self, id: u64) -> bool {
        let mut registry = self.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.entries.len();
        registry.entries.retain(|e| e.id != id);
        registry.entries.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        let registry = self.lock().unwrap_or_else(PoisonError::into_inner);
        registry.entries.iter().any(|e| e.id == id)
    }
}

/// Observer registry owned by an event source `S`
pub struct Observers<S, E: Event> {
    registry: Arc<Mutex<Registry<S, E>>>,
}

impl<S: 'static, E: Event + 'static> Observers<S, E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a handler for one event kind
    pub fn subscribe<F>(&self, kind: E::Kind, handler: F) -> Subscription
    where
        F: Fn(&S, &E) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            kind,
            handler: Arc::new(handler),
        });
        drop(registry);

        let weak: Weak<Mutex<Registry<S, E>>> = Arc::downgrade(&self.registry);
        Subscription {
            id,
            registry: weak,
        }
    }

    /// Deliver an event to every handler registered for its kind
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, source: &S, event: &E) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler<S, E>> = self
            .lock()
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| Arc::clone(&e.handler))
            .collect();

        for handler in &handlers {
            handler(source, event);
        }
        handlers.len()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Registry<S, E>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: 'static, E: Event + 'static> Default for Observers<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E: Event> fmt::Debug for Observers<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .registry
            .lock()
            .map(|r| r.entries.len())
            .unwrap_or_default();
        f.debug_struct("Observers").field("handlers", &count).finish()
    }
}

/// Handle to a registered handler
///
/// Dropping the handle leaves the handler registered; call [`cancel`](Self::cancel)
/// to remove it.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the handler is still registered
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }

    /// Remove the handler. Returns false if it was already gone.
    pub fn cancel(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.detach(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Source;

    fn change() -> ModelEvent {
        ModelEvent::Change(ChangeDetail {
            origin: Origin::Set,
            location: None,
            validate: false,
            changed: vec!["firstname".to_string()],
        })
    }

    #[test]
    fn test_emit_routes_by_kind() {
        let observers: Observers<Source, ModelEvent> = Observers::new();
        let changes = Arc::new(AtomicUsize::new(0));
        let invalids = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&changes);
        observers.subscribe(EventKind::Change, move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let i = Arc::clone(&invalids);
        observers.subscribe(EventKind::Invalid, move |_, _| {
            i.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(observers.emit(&Source, &change()), 1);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(invalids.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registration_order() {
        let observers: Observers<Source, ModelEvent> = Observers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let seen = Arc::clone(&seen);
            observers.subscribe(EventKind::Change, move |_, _| {
                seen.lock().unwrap().push(n);
            });
        }

        observers.emit(&Source, &change());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_cancel_subscription() {
        let observers: Observers<Source, ModelEvent> = Observers::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let sub = observers.subscribe(EventKind::Change, move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sub.is_active());

        observers.emit(&Source, &change());
        assert!(sub.cancel());
        observers.emit(&Source, &change());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(observers.is_empty());
    }

    #[test]
    fn test_dropped_handle_keeps_handler() {
        let observers: Observers<Source, ModelEvent> = Observers::new();
        {
            let _sub = observers.subscribe(EventKind::Error, |_, _| {});
        }
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn test_cancel_after_registry_dropped() {
        let observers: Observers<Source, ModelEvent> = Observers::new();
        let sub = observers.subscribe(EventKind::Change, |_, _| {});
        drop(observers);

        assert!(!sub.is_active());
        assert!(!sub.cancel());
    }

    #[test]
    fn test_handler_can_subscribe_during_emit() {
        let observers: Arc<Observers<Source, ModelEvent>> = Arc::new(Observers::new());

        let inner = Arc::clone(&observers);
        observers.subscribe(EventKind::Change, move |_, _| {
            inner.subscribe(EventKind::Invalid, |_, _| {});
        });

        observers.emit(&Source, &change());
        assert_eq!(observers.len(), 2);
    }

    #[test]
    fn test_event_kind() {
        let invalid = ModelEvent::Invalid {
            origin: Origin::Save,
            reason: "firstname cannot be blank".to_string(),
        };
        assert_eq!(invalid.kind(), EventKind::Invalid);
        assert_eq!(change().kind().to_string(), "change");
        assert_eq!(Origin::Fetch.to_string(), "fetch");
    }
}
