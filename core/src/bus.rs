//! Named pub/sub between real-time transports and reminder engines.
//!
//! Transports (the SSE bridge, a websocket client, tests) `publish` named
//! events; engines `subscribe` to the names their domain listens to. A
//! subscription lives exactly as long as the returned [`Subscription`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::Weak;

use serde_json::Value;

/// Published when the client regains foreground focus.
pub const FOREGROUND_EVENT: &str = "app:foreground";

#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    pub name: String,
    pub payload: Value,
}

impl BusEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn foreground() -> Self {
        Self::new(FOREGROUND_EVENT, Value::Null)
    }
}

pub type EventHandler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

pub trait EventBus: Send + Sync {
    fn subscribe(&self, name: &str, handler: EventHandler) -> Subscription;

    fn publish(&self, event: BusEvent);
}

/// Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<String, Vec<(u64, EventHandler)>>,
}

/// In-process bus. Handlers run synchronously on the publishing thread, so
/// they should only forward into a channel.
#[derive(Clone, Default)]
pub struct LocalEventBus {
    registry: Arc<Mutex<Registry>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .get(name)
            .map_or(0, Vec::len)
    }

    fn remove(registry: &Weak<Mutex<Registry>>, name: &str, id: u64) {
        let Some(registry) = registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = registry.handlers.get_mut(name) {
            list.retain(|(handler_id, _)| *handler_id != id);
            if list.is_empty() {
                registry.handlers.remove(name);
            }
        }
    }
}

impl EventBus for LocalEventBus {
    fn subscribe(&self, name: &str, handler: EventHandler) -> Subscription {
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.next_id += 1;
            let id = registry.next_id;
            registry
                .handlers
                .entry(name.to_string())
                .or_default()
                .push((id, handler));
            id
        };

        let registry = Arc::downgrade(&self.registry);
        let name = name.to_string();
        Subscription::new(move || Self::remove(&registry, &name, id))
    }

    fn publish(&self, event: BusEvent) {
        // Handlers are cloned out so one may subscribe/unsubscribe re-entrantly.
        let handlers: Vec<EventHandler> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .get(&event.name)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        if handlers.is_empty() {
            tracing::trace!(event = %event.name, "no subscribers");
        }
        for handler in handlers {
            handler(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<BusEvent>>>, EventHandler) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: EventHandler = Arc::new(move |event: &BusEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        (seen, handler)
    }

    #[test]
    fn delivers_only_matching_names() {
        let bus = LocalEventBus::new();
        let (seen, handler) = recorder();
        let _sub = bus.subscribe("hrd:reminder", handler);

        bus.publish(BusEvent::new("hrd:reminder", json!({ "id": 1 })));
        bus.publish(BusEvent::new("rnr:reminder", json!({ "id": 2 })));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].payload, json!({ "id": 1 }));
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = LocalEventBus::new();
        let (seen, handler) = recorder();
        let sub = bus.subscribe("dataflow:reminder", handler);
        assert_eq!(bus.subscriber_count("dataflow:reminder"), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count("dataflow:reminder"), 0);

        bus.publish(BusEvent::new("dataflow:reminder", json!({})));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let (_seen, handler) = recorder();
        let sub = {
            let bus = LocalEventBus::new();
            bus.subscribe("x", handler)
        };
        sub.unsubscribe();
    }
}
