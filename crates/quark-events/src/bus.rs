use std::{
    any::{Any, TypeId},
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    rc::Rc,
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{trace, warn};

type Callback = Rc<RefCell<dyn FnMut(&dyn Any)>>;
type Posted = Box<dyn FnOnce(&EventBus) + Send>;

struct Handler {
    id: u64,
    alive: Rc<Cell<bool>>,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<TypeId, Vec<Handler>>,
}

/// Token returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    type_id: TypeId,
}

/// Tagged-subscriber event bus.
///
/// Handlers are keyed by event type and invoked in subscription order. The bus is cheap to
/// clone; clones share the same registry. Subscribing or unsubscribing from inside a handler is
/// allowed: new handlers see the next event, removed handlers are skipped immediately.
///
/// The bus owns its handler lists; [`EventBus::clear`] drops every handler and is what runtime
/// shutdown calls.
#[derive(Clone)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
    posted: Arc<Mutex<Vec<Posted>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self
            .registry
            .try_borrow()
            .map(|r| r.handlers.values().map(Vec::len).sum::<usize>())
            .ok();
        f.debug_struct("EventBus")
            .field("handlers", &handlers)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::default())),
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register `handler` for events of type `E`.
    pub fn subscribe<E, F>(&self, mut handler: F) -> Subscription
    where
        E: 'static,
        F: FnMut(&E) + 'static,
    {
        let callback: Callback = Rc::new(RefCell::new(move |event: &dyn Any| {
            if let Some(e) = event.downcast_ref::<E>() {
                handler(e);
            }
        }));
        let type_id = TypeId::of::<E>();

        let mut reg = self.registry.borrow_mut();
        reg.next_id += 1;
        let id = reg.next_id;
        reg.handlers.entry(type_id).or_default().push(Handler {
            id,
            alive: Rc::new(Cell::new(true)),
            callback,
        });
        trace!(id, "EventBus: subscribed");

        Subscription { id, type_id }
    }

    /// Remove a handler. Returns `false` if the token was already spent.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut reg = self.registry.borrow_mut();
        let Some(list) = reg.handlers.get_mut(&subscription.type_id) else {
            return false;
        };
        let Some(pos) = list.iter().position(|h| h.id == subscription.id) else {
            return false;
        };
        let handler = list.remove(pos);
        handler.alive.set(false);
        if list.is_empty() {
            reg.handlers.remove(&subscription.type_id);
        }
        true
    }

    /// Deliver `event` to every handler of `E`, in subscription order.
    pub fn send<E: 'static>(&self, event: &E) {
        let snapshot: Vec<(Rc<Cell<bool>>, Callback)> = {
            let reg = self.registry.borrow();
            match reg.handlers.get(&TypeId::of::<E>()) {
                Some(list) => list
                    .iter()
                    .map(|h| (Rc::clone(&h.alive), Rc::clone(&h.callback)))
                    .collect(),
                None => return,
            }
        };

        for (alive, callback) in snapshot {
            if !alive.get() {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut cb) => cb(event),
                Err(_) => warn!("EventBus: handler re-entered by its own event; skipped"),
            }
        }
    }

    /// Handle for posting events from other threads.
    #[must_use]
    pub fn poster(&self) -> EventPoster {
        EventPoster {
            posted: Arc::clone(&self.posted),
        }
    }

    /// Deliver everything posted since the last call. Returns the number of events delivered.
    pub fn dispatch_posted(&self) -> usize {
        let batch = std::mem::take(&mut *self.posted.lock());
        let count = batch.len();
        for deliver in batch {
            deliver(self);
        }
        count
    }

    pub fn subscriber_count<E: 'static>(&self) -> usize {
        self.registry
            .borrow()
            .handlers
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Drop every handler and every pending posted event.
    pub fn clear(&self) {
        let mut reg = self.registry.borrow_mut();
        for handler in reg.handlers.values().flatten() {
            handler.alive.set(false);
        }
        reg.handlers.clear();
        self.posted.lock().clear();
    }
}

/// `Send` half of the bus: queues events for delivery on the tick thread.
#[derive(Clone)]
pub struct EventPoster {
    posted: Arc<Mutex<Vec<Posted>>>,
}

impl fmt::Debug for EventPoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPoster")
            .field("pending", &self.posted.lock().len())
            .finish()
    }
}

impl EventPoster {
    pub fn post<E: Send + 'static>(&self, event: E) {
        self.posted
            .lock()
            .push(Box::new(move |bus: &EventBus| bus.send(&event)));
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{AssetEvent, ErrorKind, FrameworkError};

    fn recorder<E: Clone + 'static>(bus: &EventBus) -> (Subscription, Rc<RefCell<Vec<E>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = bus.subscribe(move |e: &E| sink.borrow_mut().push(e.clone()));
        (sub, seen)
    }

    #[test]
    fn send_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.send(&FrameworkError::new(ErrorKind::Network, "offline"));
    }

    #[test]
    fn handlers_only_see_their_event_type() {
        let bus = EventBus::new();
        let (_, errors) = recorder::<FrameworkError>(&bus);
        let (_, assets) = recorder::<AssetEvent>(&bus);

        bus.send(&AssetEvent::BundleLoaded {
            bundle: "ui/main.ab".into(),
        });

        assert!(errors.borrow().is_empty());
        assert_eq!(assets.borrow().len(), 1);
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = Rc::clone(&order);
            bus.subscribe(move |_: &u32| order.borrow_mut().push(i));
        }
        bus.send(&7u32);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let (sub, seen) = recorder::<u32>(&bus);
        bus.send(&1u32);
        assert!(bus.unsubscribe(sub));
        assert!(!bus.unsubscribe(sub));
        bus.send(&2u32);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(bus.subscriber_count::<u32>(), 0);
    }

    #[test]
    fn unsubscribe_during_dispatch_skips_later_handler() {
        let bus = EventBus::new();
        let later: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let bus2 = bus.clone();
        let later2 = Rc::clone(&later);
        bus.subscribe(move |_: &u8| {
            if let Some(sub) = later2.borrow_mut().take() {
                bus2.unsubscribe(sub);
            }
        });
        let (sub, seen) = recorder::<u8>(&bus);
        *later.borrow_mut() = Some(sub);

        bus.send(&1u8);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn posted_events_are_delivered_on_dispatch() {
        let bus = EventBus::new();
        let (_, seen) = recorder::<FrameworkError>(&bus);
        let poster = bus.poster();

        std::thread::spawn(move || {
            poster.post(FrameworkError::new(ErrorKind::Network, "timeout"));
        })
        .join()
        .unwrap();

        assert!(seen.borrow().is_empty());
        assert_eq!(bus.dispatch_posted(), 1);
        assert_eq!(seen.borrow()[0].kind, ErrorKind::Network);
    }

    #[test]
    fn clear_drops_handlers_and_pending() {
        let bus = EventBus::new();
        let (_, seen) = recorder::<u32>(&bus);
        bus.poster().post(5u32);
        bus.clear();
        assert_eq!(bus.dispatch_posted(), 0);
        bus.send(&6u32);
        assert!(seen.borrow().is_empty());
    }
}
