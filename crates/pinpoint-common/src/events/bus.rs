use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error};

use super::{Event, Topic};
use crate::source::Source;
use crate::Result;

pub type Handler = Rc<dyn Fn(&Event) -> Result<()>>;

/// Returned by `subscribe`; revokes the subscription when passed to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

struct Subscription {
    token: SubscriptionToken,
    topic: Topic,
    identity: Option<Source>,
    handler: Handler,
}

/// Synchronous, single-threaded publish/subscribe.
///
/// `emit` runs every handler for the topic on the caller's stack, in
/// subscription order. A failing or panicking handler is logged and does not
/// stop delivery to the rest. Handlers may subscribe, unsubscribe and emit
/// while being dispatched.
pub struct EventBus {
    subscriptions: RefCell<Vec<Subscription>>,
    next_token: Cell<u64>,
    emitted: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: RefCell::new(Vec::new()),
            next_token: Cell::new(1),
            emitted: Cell::new(0),
        }
    }

    pub fn subscribe(
        &self,
        topic: Topic,
        handler: impl Fn(&Event) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        self.insert(topic, None, Rc::new(handler))
    }

    /// Subscribe with an identity. Events whose source equals `identity` are
    /// not delivered to this handler.
    pub fn subscribe_as(
        &self,
        topic: Topic,
        identity: Source,
        handler: impl Fn(&Event) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        self.insert(topic, Some(identity), Rc::new(handler))
    }

    fn insert(&self, topic: Topic, identity: Option<Source>, handler: Handler) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.subscriptions.borrow_mut().push(Subscription {
            token,
            topic,
            identity,
            handler,
        });
        debug!(%topic, token = token.0, "subscribed");
        token
    }

    /// Returns `false` if the token was unknown or already revoked.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subs = self.subscriptions.borrow_mut();
        let before = subs.len();
        subs.retain(|s| s.token != token);
        before != subs.len()
    }

    /// Deliver `event` to every subscriber of its topic.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: Event) -> usize {
        let topic = event.topic();
        self.emitted.set(self.emitted.get() + 1);

        let targets: Vec<(SubscriptionToken, Option<Source>, Handler)> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| (s.token, s.identity.clone(), Rc::clone(&s.handler)))
            .collect();

        let mut invoked = 0;
        for (token, identity, handler) in targets {
            if !self.is_subscribed(token) {
                continue;
            }
            if let (Some(me), Some(origin)) = (identity.as_ref(), event.source()) {
                if me == origin {
                    debug!(%topic, source = %origin, "suppressed circular update");
                    continue;
                }
            }
            invoked += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(%topic, token = token.0, "event handler failed: {e}"),
                Err(_) => error!(%topic, token = token.0, "event handler panicked"),
            }
        }
        invoked
    }

    pub fn is_subscribed(&self, token: SubscriptionToken) -> bool {
        self.subscriptions.borrow().iter().any(|s| s.token == token)
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .count()
    }

    /// Total number of `emit` calls since construction.
    pub fn emitted_count(&self) -> u64 {
        self.emitted.get()
    }

    pub fn clear(&self) {
        self.subscriptions.borrow_mut().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PinpointError;
    use crate::id::{InstanceId, TileId};

    fn deleted(source: Source) -> Event {
        Event::TileDeleted {
            tile_id: TileId::from("t1"),
            source,
        }
    }

    fn recorder(bus: &EventBus, topic: Topic) -> Rc<RefCell<Vec<Topic>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(topic, move |e| {
            sink.borrow_mut().push(e.topic());
            Ok(())
        });
        seen
    }

    #[test]
    fn publish_and_receive() {
        let bus = EventBus::new();
        let seen = recorder(&bus, Topic::TileDeleted);
        assert_eq!(bus.emit(deleted(Source::Editor)), 1);
        assert_eq!(*seen.borrow(), vec![Topic::TileDeleted]);
    }

    #[test]
    fn other_topics_are_not_delivered() {
        let bus = EventBus::new();
        let seen = recorder(&bus, Topic::TileCreated);
        assert_eq!(bus.emit(deleted(Source::Editor)), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..4 {
            let order = Rc::clone(&order);
            bus.subscribe(Topic::TileDeleted, move |_| {
                order.borrow_mut().push(n);
                Ok(())
            });
        }
        bus.emit(deleted(Source::Editor));
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn failing_handler_does_not_block_others() {
        let bus = EventBus::new();
        bus.subscribe(Topic::TileDeleted, |_| Err(PinpointError::Other("boom".into())));
        bus.subscribe(Topic::TileDeleted, |_| panic!("handler bug"));
        let seen = recorder(&bus, Topic::TileDeleted);

        assert_eq!(bus.emit(deleted(Source::Editor)), 3);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let token = bus.subscribe(Topic::TileDeleted, move |_| {
            c.set(c.get() + 1);
            Ok(())
        });
        bus.emit(deleted(Source::Editor));
        assert!(bus.unsubscribe(token));
        assert!(!bus.unsubscribe(token));
        bus.emit(deleted(Source::Editor));
        assert_eq!(count.get(), 1);
        assert_eq!(bus.subscriber_count(Topic::TileDeleted), 0);
    }

    #[test]
    fn handler_unsubscribed_mid_dispatch_is_skipped() {
        let bus = Rc::new(EventBus::new());
        let second_ran = Rc::new(Cell::new(false));
        let victim = Rc::new(Cell::new(None));

        let b = Rc::clone(&bus);
        let v = Rc::clone(&victim);
        bus.subscribe(Topic::TileDeleted, move |_| {
            if let Some(token) = v.get() {
                b.unsubscribe(token);
            }
            Ok(())
        });
        let ran = Rc::clone(&second_ran);
        let token = bus.subscribe(Topic::TileDeleted, move |_| {
            ran.set(true);
            Ok(())
        });
        victim.set(Some(token));

        assert_eq!(bus.emit(deleted(Source::Editor)), 1);
        assert!(!second_ran.get());
    }

    #[test]
    fn reentrant_emit_is_allowed() {
        let bus = Rc::new(EventBus::new());
        let b = Rc::clone(&bus);
        bus.subscribe(Topic::TileDeleted, move |_| {
            b.emit(Event::LayoutUnprojected {
                layout_id: "l1".into(),
            });
            Ok(())
        });
        let seen = recorder(&bus, Topic::LayoutUnprojected);
        bus.emit(deleted(Source::Editor));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(bus.emitted_count(), 2);
    }

    #[test]
    fn identity_subscriber_ignores_its_own_echo() {
        let bus = EventBus::new();
        let me = Source::Live(InstanceId::from("inst-1"));
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.subscribe_as(Topic::TileDeleted, me.clone(), move |_| {
            c.set(c.get() + 1);
            Ok(())
        });

        assert_eq!(bus.emit(deleted(me)), 0);
        assert_eq!(bus.emit(deleted(Source::Editor)), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn emit_with_no_subscribers_returns_zero() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(deleted(Source::System)), 0);
        assert_eq!(bus.emitted_count(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let bus = EventBus::new();
        recorder(&bus, Topic::TileDeleted);
        recorder(&bus, Topic::TileCreated);
        bus.clear();
        assert_eq!(bus.subscriber_count(Topic::TileDeleted), 0);
        assert_eq!(bus.subscriber_count(Topic::TileCreated), 0);
    }
}
