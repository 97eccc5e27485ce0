//! Two-phase assembly: accumulate declarations, then build exactly once

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fxhash::FxHashMap;
use parking_lot::Mutex;

use crate::bus::EventBus;
use crate::error::{BusError, Result};
use crate::event::{Event, EventType};
use crate::publisher::{ErasedFanout, Fanout, Publisher};
use crate::subscriber::{HandlerResult, PendingSub, Subscriber, Subscription};

/// Pre-build accumulator for publisher and subscriber declarations
///
/// Shared by reference with every subsystem that registers or subscribes
/// during application assembly. All declarations serialize on an internal
/// lock, so concurrent assembly from multiple threads is safe.
/// [`build`](Self::build) consumes the accumulated state exactly once and
/// freezes membership; afterwards the builder only hands out
/// [`BusError::AlreadyBuilt`].
pub struct BusBuilder {
    /// One-shot guard, flips on the first `build` call and never back.
    finalized: AtomicBool,
    /// Shared with every publish handle; set only after wiring succeeds.
    built: Arc<AtomicBool>,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    fanouts: FxHashMap<EventType, Arc<dyn ErasedFanout>>,
    pending: Vec<PendingSub>,
}

impl BusBuilder {
    pub fn new() -> Self {
        Self {
            finalized: AtomicBool::new(false),
            built: Arc::new(AtomicBool::new(false)),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Declare that some subsystem will publish events of type `E`
    ///
    /// Returns the publish handle for `E` immediately; it stays inert until
    /// the builder is built. Registering the same event type again replaces
    /// the earlier registration: the later handle receives all subscribers
    /// for `E`, the earlier one is left wired to nothing.
    ///
    /// # Errors
    ///
    /// [`BusError::AlreadyBuilt`] once `build` has been called.
    pub fn register<E: Event>(&self, name: impl Into<String>) -> Result<Publisher<E>> {
        let name = name.into();
        let event_type = EventType::of::<E>();
        let fanout = Arc::new(Fanout::<E>::new(name.clone(), event_type));

        let mut inner = self.inner.lock();
        if self.finalized.load(Ordering::SeqCst) {
            return Err(BusError::AlreadyBuilt);
        }
        let erased: Arc<dyn ErasedFanout> = fanout.clone();
        let replaced = inner.fanouts.insert(event_type, erased);
        drop(inner);

        match replaced {
            Some(previous) => tracing::warn!(
                publisher = %name,
                event = %event_type,
                previous = %previous.name(),
                "Publisher re-registered, earlier registration replaced"
            ),
            None => {
                tracing::debug!(publisher = %name, event = %event_type, "Publisher registered");
            }
        }

        Ok(Publisher::new(self.built.clone(), fanout))
    }

    /// Declare a handler for events of type `E`
    ///
    /// The handler runs on whichever thread publishes, so it must be
    /// `Send + Sync`; keep it fast and non-blocking. Subscribing does not
    /// require the publisher to exist yet, only by the time `build` runs.
    /// The returned [`Subscription`] deactivates this subscriber; dropping
    /// it changes nothing.
    ///
    /// Called after `build`, the declaration is logged and ignored and the
    /// returned handle controls nothing.
    #[track_caller]
    pub fn subscribe<E: Event>(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&E) -> HandlerResult + Send + Sync + 'static,
    ) -> Subscription {
        let caller = std::panic::Location::caller();
        let origin = format!("{}:{}", caller.file(), caller.line());
        let name = name.into();
        let event_type = EventType::of::<E>();

        let sub = Arc::new(Subscriber::new(name.clone(), origin, handler));
        let handle = Subscription::new(name.clone(), sub.activity_flag());

        let mut inner = self.inner.lock();
        if self.finalized.load(Ordering::SeqCst) {
            drop(inner);
            tracing::warn!(
                subscriber = %name,
                event = %event_type,
                "Subscription declared after build, ignored"
            );
            return handle;
        }
        inner.pending.push(PendingSub {
            event_type,
            name: name.clone(),
            sub: sub.clone(),
        });
        drop(inner);

        tracing::debug!(
            subscriber = %name,
            event = %event_type,
            origin = %sub.origin(),
            "Subscriber declared"
        );
        handle
    }

    /// Wire every pending subscription to its publisher and freeze the bus
    ///
    /// On success all publish handles come live atomically. On failure
    /// nothing is wired, the handles stay inert forever, and the builder
    /// cannot be retried.
    ///
    /// # Errors
    ///
    /// - [`BusError::AlreadyBuilt`] on every call after the first,
    ///   regardless of the first call's outcome.
    /// - [`BusError::UnresolvedSubscription`] if any pending subscription
    ///   names an event type without a registered publisher.
    pub fn build(&self) -> Result<EventBus> {
        // Exactly-once transition, taken before the lock: losers of the
        // race must never re-wire or observe partial state.
        if self
            .finalized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BusError::AlreadyBuilt);
        }

        let Inner { fanouts, pending } = std::mem::take(&mut *self.inner.lock());
        let subscriber_count = pending.len();

        // Resolve everything before wiring anything, so a failed build
        // leaves no partially wired publisher behind.
        let mut wires: FxHashMap<EventType, Vec<Arc<dyn Any + Send + Sync>>> =
            FxHashMap::default();
        for pend in pending {
            if !fanouts.contains_key(&pend.event_type) {
                return Err(BusError::UnresolvedSubscription {
                    subscriber: pend.name,
                    event_type: pend.event_type.name(),
                });
            }
            wires.entry(pend.event_type).or_default().push(pend.sub);
        }

        for (event_type, fanout) in &fanouts {
            let subs = wires.remove(event_type).unwrap_or_default();
            fanout.wire(subs)?;
        }

        // Publish handles may only pass their gate once every list is in
        // place.
        self.built.store(true, Ordering::SeqCst);
        tracing::info!(
            publishers = fanouts.len(),
            subscribers = subscriber_count,
            "Event bus built"
        );
        Ok(EventBus::new(fanouts))
    }
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    struct Ping;

    impl fmt::Display for Ping {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("ping")
        }
    }

    #[test]
    fn test_register_after_build_fails() {
        let builder = BusBuilder::new();
        builder.build().unwrap();
        assert!(matches!(
            builder.register::<Ping>("late"),
            Err(BusError::AlreadyBuilt)
        ));
    }

    #[test]
    fn test_subscribe_after_build_returns_inert_handle() {
        let builder = BusBuilder::new();
        builder.register::<Ping>("source").unwrap();
        let bus = builder.build().unwrap();

        let handle = builder.subscribe("late listener", |_: &Ping| Ok(()));
        handle.unsubscribe();

        let graph = bus.graph();
        assert_eq!(graph.publishers.len(), 1);
        assert!(graph.publishers[0].subscribers.is_empty());
    }

    #[test]
    fn test_build_of_empty_builder_yields_empty_bus() {
        let builder = BusBuilder::new();
        let bus = builder.build().unwrap();
        assert!(bus.is_empty());
    }

    #[test]
    fn test_subscription_origin_points_here() {
        let builder = BusBuilder::new();
        builder.register::<Ping>("source").unwrap();
        builder.subscribe("origin probe", |_: &Ping| Ok(()));
        let bus = builder.build().unwrap();

        let origin = &bus.graph().publishers[0].subscribers[0].origin;
        assert!(origin.contains("builder.rs"), "unexpected origin {origin}");
    }
}
