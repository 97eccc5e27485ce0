//! Per-event-type fan-out and the pre-bound publish handle

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::bus::{PublisherNode, SubscriberNode};
use crate::error::{BusError, Result};
use crate::event::{Event, EventType};
use crate::subscriber::Subscriber;

/// Publish handle for one event type, returned by
/// [`BusBuilder::register`](crate::BusBuilder::register)
///
/// Pre-bound to its event type's fan-out, so the publish path performs no
/// lookup and takes no lock. Cheap to clone and safe to share across
/// threads. Every call fails with [`BusError::NotYetBuilt`] until the
/// owning builder has been built successfully.
pub struct Publisher<E: Event> {
    built: Arc<AtomicBool>,
    fanout: Arc<Fanout<E>>,
}

impl<E: Event> Clone for Publisher<E> {
    fn clone(&self) -> Self {
        Self {
            built: self.built.clone(),
            fanout: self.fanout.clone(),
        }
    }
}

impl<E: Event> Publisher<E> {
    pub(crate) fn new(built: Arc<AtomicBool>, fanout: Arc<Fanout<E>>) -> Self {
        Self { built, fanout }
    }

    /// Synchronously fan the event out to every active subscriber, in
    /// subscription order, on the calling thread
    ///
    /// Handler failures are logged and swallowed; they never abort the
    /// remaining fan-out and never surface here. Publishing a type nobody
    /// subscribed to is a silent success.
    ///
    /// # Errors
    ///
    /// [`BusError::NotYetBuilt`] until the owning builder's `build` has
    /// succeeded.
    pub fn publish(&self, event: E) -> Result<()> {
        if !self.built.load(Ordering::SeqCst) {
            return Err(BusError::NotYetBuilt);
        }
        self.fanout.dispatch(&event);
        Ok(())
    }

    /// Name this publisher was registered under
    pub fn name(&self) -> &str {
        self.fanout.name()
    }

    /// Identity token of the event type this handle publishes
    pub fn event_type(&self) -> EventType {
        self.fanout.event_type()
    }
}

/// Owns the ordered subscriber list for exactly one event type
///
/// The list is installed exactly once during build; afterwards dispatch is
/// a plain slice walk with one atomic flag load per subscriber.
pub(crate) struct Fanout<E> {
    name: String,
    event_type: EventType,
    wired: OnceLock<Box<[Arc<Subscriber<E>>]>>,
}

impl<E: Event> Fanout<E> {
    pub(crate) fn new(name: String, event_type: EventType) -> Self {
        Self {
            name,
            event_type,
            wired: OnceLock::new(),
        }
    }

    fn dispatch(&self, event: &E) {
        // A handle whose registration was later replaced is never wired; it
        // fans out to nothing.
        let Some(subs) = self.wired.get() else {
            return;
        };
        tracing::trace!(
            event = %self.event_type,
            subscribers = subs.len(),
            "Dispatching event"
        );
        for sub in subs.iter() {
            if !sub.is_active() {
                continue;
            }
            if let Err(error) = sub.invoke(event) {
                tracing::warn!(
                    subscriber = %sub.name(),
                    event = %self.event_type,
                    error = %error,
                    "Handler failed, continuing fan-out"
                );
            }
        }
    }
}

/// Type-erased face of a fan-out
///
/// Lets the builder's type map and the bus diagnostics hold fan-outs of
/// different event types behind one trait object while dispatch stays fully
/// typed.
pub(crate) trait ErasedFanout: Send + Sync {
    fn name(&self) -> &str;

    fn event_type(&self) -> EventType;

    /// Install the subscriber list, in declaration order
    ///
    /// Called at most once per fan-out, during build. Each entry is
    /// restored to the typed subscriber; a mismatch means the type registry
    /// keyed a subscriber under the wrong identity token.
    fn wire(&self, subs: Vec<Arc<dyn Any + Send + Sync>>) -> Result<()>;

    /// Diagnostic projection for [`EventBus::graph`](crate::EventBus::graph)
    fn node(&self) -> PublisherNode;
}

impl<E: Event> ErasedFanout for Fanout<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn wire(&self, subs: Vec<Arc<dyn Any + Send + Sync>>) -> Result<()> {
        let mut wired = Vec::with_capacity(subs.len());
        for sub in subs {
            let sub = sub.downcast::<Subscriber<E>>().map_err(|_| {
                BusError::SubscriberTypeMismatch {
                    event_type: self.event_type.name(),
                }
            })?;
            wired.push(sub);
        }
        // The finalized guard in the builder ensures wiring runs once, so a
        // lost set here cannot happen.
        let _ = self.wired.set(wired.into_boxed_slice());
        Ok(())
    }

    fn node(&self) -> PublisherNode {
        let subscribers = self
            .wired
            .get()
            .map(|subs| {
                subs.iter()
                    .map(|sub| SubscriberNode {
                        name: sub.name().to_string(),
                        origin: sub.origin().to_string(),
                        active: sub.is_active(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        PublisherNode {
            name: self.name.clone(),
            event_type: self.event_type.name().to_string(),
            subscribers,
        }
    }
}
