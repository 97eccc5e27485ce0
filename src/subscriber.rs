//! Subscribers and their deactivation handles

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::event::EventType;

/// Outcome a handler reports back to the dispatcher
///
/// Failures are logged by the dispatcher and then discarded: they never
/// abort the remaining fan-out, reach the publisher, or trigger a retry.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A named handler bound to one concrete event type
///
/// Carries the typed closure captured at subscribe time, so dispatch never
/// performs a runtime downcast. The activity flag is shared with the
/// [`Subscription`] handle returned to the caller.
pub(crate) struct Subscriber<E> {
    name: String,
    origin: String,
    active: Arc<AtomicBool>,
    handler: Box<dyn Fn(&E) -> HandlerResult + Send + Sync>,
}

impl<E> Subscriber<E> {
    pub(crate) fn new(
        name: String,
        origin: String,
        handler: impl Fn(&E) -> HandlerResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            origin,
            active: Arc::new(AtomicBool::new(true)),
            handler: Box::new(handler),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// `file:line` of the subscribe call site
    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }

    /// One atomic load per dispatch; a concurrent deactivation may or may
    /// not be observed by an in-flight fan-out.
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn invoke(&self, event: &E) -> HandlerResult {
        (self.handler)(event)
    }

    pub(crate) fn activity_flag(&self) -> Arc<AtomicBool> {
        self.active.clone()
    }
}

/// Deactivation handle returned by
/// [`BusBuilder::subscribe`](crate::BusBuilder::subscribe)
///
/// [`unsubscribe`](Self::unsubscribe) flips the subscriber's activity flag
/// off; it is idempotent and never fails. Deactivation is eventually, not
/// instantaneously, observed by publishers running on other threads. Called
/// before the bus is built it has no effect on wiring: the subscription is
/// still resolved and validated, it merely starts out deactivated. Dropping
/// the handle does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    name: String,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(name: String, active: Arc<AtomicBool>) -> Self {
        Self { name, active }
    }

    /// Stop further deliveries to this subscriber
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
        tracing::debug!(subscriber = %self.name, "Subscriber deactivated");
    }

    /// Whether this subscriber still receives events
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// A subscription declared before the bus exists
///
/// The typed subscriber hides behind `dyn Any` until `build` resolves it to
/// its publisher; name and event type are duplicated alongside so build-time
/// errors can say who failed without downcasting.
pub(crate) struct PendingSub {
    pub(crate) event_type: EventType,
    pub(crate) name: String,
    pub(crate) sub: Arc<dyn Any + Send + Sync>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let flag = Arc::new(AtomicBool::new(true));
        let handle = Subscription::new("listener".to_string(), flag.clone());

        assert!(handle.is_active());
        handle.unsubscribe();
        handle.unsubscribe();
        assert!(!handle.is_active());
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cloned_handles_share_the_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let handle = Subscription::new("listener".to_string(), flag);
        let other = handle.clone();

        other.unsubscribe();
        assert!(!handle.is_active());
    }
}
