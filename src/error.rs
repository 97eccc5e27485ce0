//! Error types for a3s-wire

use thiserror::Error;

/// Errors that can occur while assembling or using the event bus
#[derive(Debug, Error)]
pub enum BusError {
    /// A publish handle was invoked before its builder was built
    #[error("cannot publish yet, event bus still under construction")]
    NotYetBuilt,

    /// The builder was already finalized, successfully or not
    #[error("event bus has already been built")]
    AlreadyBuilt,

    /// A pending subscription names an event type no publisher registered
    #[error("cannot build event bus: no publisher registered for '{event_type}' (subscriber '{subscriber}')")]
    UnresolvedSubscription {
        subscriber: String,
        event_type: &'static str,
    },

    /// A subscriber could not be restored to its concrete event type during
    /// wiring
    ///
    /// Publishers and subscribers are keyed by the same identity token, so
    /// this indicates an invariant violation in the type registry.
    #[error("subscriber/publisher type mismatch for '{event_type}'")]
    SubscriberTypeMismatch { event_type: &'static str },
}

/// Result type alias for bus operations
pub type Result<T> = std::result::Result<T, BusError>;
