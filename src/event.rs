//! Event identity
//!
//! Routing on the bus is keyed by an event's static Rust type, never by its
//! contents. [`EventType`] is the identity token derived from that type: all
//! values of one concrete type share it, values of distinct types (including
//! `T` versus `&T`) never do, and it stays stable for the life of the
//! process.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for values that can travel across the bus
///
/// Blanket-implemented for every type that can render itself as text and is
/// safe to hand to subscribers on any thread. The `'static` bound is what
/// gives the type a stable identity token.
pub trait Event: fmt::Display + Send + Sync + 'static {}

impl<T: fmt::Display + Send + Sync + 'static> Event for T {}

/// Process-stable identity token for a concrete event type
///
/// Equality and hashing consider only the underlying [`TypeId`]; the fully
/// qualified type name rides along for diagnostics and error messages.
#[derive(Debug, Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Derive the identity token for `E`
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Fully qualified name of the event type
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
