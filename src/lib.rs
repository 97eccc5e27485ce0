//! # a3s-wire
//!
//! Typed in-process publish/subscribe wiring for A3S subsystems.
//!
//! ## Overview
//!
//! `a3s-wire` lets independently developed subsystems of one process
//! exchange typed events without importing each other. Producers register a
//! publish capability for a concrete event type, consumers subscribe named
//! handlers to the types they care about, and a one-shot build step wires
//! every subscription to its publisher by type identity and freezes the
//! bus. From then on publishing is a direct, lock-free fan-out on the
//! calling thread.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_wire::BusBuilder;
//! use std::fmt;
//!
//! struct ArrivalEvent {
//!     line: String,
//! }
//!
//! impl fmt::Display for ArrivalEvent {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "arrival on line {}", self.line)
//!     }
//! }
//!
//! # fn main() -> a3s_wire::Result<()> {
//! let builder = BusBuilder::new();
//!
//! // Producer side: declare the events this subsystem emits
//! let arrivals = builder.register::<ArrivalEvent>("traffic poller")?;
//!
//! // Consumer side: declare interest, in any order relative to register
//! let subscription = builder.subscribe("print arrivals", |ev: &ArrivalEvent| {
//!     println!("{ev}");
//!     Ok(())
//! });
//!
//! // Assembly: wire everything exactly once
//! let bus = builder.build()?;
//! println!("{bus}");
//!
//! // Dispatch: synchronous fan-out to active subscribers
//! arrivals.publish(ArrivalEvent { line: "S3".into() })?;
//!
//! subscription.unsubscribe();
//! arrivals.publish(ArrivalEvent { line: "S9".into() })?; // delivered to nobody
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle
//!
//! - **Assemble**: any number of `register` and `subscribe` calls, from any
//!   thread, in any order, against a shared [`BusBuilder`]
//! - **Build**: exactly one [`BusBuilder::build`] call succeeds; every
//!   pending subscription must resolve to a publisher of the same event
//!   type or the whole build fails
//! - **Dispatch**: [`Publisher::publish`] fans out synchronously, in
//!   subscription order, to every subscriber whose activity flag is set;
//!   [`Subscription::unsubscribe`] deactivates without locking
//!
//! ## Architecture
//!
//! - [`EventType`]: process-stable identity token derived from the static
//!   event type, used as the routing key
//! - [`BusBuilder`]: pre-build accumulator; all declarations serialize on
//!   one internal lock
//! - [`Publisher`]: pre-bound publish handle, lock-free after build
//! - [`Subscription`]: idempotent deactivation handle backed by an atomic
//!   activity flag
//! - [`EventBus`]: the frozen wiring plus the [`BusGraph`] diagnostic
//!   report

pub mod builder;
pub mod bus;
pub mod error;
pub mod event;
pub mod publisher;
pub mod subscriber;

// Re-export core types
pub use builder::BusBuilder;
pub use bus::{BusGraph, EventBus, PublisherNode, SubscriberNode};
pub use error::{BusError, Result};
pub use event::{Event, EventType};
pub use publisher::Publisher;
pub use subscriber::{HandlerResult, Subscription};
