//! The finalized bus and its diagnostic wiring report

use std::fmt;
use std::sync::Arc;

use fxhash::FxHashMap;
use serde::Serialize;

use crate::event::{Event, EventType};
use crate::publisher::ErasedFanout;

/// The finalized, routing-frozen bus
///
/// Produced by [`BusBuilder::build`](crate::BusBuilder::build). Membership
/// can no longer change; the only remaining mutable state is each
/// subscriber's activity flag, toggled through
/// [`Subscription::unsubscribe`](crate::Subscription::unsubscribe).
/// Dispatch flows through the pre-bound [`Publisher`](crate::Publisher)
/// handles and never touches this value, which exists for inspection.
pub struct EventBus {
    fanouts: FxHashMap<EventType, Arc<dyn ErasedFanout>>,
}

impl EventBus {
    pub(crate) fn new(fanouts: FxHashMap<EventType, Arc<dyn ErasedFanout>>) -> Self {
        Self { fanouts }
    }

    /// Number of registered publishers
    pub fn len(&self) -> usize {
        self.fanouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fanouts.is_empty()
    }

    /// Whether a publisher is registered for `E`
    pub fn contains<E: Event>(&self) -> bool {
        self.fanouts.contains_key(&EventType::of::<E>())
    }

    /// Snapshot of the wiring: every publisher with its subscribers
    ///
    /// Purely observational. Publishers are sorted by name so the report is
    /// stable across runs; subscribers appear in subscription order and are
    /// listed regardless of their activity flag, which is reported, not
    /// filtered on.
    pub fn graph(&self) -> BusGraph {
        let mut publishers: Vec<PublisherNode> =
            self.fanouts.values().map(|fanout| fanout.node()).collect();
        publishers.sort_by(|a, b| a.name.cmp(&b.name));
        BusGraph { publishers }
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.graph(), f)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("publishers", &self.fanouts.len())
            .finish()
    }
}

/// Serializable wiring report
///
/// `Display` renders the human-readable listing; serde provides the
/// camelCase JSON form for admin and debug surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusGraph {
    pub publishers: Vec<PublisherNode>,
}

/// One publisher and its wired subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherNode {
    /// Name the publisher was registered under
    pub name: String,
    /// Fully qualified event type name
    pub event_type: String,
    /// Subscribers in subscription order, regardless of activity
    pub subscribers: Vec<SubscriberNode>,
}

/// One subscriber as seen from its publisher
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberNode {
    pub name: String,
    /// `file:line` of the subscribe call site
    pub origin: String,
    pub active: bool,
}

impl fmt::Display for BusGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Event bus publishers and subscribers:")?;
        for publisher in &self.publishers {
            writeln!(f, "  {} [{}]:", publisher.name, publisher.event_type)?;
            for subscriber in &publisher.subscribers {
                writeln!(f, "    {} [{}]", subscriber.name, subscriber.origin)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BusBuilder;
    use std::fmt;

    struct Arrival {
        line: String,
    }

    impl fmt::Display for Arrival {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "arrival on line {}", self.line)
        }
    }

    fn wired_bus() -> EventBus {
        let builder = BusBuilder::new();
        builder.register::<Arrival>("arrival feed").unwrap();
        builder.subscribe("display board", |_: &Arrival| Ok(()));
        builder.subscribe("announcer", |_: &Arrival| Ok(()));
        builder.build().unwrap()
    }

    #[test]
    fn test_graph_lists_subscribers_in_subscription_order() {
        let bus = wired_bus();
        let graph = bus.graph();

        assert_eq!(graph.publishers.len(), 1);
        let publisher = &graph.publishers[0];
        assert_eq!(publisher.name, "arrival feed");
        assert!(publisher.event_type.ends_with("Arrival"));
        let names: Vec<&str> = publisher
            .subscribers
            .iter()
            .map(|sub| sub.name.as_str())
            .collect();
        assert_eq!(names, ["display board", "announcer"]);
    }

    #[test]
    fn test_graph_serializes_to_camel_case_json() {
        let bus = wired_bus();
        let json = serde_json::to_value(bus.graph()).unwrap();

        let publisher = &json["publishers"][0];
        assert_eq!(publisher["name"], "arrival feed");
        assert!(publisher["eventType"].as_str().unwrap().ends_with("Arrival"));
        assert_eq!(publisher["subscribers"][0]["name"], "display board");
        assert_eq!(publisher["subscribers"][0]["active"], true);
        assert!(publisher["subscribers"][0]["origin"]
            .as_str()
            .unwrap()
            .contains("bus.rs"));
    }

    #[test]
    fn test_display_renders_publisher_and_subscriber_lines() {
        let bus = wired_bus();
        let rendered = bus.to_string();

        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("Event bus publishers and subscribers:")
        );
        let publisher_line = lines.next().unwrap();
        assert!(publisher_line.starts_with("  arrival feed ["));
        let subscriber_line = lines.next().unwrap();
        assert!(subscriber_line.starts_with("    display board ["));
    }

    #[test]
    fn test_contains_is_keyed_by_type() {
        let bus = wired_bus();
        assert!(bus.contains::<Arrival>());
        assert!(!bus.contains::<String>());
        assert_eq!(bus.len(), 1);
        assert!(!bus.is_empty());
    }
}
