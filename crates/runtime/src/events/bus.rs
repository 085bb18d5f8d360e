//! Topic-based event bus implementation.

use std::collections::HashMap;

use game_core::Notification;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::GameplayEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Server → client action notifications
    Replication,
    /// Simulation events (ticks, deaths, rejected input)
    Gameplay,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Replication(Notification),
    Gameplay(GameplayEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Replication(_) => Topic::Replication,
            Event::Gameplay(_) => Topic::Gameplay,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Topics are fixed at construction, so cloning
/// shares the same channels without locking.
#[derive(Clone)]
pub struct EventBus {
    replication: broadcast::Sender<Event>,
    gameplay: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            replication: broadcast::channel(capacity).0,
            gameplay: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Replication => &self.replication,
            Topic::Gameplay => &self.gameplay,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use game_core::EntityId;

    use super::*;

    #[tokio::test]
    async fn events_are_routed_by_topic() {
        let bus = EventBus::with_capacity(8);
        let mut replication = bus.subscribe(Topic::Replication);
        let mut gameplay = bus.subscribe(Topic::Gameplay);

        let notification = Notification::CancelAll { owner: EntityId(3) };
        bus.publish(Event::Replication(notification.clone()));

        assert_eq!(
            replication.recv().await.unwrap(),
            Event::Replication(notification)
        );
        assert!(gameplay.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(Event::Gameplay(GameplayEvent::CharacterDied {
            entity: EntityId(1),
            at: game_core::GameTime::ZERO,
        }));
    }
}
