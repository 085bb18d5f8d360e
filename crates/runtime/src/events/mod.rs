//! Topic-based event bus for runtime events.
//!
//! This module provides a flexible event system where events are published to
//! specific topics, and consumers can subscribe only to the topics they need.
//! Replication notifications travel on [`Topic::Replication`]; everything a
//! host or tool might want to observe about the simulation travels on
//! [`Topic::Gameplay`].

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::GameplayEvent;
