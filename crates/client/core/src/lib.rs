//! Client-side action playback.
//!
//! Frontends feed replication notifications from the runtime into a
//! [`ClientActionPlayer`] per visible character and render through a
//! [`VisualSink`]. The player only mirrors what the server decides; it may
//! anticipate opt-in actions and reconciles them when the server confirms.
pub mod player;
pub mod sink;

pub use player::{ClientActionPlayer, PlayerChanges};
pub use sink::{NullSink, VisualSink};
