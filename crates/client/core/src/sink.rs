//! Presentation hooks for the client action player.

use game_core::ActionInstance;

/// Receives visual lifecycle callbacks from [`crate::ClientActionPlayer`].
///
/// Every method has an empty default so frontends only implement what they
/// render.
pub trait VisualSink {
    /// A visual instance started playing. `anticipated` is set when the
    /// server has not confirmed it yet.
    fn on_visual_start(&mut self, _instance: &ActionInstance, _anticipated: bool) {}

    /// The server confirmed an anticipated instance.
    fn on_visual_confirmed(&mut self, _instance: &ActionInstance) {}

    /// The instance stopped blocking the character's visual state.
    fn on_visual_unblocked(&mut self, _instance: &ActionInstance) {}

    fn on_visual_end(&mut self, _instance: &ActionInstance) {}

    /// Cancelled by the server, or an anticipation timed out.
    fn on_visual_cancel(&mut self, _instance: &ActionInstance) {}
}

/// Sink that ignores every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl VisualSink for NullSink {}
