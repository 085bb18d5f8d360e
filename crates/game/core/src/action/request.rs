//! Per-invocation action parameters.

use bitflags::bitflags;

use crate::state::{EntityId, Vec3, World};

use super::error::ActionError;
use super::types::{ActionId, SlotId};

bitflags! {
    /// Scheduling flags carried by a request.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RequestFlags: u8 {
        /// Append behind the running action instead of trying to interrupt it.
        const SHOULD_QUEUE = 1 << 0;
        /// Synthesize a chase toward the first target before running.
        const SHOULD_CLOSE = 1 << 1;
        /// Root the owner while the action runs.
        const PREVENT_MOVEMENT = 1 << 2;
    }
}

/// Where an action originates from.
///
/// Exactly one form is populated by construction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionOrigin {
    /// Explicit world position and aim direction.
    Point { position: Vec3, direction: Vec3 },
    /// An object's attachment slot; direction follows the object's facing.
    Source { source: EntityId, slot_index: u8 },
}

impl Default for ActionOrigin {
    fn default() -> Self {
        Self::Point {
            position: Vec3::ZERO,
            direction: Vec3::FORWARD,
        }
    }
}

/// Origin resolved against the world for one lifecycle call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedOrigin {
    pub position: Vec3,
    pub direction: Vec3,
}

impl ActionOrigin {
    /// Resolves the origin to a concrete position and unit direction.
    ///
    /// # Errors
    ///
    /// - `ActionError::SourceNotFound` if the source object is gone
    /// - `ActionError::InvalidSlot` if the slot index has no attachment
    pub fn resolve(&self, world: &World) -> Result<ResolvedOrigin, ActionError> {
        match *self {
            Self::Point {
                position,
                direction,
            } => Ok(ResolvedOrigin {
                position,
                direction: direction.normalized(),
            }),
            Self::Source { source, slot_index } => {
                let object = world.get(source).ok_or(ActionError::SourceNotFound(source))?;
                let position = object
                    .attachment_point(slot_index)
                    .ok_or(ActionError::InvalidSlot {
                        object: source,
                        slot_index,
                    })?;
                Ok(ResolvedOrigin {
                    position,
                    direction: object.facing.normalized(),
                })
            }
        }
    }
}

/// A request to run an action, from input, AI, or the scheduler itself.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRequest {
    pub action: ActionId,
    pub origin: ActionOrigin,
    pub targets: Vec<EntityId>,
    pub slot: SlotId,
    pub flags: RequestFlags,
    /// Stop distance for synthesized chase requests.
    pub close_distance: Option<f32>,
}

impl ActionRequest {
    pub fn new(action: ActionId) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Vec3, direction: Vec3) -> Self {
        self.origin = ActionOrigin::Point {
            position,
            direction,
        };
        self
    }

    pub fn from_source(mut self, source: EntityId, slot_index: u8) -> Self {
        self.origin = ActionOrigin::Source { source, slot_index };
        self
    }

    pub fn with_target(mut self, target: EntityId) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = EntityId>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn in_slot(mut self, slot: SlotId) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_flags(mut self, flags: RequestFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn queued(self) -> Self {
        self.with_flags(RequestFlags::SHOULD_QUEUE)
    }

    pub fn should_queue(&self) -> bool {
        self.flags.contains(RequestFlags::SHOULD_QUEUE)
    }

    pub fn should_close(&self) -> bool {
        self.flags.contains(RequestFlags::SHOULD_CLOSE)
    }

    pub fn prevents_movement(&self) -> bool {
        self.flags.contains(RequestFlags::PREVENT_MOVEMENT)
    }

    /// First explicit target, if any.
    pub fn primary_target(&self) -> Option<EntityId> {
        self.targets.first().copied()
    }
}
