//! Replication notifications and gameplay activity notices.
//!
//! Schedulers and effects never call out of the engine directly. They push
//! into an [`Outbox`] that the host drains once per tick: notifications go to
//! the replication channel, activities are delivered back to the recipients'
//! schedulers.

use crate::action::{ActionId, ActionRequest, GameplayActivity, SlotId};
use crate::state::{EntityId, GameTime};

/// Server → client replication message.
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notification {
    /// An action passed its start checks.
    ActionStarted {
        owner: EntityId,
        request: ActionRequest,
        started_at: GameTime,
    },

    /// Every running action of the owner was cancelled.
    CancelAll { owner: EntityId },

    /// Running actions with this id (and slot) were cancelled.
    CancelActions {
        owner: EntityId,
        action: ActionId,
        slot: SlotId,
    },

    /// An action ended normally.
    ActionEnded {
        owner: EntityId,
        action: ActionId,
        slot: SlotId,
    },
}

impl Notification {
    pub fn owner(&self) -> EntityId {
        match self {
            Self::ActionStarted { owner, .. }
            | Self::CancelAll { owner }
            | Self::CancelActions { owner, .. }
            | Self::ActionEnded { owner, .. } => *owner,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// A gameplay activity addressed to one character's scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivityNotice {
    pub recipient: EntityId,
    pub activity: GameplayActivity,
}

/// Per-tick buffer of outgoing notifications and pending activities.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outbox {
    pub notifications: Vec<Notification>,
    pub activities: Vec<ActivityNotice>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn activity(&mut self, recipient: EntityId, activity: GameplayActivity) {
        self.activities.push(ActivityNotice {
            recipient,
            activity,
        });
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn take_activities(&mut self) -> Vec<ActivityNotice> {
        std::mem::take(&mut self.activities)
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.activities.is_empty()
    }
}
