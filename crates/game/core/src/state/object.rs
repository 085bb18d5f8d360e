//! Game objects stored in the world arena.

use std::sync::Arc;

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::action::{ActionEffect, ActionId};
use crate::config::EngineConfig;

use super::{EntityId, GameTime, ResourceMeter, Team, Vec3};

/// Broad category of a world object; drives its collision layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    Character,
    Projectile,
    Prop,
}

bitflags! {
    /// Transient status conditions applied by actions and effects.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StatusFlags: u8 {
        /// Movement is locked (set by `PREVENT_MOVEMENT` requests).
        const ROOTED = 1 << 0;
        /// Hidden from enemies until broken by activity.
        const STEALTHED = 1 << 1;
        /// Cannot act until `stunned_until`.
        const STUNNED = 1 << 2;

        /// Flags owned by running actions rather than by effects.
        const ACTION_HELD = Self::ROOTED.bits() | Self::STEALTHED.bits();
    }
}

/// Derived multipliers refreshed every tick from the owner's running actions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifiers {
    pub damage_received: f32,
    pub healing_received: f32,
    pub move_speed: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            damage_received: 1.0,
            healing_received: 1.0,
            move_speed: 1.0,
        }
    }
}

/// Flight state of a projectile spawned by an effect.
///
/// The projectile owns its lifetime: it advances every tick and re-enters the
/// effect pipeline once per hit with `on_hit`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectileBody {
    pub owner: EntityId,
    pub source_action: ActionId,
    pub velocity: Vec3,
    pub remaining_range: f32,
    pub pierce_left: u8,
    pub power: f32,
    pub already_hit: Vec<EntityId>,
    pub on_hit: Arc<[ActionEffect]>,
}

/// A live object in the world arena.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameObject {
    pub id: EntityId,
    pub kind: ObjectKind,
    pub team: Team,
    pub position: Vec3,
    pub facing: Vec3,
    pub radius: f32,
    pub health: Option<ResourceMeter>,
    /// Attachment-slot offsets relative to `position` (e.g., hands, muzzle).
    pub attachments: ArrayVec<Vec3, { EngineConfig::MAX_ATTACHMENT_SLOTS }>,
    pub status: StatusFlags,
    pub stunned_until: GameTime,
    pub modifiers: Modifiers,
    /// Base movement speed in units per second.
    pub move_speed: f32,
    pub projectile: Option<ProjectileBody>,
}

impl GameObject {
    /// Creates a character with full health.
    pub fn character(team: Team, position: Vec3, max_health: u32) -> Self {
        Self {
            id: EntityId::NONE,
            kind: ObjectKind::Character,
            team,
            position,
            facing: Vec3::FORWARD,
            radius: 0.5,
            health: Some(ResourceMeter::full(max_health)),
            attachments: ArrayVec::new(),
            status: StatusFlags::empty(),
            stunned_until: GameTime::ZERO,
            modifiers: Modifiers::default(),
            move_speed: 5.0,
            projectile: None,
        }
    }

    /// Creates a static prop (optionally breakable).
    pub fn prop(position: Vec3, radius: f32, health: Option<u32>) -> Self {
        Self {
            kind: ObjectKind::Prop,
            radius,
            health: health.map(ResourceMeter::full),
            move_speed: 0.0,
            ..Self::character(Team::Neutral, position, 0)
        }
    }

    /// Creates a projectile object carrying its flight state.
    pub fn projectile(team: Team, position: Vec3, radius: f32, body: ProjectileBody) -> Self {
        Self {
            kind: ObjectKind::Projectile,
            team,
            radius,
            health: None,
            facing: body.velocity.normalized(),
            move_speed: body.velocity.length(),
            projectile: Some(body),
            ..Self::character(team, position, 0)
        }
    }

    pub fn with_facing(mut self, facing: Vec3) -> Self {
        self.facing = facing.normalized();
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Adds an attachment slot; extra slots beyond capacity are ignored.
    pub fn with_attachment(mut self, offset: Vec3) -> Self {
        let _ = self.attachments.try_push(offset);
        self
    }

    /// Returns true while the object has health remaining (or has no health at all).
    pub fn is_alive(&self) -> bool {
        self.health.is_none_or(|hp| !hp.is_depleted())
    }

    pub fn is_stunned(&self, now: GameTime) -> bool {
        self.status.contains(StatusFlags::STUNNED) && now < self.stunned_until
    }

    /// World position of an attachment slot.
    pub fn attachment_point(&self, slot: u8) -> Option<Vec3> {
        self.attachments
            .get(slot as usize)
            .map(|offset| self.position + *offset)
    }
}
