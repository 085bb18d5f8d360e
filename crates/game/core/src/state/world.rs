//! Arena of live game objects addressed by stable handles.

use std::collections::BTreeMap;

use super::{EntityId, GameObject, Team};

/// How two objects relate for effect filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Itself,
    Ally,
    Enemy,
    Other,
}

/// Authoritative set of live objects.
///
/// Objects are stored in a `BTreeMap` so iteration order follows handle order,
/// which keeps per-tick processing deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct World {
    /// Sequential handle allocator (monotonically increasing, never reused).
    next_id: u32,
    objects: BTreeMap<EntityId, GameObject>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object and returns its freshly allocated handle.
    pub fn spawn(&mut self, mut object: GameObject) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        object.id = id;
        self.objects.insert(id, object);
        id
    }

    /// Removes an object; later lookups through its handle return `None`.
    pub fn despawn(&mut self, id: EntityId) -> Option<GameObject> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.values_mut()
    }

    /// Handles of all objects currently carrying a projectile body.
    pub fn projectile_ids(&self) -> Vec<EntityId> {
        self.objects
            .values()
            .filter(|object| object.projectile.is_some())
            .map(|object| object.id)
            .collect()
    }

    /// Relation of `other` as seen from `subject`.
    ///
    /// Neutral objects are never allies or enemies of anyone.
    pub fn relation(&self, subject: EntityId, other: EntityId) -> Relation {
        if subject == other {
            return Relation::Itself;
        }
        let (Some(a), Some(b)) = (self.get(subject), self.get(other)) else {
            return Relation::Other;
        };
        match (a.team, b.team) {
            (Team::Neutral, _) | (_, Team::Neutral) => Relation::Other,
            (lhs, rhs) if lhs == rhs => Relation::Ally,
            _ => Relation::Enemy,
        }
    }
}
