use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use game_core::{
    ActionId, ActionOrigin, ActionRegistry, ActionRequest, EngineConfig, EntityId, ErrorSeverity,
    GameError, RequestFlags, SlotId, Vec3, World,
};

/// Transport-assigned client identity (server-trusted).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

/// Action request as sent by a client.
///
/// The origin travels as two optional forms; exactly one must be present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireActionRequest {
    pub character: EntityId,
    pub action: ActionId,
    pub position: Option<Vec3>,
    pub direction: Option<Vec3>,
    pub source: Option<EntityId>,
    pub slot_index: Option<u8>,
    pub targets: Vec<EntityId>,
    pub slot: SlotId,
    pub flags: RequestFlags,
}

impl WireActionRequest {
    pub fn new(character: EntityId, action: ActionId) -> Self {
        Self {
            character,
            action,
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Vec3, direction: Vec3) -> Self {
        self.position = Some(position);
        self.direction = Some(direction);
        self
    }

    pub fn from_source(mut self, source: EntityId, slot_index: u8) -> Self {
        self.source = Some(source);
        self.slot_index = Some(slot_index);
        self
    }

    pub fn with_target(mut self, target: EntityId) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_flags(mut self, flags: RequestFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Input edge delivered by the transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEdge {
    /// Button pressed: submit a request.
    Press(WireActionRequest),
    /// Button released: stop charging.
    Release,
}

/// Untrusted input rejected by the request channel.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{0} has no character")]
    UnknownClient(ClientId),

    #[error("{client} does not control {character}")]
    NotOwner {
        client: ClientId,
        character: EntityId,
    },

    #[error("request carries both a point and a source origin")]
    AmbiguousOrigin,

    #[error("request carries no complete origin")]
    MissingOrigin,

    #[error("origin direction is zero")]
    ZeroDirection,

    #[error("origin source {0} does not exist")]
    SourceNotFound(EntityId),

    #[error("slot index {slot_index} out of range for {object} ({available} slots)")]
    SlotOutOfRange {
        object: EntityId,
        slot_index: u8,
        available: usize,
    },

    #[error("unknown action {0}")]
    UnknownAction(ActionId),

    #[error("{count} targets exceed the limit of {max}")]
    TooManyTargets { count: usize, max: usize },
}

impl GameError for ProtocolError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        use ProtocolError::*;
        match self {
            UnknownClient(_) => "PROTOCOL_UNKNOWN_CLIENT",
            NotOwner { .. } => "PROTOCOL_NOT_OWNER",
            AmbiguousOrigin => "PROTOCOL_AMBIGUOUS_ORIGIN",
            MissingOrigin => "PROTOCOL_MISSING_ORIGIN",
            ZeroDirection => "PROTOCOL_ZERO_DIRECTION",
            SourceNotFound(_) => "PROTOCOL_SOURCE_NOT_FOUND",
            SlotOutOfRange { .. } => "PROTOCOL_SLOT_OUT_OF_RANGE",
            UnknownAction(_) => "PROTOCOL_UNKNOWN_ACTION",
            TooManyTargets { .. } => "PROTOCOL_TOO_MANY_TARGETS",
        }
    }
}

/// Which character each client controls.
#[derive(Clone, Debug, Default)]
pub struct Sessions {
    characters: HashMap<ClientId, EntityId>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, client: ClientId, character: EntityId) {
        self.characters.insert(client, character);
    }

    pub fn unbind(&mut self, client: ClientId) -> Option<EntityId> {
        self.characters.remove(&client)
    }

    pub fn character_of(&self, client: ClientId) -> Result<EntityId, ProtocolError> {
        self.characters
            .get(&client)
            .copied()
            .ok_or(ProtocolError::UnknownClient(client))
    }
}

/// Validates wire requests against sessions, the world and the registry.
pub struct RequestValidator<'a> {
    pub sessions: &'a Sessions,
    pub registry: &'a ActionRegistry,
    pub world: &'a World,
}

impl RequestValidator<'_> {
    /// Converts a wire request from `client` into a trusted [`ActionRequest`].
    ///
    /// # Errors
    ///
    /// Any [`ProtocolError`]; the caller drops the request.
    pub fn validate(
        &self,
        client: ClientId,
        wire: WireActionRequest,
    ) -> Result<(EntityId, ActionRequest), ProtocolError> {
        let character = self.sessions.character_of(client)?;
        if wire.character != character {
            return Err(ProtocolError::NotOwner {
                client,
                character: wire.character,
            });
        }

        if !self.registry.contains(wire.action) {
            return Err(ProtocolError::UnknownAction(wire.action));
        }

        if wire.targets.len() > EngineConfig::MAX_REQUEST_TARGETS {
            return Err(ProtocolError::TooManyTargets {
                count: wire.targets.len(),
                max: EngineConfig::MAX_REQUEST_TARGETS,
            });
        }

        let origin = self.origin(client, &wire)?;
        let request = ActionRequest {
            action: wire.action,
            origin,
            targets: wire.targets,
            slot: wire.slot,
            flags: wire.flags,
            close_distance: None,
        };
        Ok((character, request))
    }

    fn origin(&self, client: ClientId, wire: &WireActionRequest) -> Result<ActionOrigin, ProtocolError> {
        let has_point = wire.position.is_some() || wire.direction.is_some();
        let has_source = wire.source.is_some() || wire.slot_index.is_some();

        match (has_point, has_source) {
            (true, true) => Err(ProtocolError::AmbiguousOrigin),
            (false, false) => Err(ProtocolError::MissingOrigin),
            (true, false) => {
                let (Some(position), Some(direction)) = (wire.position, wire.direction) else {
                    return Err(ProtocolError::MissingOrigin);
                };
                if direction.normalized() == Vec3::ZERO {
                    return Err(ProtocolError::ZeroDirection);
                }
                Ok(ActionOrigin::Point {
                    position,
                    direction,
                })
            }
            (false, true) => {
                let (Some(source), Some(slot_index)) = (wire.source, wire.slot_index) else {
                    return Err(ProtocolError::MissingOrigin);
                };
                if source != wire.character {
                    return Err(ProtocolError::NotOwner {
                        client,
                        character: source,
                    });
                }
                let object = self
                    .world
                    .get(source)
                    .ok_or(ProtocolError::SourceNotFound(source))?;
                let available = object.attachments.len();
                if usize::from(slot_index) >= available {
                    return Err(ProtocolError::SlotOutOfRange {
                        object: source,
                        slot_index,
                        available,
                    });
                }
                Ok(ActionOrigin::Source { source, slot_index })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use game_core::{ActionBehavior, ActionDefinition, GameObject, Team};

    use super::*;

    struct Fixture {
        sessions: Sessions,
        registry: ActionRegistry,
        world: World,
        hero: EntityId,
        other: EntityId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = World::new();
            let hero = world.spawn(
                GameObject::character(Team::Heroes, Vec3::ZERO, 100)
                    .with_attachment(Vec3::new(0.0, 1.0, 0.5)),
            );
            let other = world.spawn(GameObject::character(Team::Monsters, Vec3::FORWARD, 100));
            let mut sessions = Sessions::new();
            sessions.bind(ClientId(1), hero);
            let registry = ActionRegistry::new([ActionDefinition::new(
                ActionId(1),
                "slash",
                ActionBehavior::Strike,
            )])
            .unwrap();
            Self {
                sessions,
                registry,
                world,
                hero,
                other,
            }
        }

        fn validate(&self, client: ClientId, wire: WireActionRequest) -> Result<ActionRequest, ProtocolError> {
            RequestValidator {
                sessions: &self.sessions,
                registry: &self.registry,
                world: &self.world,
            }
            .validate(client, wire)
            .map(|(_, request)| request)
        }
    }

    #[test]
    fn point_origin_passes() {
        let f = Fixture::new();
        let wire = WireActionRequest::new(f.hero, ActionId(1))
            .at(Vec3::ZERO, Vec3::FORWARD)
            .with_target(f.other)
            .with_flags(RequestFlags::SHOULD_QUEUE);
        let request = f.validate(ClientId(1), wire).unwrap();
        assert_eq!(request.targets, vec![f.other]);
        assert!(request.should_queue());
        assert_eq!(request.close_distance, None);
    }

    #[test]
    fn source_origin_checks_slot_range() {
        let f = Fixture::new();
        let ok = WireActionRequest::new(f.hero, ActionId(1)).from_source(f.hero, 0);
        assert_eq!(
            f.validate(ClientId(1), ok).unwrap().origin,
            ActionOrigin::Source {
                source: f.hero,
                slot_index: 0
            }
        );

        let bad = WireActionRequest::new(f.hero, ActionId(1)).from_source(f.hero, 3);
        assert_eq!(
            f.validate(ClientId(1), bad).unwrap_err(),
            ProtocolError::SlotOutOfRange {
                object: f.hero,
                slot_index: 3,
                available: 1,
            }
        );
    }

    #[test]
    fn origin_must_have_exactly_one_form() {
        let f = Fixture::new();
        let both = WireActionRequest::new(f.hero, ActionId(1))
            .at(Vec3::ZERO, Vec3::FORWARD)
            .from_source(f.hero, 0);
        assert_eq!(f.validate(ClientId(1), both).unwrap_err(), ProtocolError::AmbiguousOrigin);

        let neither = WireActionRequest::new(f.hero, ActionId(1));
        assert_eq!(f.validate(ClientId(1), neither).unwrap_err(), ProtocolError::MissingOrigin);

        let half = WireActionRequest {
            position: Some(Vec3::ZERO),
            ..WireActionRequest::new(f.hero, ActionId(1))
        };
        assert_eq!(f.validate(ClientId(1), half).unwrap_err(), ProtocolError::MissingOrigin);
    }

    #[test]
    fn sender_must_own_character() {
        let f = Fixture::new();
        let wire = WireActionRequest::new(f.other, ActionId(1)).at(Vec3::ZERO, Vec3::FORWARD);
        assert!(matches!(
            f.validate(ClientId(1), wire.clone()).unwrap_err(),
            ProtocolError::NotOwner { .. }
        ));
        assert_eq!(
            f.validate(ClientId(9), wire).unwrap_err(),
            ProtocolError::UnknownClient(ClientId(9))
        );

        let foreign_source = WireActionRequest::new(f.hero, ActionId(1)).from_source(f.other, 0);
        assert!(matches!(
            f.validate(ClientId(1), foreign_source).unwrap_err(),
            ProtocolError::NotOwner { .. }
        ));
    }

    #[test]
    fn unknown_action_and_target_limit() {
        let f = Fixture::new();
        let unknown = WireActionRequest::new(f.hero, ActionId(77)).at(Vec3::ZERO, Vec3::FORWARD);
        assert_eq!(
            f.validate(ClientId(1), unknown).unwrap_err(),
            ProtocolError::UnknownAction(ActionId(77))
        );

        let crowd = WireActionRequest {
            targets: vec![f.other; EngineConfig::MAX_REQUEST_TARGETS + 1],
            ..WireActionRequest::new(f.hero, ActionId(1)).at(Vec3::ZERO, Vec3::FORWARD)
        };
        assert!(matches!(
            f.validate(ClientId(1), crowd).unwrap_err(),
            ProtocolError::TooManyTargets { .. }
        ));
    }

    #[test]
    fn protocol_errors_are_validation_severity() {
        let err = ProtocolError::AmbiguousOrigin;
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "PROTOCOL_AMBIGUOUS_ORIGIN");
    }
}
