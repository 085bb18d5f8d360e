//! Client player driven by a real action server's replication stream.
use std::sync::Arc;

use client_core::{ClientActionPlayer, NullSink, VisualSink};
use game_core::{
    ActionBehavior, ActionDefinition, ActionId, ActionInstance, ActionRegistry, ActionRequest,
    BlockingMode, EngineConfig, EntityId, GameObject, GameTime, Team, Vec3,
};
use runtime::ActionServer;

const SWING: ActionId = ActionId(1);
const FOCUS: ActionId = ActionId(2);
const STEP: GameTime = GameTime::from_millis(50);

#[derive(Default)]
struct Counts {
    started: usize,
    confirmed: usize,
    ended: usize,
    cancelled: usize,
}

impl VisualSink for Counts {
    fn on_visual_start(&mut self, _: &ActionInstance, _: bool) {
        self.started += 1;
    }
    fn on_visual_confirmed(&mut self, _: &ActionInstance) {
        self.confirmed += 1;
    }
    fn on_visual_end(&mut self, _: &ActionInstance) {
        self.ended += 1;
    }
    fn on_visual_cancel(&mut self, _: &ActionInstance) {
        self.cancelled += 1;
    }
}

fn setup() -> (ActionServer, ClientActionPlayer, EntityId) {
    let registry = Arc::new(
        ActionRegistry::new([
            ActionDefinition::new(SWING, "swing", ActionBehavior::Strike)
                .with_execution_delay(GameTime::from_millis(300))
                .with_blocking(BlockingMode::OnlyDuringExecutionTime)
                .anticipated(),
            ActionDefinition::new(FOCUS, "focus", ActionBehavior::Strike)
                .with_max_duration(GameTime::from_secs(5)),
        ])
        .unwrap(),
    );
    let config = EngineConfig::new();
    let mut server = ActionServer::new(Arc::clone(&registry), config.clone());
    let hero = server.spawn(GameObject::character(Team::Heroes, Vec3::ZERO, 100), None);
    let player = ClientActionPlayer::new(hero, registry, &config);
    (server, player, hero)
}

fn run(server: &mut ActionServer, player: &mut ClientActionPlayer, sink: &mut impl VisualSink, ticks: usize) {
    for _ in 0..ticks {
        let report = server.tick(STEP);
        for notification in &report.notifications {
            player.on_notification(notification, sink);
        }
        player.update(report.now, sink);
    }
}

#[test]
fn anticipated_swing_is_confirmed_and_ended_once() {
    let (mut server, mut player, hero) = setup();
    let mut sink = Counts::default();

    assert!(player.anticipate(ActionRequest::new(SWING), server.now(), &mut sink));
    server.submit(hero, ActionRequest::new(SWING)).unwrap();
    run(&mut server, &mut player, &mut sink, 12);

    assert_eq!(sink.started, 1);
    assert_eq!(sink.confirmed, 1);
    assert_eq!(sink.ended, 1);
    assert_eq!(sink.cancelled, 0);
    assert!(player.is_empty());
    assert_eq!(player.pool_stats().outstanding(), 0);
}

#[test]
fn interrupted_action_is_cancelled_on_the_client() {
    let (mut server, mut player, hero) = setup();
    let mut sink = Counts::default();

    server.submit(hero, ActionRequest::new(FOCUS)).unwrap();
    run(&mut server, &mut player, &mut sink, 2);
    assert_eq!(player.len(), 1);

    server.submit(hero, ActionRequest::new(SWING)).unwrap();
    run(&mut server, &mut player, &mut sink, 12);

    assert_eq!(sink.cancelled, 1);
    assert_eq!(sink.ended, 1);
    assert!(player.is_empty());
}

#[test]
fn server_silence_times_out_anticipation() {
    let (mut server, mut player, _) = setup();
    let mut sink = Counts::default();

    player.anticipate(ActionRequest::new(SWING), server.now(), &mut sink);
    run(&mut server, &mut player, &mut sink, 25);

    assert_eq!(sink.cancelled, 1);
    assert_eq!(sink.ended, 0);
    assert!(player.is_empty());

    player.update(GameTime::from_secs(10), &mut NullSink);
    assert_eq!(player.pool_stats().released, 1);
}
