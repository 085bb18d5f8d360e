//! Headless action server session.
//!
//! Runs a short scripted fight against the embedded content and prints the
//! resulting notification stream as JSON on stdout. Logs go to stderr and
//! follow `RUST_LOG`.
use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use game_core::{ActionId, GameObject, RequestFlags, Team, Vec3};
use runtime::{ClientId, InputEdge, Runtime, WireActionRequest};

const SLASH: ActionId = ActionId(1);
const POWER_SHOT: ActionId = ActionId(5);
const HERO_CLIENT: ClientId = ClientId(1);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = Runtime::builder()
        .build()
        .await
        .context("failed to start runtime")?;
    let handle = runtime.handle();

    let hero = handle
        .spawn(
            GameObject::character(Team::Heroes, Vec3::ZERO, 100).with_attachment(Vec3::ZERO),
            Some(HERO_CLIENT),
        )
        .await?;
    let monster = handle
        .spawn(
            GameObject::character(Team::Monsters, Vec3::new(0.0, 0.0, 6.0), 60),
            None,
        )
        .await?;
    info!(%hero, %monster, "arena ready");

    let mut notifications = Vec::new();
    let mut gameplay = Vec::new();

    // Close in and slash; the chase is synthesized by the scheduler.
    let slash = WireActionRequest::new(hero, SLASH)
        .from_source(hero, 0)
        .with_target(monster)
        .with_flags(RequestFlags::SHOULD_CLOSE);
    handle.input(HERO_CLIENT, InputEdge::Press(slash)).await?;

    for _ in 0..40 {
        let report = handle.step().await?;
        notifications.extend(report.notifications);
        gameplay.extend(report.gameplay);
    }

    // Charge a shot for a second, then let go.
    let shot = WireActionRequest::new(hero, POWER_SHOT)
        .at(Vec3::ZERO, Vec3::FORWARD);
    handle.input(HERO_CLIENT, InputEdge::Press(shot)).await?;
    for tick in 0..60 {
        if tick == 20 {
            handle.release(HERO_CLIENT).await?;
        }
        let report = handle.step().await?;
        notifications.extend(report.notifications);
        gameplay.extend(report.gameplay);
    }

    let world = handle.query_world().await?;
    let health = |id| world.get(id).and_then(|o| o.health).map(|hp| hp.current);
    let summary = json!({
        "hero_health": health(hero),
        "monster_health": health(monster),
        "notifications": notifications,
        "events": gameplay
            .iter()
            .filter(|e| !matches!(e, runtime::GameplayEvent::TickCompleted { .. }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    drop(handle);
    runtime.shutdown().await?;
    Ok(())
}
