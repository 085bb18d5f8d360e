//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for hosts to drive the action server.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use game_content::ContentFactory;
use game_core::{ActionRegistry, EngineConfig, World};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::server::ActionServer;
use crate::workers::{Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Tick on `engine.tick_interval`. When off, only `RuntimeHandle::step` ticks.
    pub auto_tick: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_buffer_size: 256,
            command_buffer_size: 32,
            auto_tick: false,
        }
    }
}

/// Main runtime that hosts the authoritative action server.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker stops once every outstanding handle clone is dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)
    }
}

/// Where the builder gets its action definitions from.
enum ContentSource {
    /// Compiled-in data files, with their engine configuration.
    Embedded,
    /// A data directory, with its engine configuration.
    Directory(PathBuf),
    /// A prebuilt registry; the engine configuration comes from `RuntimeConfig`.
    Registry(ActionRegistry),
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    content: ContentSource,
    world: Option<World>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            content: ContentSource::Embedded,
            world: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a prebuilt registry instead of loading content.
    pub fn registry(mut self, registry: ActionRegistry) -> Self {
        self.content = ContentSource::Registry(registry);
        self
    }

    /// Load actions and `config.toml` from a data directory.
    pub fn content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content = ContentSource::Directory(dir.into());
        self
    }

    /// Provide an initial world. Every character in it gets a scheduler.
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    pub fn auto_tick(mut self, enable: bool) -> Self {
        self.config.auto_tick = enable;
        self
    }

    /// Build the runtime and spawn the simulation worker.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Content` if content files fail to load
    /// - `RuntimeError::Config` if the engine configuration references an
    ///   invalid action
    pub async fn build(self) -> Result<Runtime> {
        let mut config = self.config;
        let registry = match self.content {
            ContentSource::Embedded => {
                let (registry, engine) =
                    ContentFactory::embedded().map_err(|e| RuntimeError::Content(e.into()))?;
                config.engine = engine;
                registry
            }
            ContentSource::Directory(dir) => {
                let (registry, engine) = ContentFactory::new(dir)
                    .load_all()
                    .map_err(|e| RuntimeError::Content(e.into()))?;
                config.engine = engine;
                registry
            }
            ContentSource::Registry(registry) => {
                registry.check_config(&config.engine)?;
                registry
            }
        };

        info!(
            target: "runtime::runtime",
            actions = registry.len(),
            tick_ms = config.engine.tick_interval.as_millis(),
            auto_tick = config.auto_tick,
            "starting runtime"
        );

        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size);
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let registry = Arc::new(registry);
        let server = match self.world {
            Some(world) => ActionServer::with_world(registry, config.engine.clone(), world),
            None => ActionServer::new(registry, config.engine.clone()),
        };

        let sim_worker = SimulationWorker::new(server, command_rx, event_bus, config.auto_tick);
        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        Ok(Runtime {
            handle,
            sim_worker_handle,
        })
    }
}
