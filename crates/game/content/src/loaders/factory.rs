//! Content factory for building the engine's inputs from a data directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use game_core::{ActionRegistry, EngineConfig};

use crate::loaders::{ActionLoader, ConfigLoader, LoadResult};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── actions/
///     ├── melee.ron
///     └── ranged.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("config.toml");
        ConfigLoader::load(&path)
    }

    /// Load every action file under `actions/`.
    pub fn load_actions(&self) -> LoadResult<ActionRegistry> {
        let dir = self.data_dir.join("actions");
        ActionLoader::load_dir(&dir)
    }

    /// Loads both and checks the configuration's references into the registry.
    pub fn load_all(&self) -> LoadResult<(ActionRegistry, EngineConfig)> {
        let registry = self.load_actions()?;
        let config = self.load_config()?;
        registry
            .check_config(&config)
            .context("config.toml references an invalid action")?;
        Ok((registry, config))
    }

    /// Embedded counterpart of [`load_all`](Self::load_all).
    pub fn embedded() -> LoadResult<(ActionRegistry, EngineConfig)> {
        let registry = ActionLoader::embedded()?;
        let config = ConfigLoader::embedded()?;
        registry
            .check_config(&config)
            .context("embedded config references an invalid action")?;
        Ok((registry, config))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn load_all_checks_chase_reference() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("actions")).unwrap();
        fs::write(
            dir.path().join("actions/basic.ron"),
            r#"[(id: 1, name: "poke", behavior: Strike)]"#,
        )
        .unwrap();
        fs::write(dir.path().join("config.toml"), "chase_action = 1").unwrap();

        let factory = ContentFactory::new(dir.path());
        assert!(factory.load_actions().is_ok());
        assert!(factory.load_all().is_err());

        fs::write(dir.path().join("config.toml"), "").unwrap();
        let (registry, config) = factory.load_all().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(config.chase_action, None);
    }

    #[test]
    fn embedded_content_is_consistent() {
        let (registry, config) = ContentFactory::embedded().unwrap();
        assert!(config.chase_action.is_some_and(|id| registry.contains(id)));
    }
}
