//! Engine configuration loader.

use std::path::Path;

use game_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to [`EngineConfig::default`].
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| e.context(format!("in {}", path.display())))
    }

    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.tick_interval.is_zero() {
            anyhow::bail!("tick_interval must be positive");
        }
        if config.max_synthesized_per_tick == 0 {
            anyhow::bail!("max_synthesized_per_tick must be at least 1");
        }
        Ok(config)
    }

    /// The configuration shipped with the crate.
    pub fn embedded() -> LoadResult<EngineConfig> {
        Self::from_toml_str(include_str!("../../data/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use game_core::{ActionId, GameTime};

    use super::*;

    #[test]
    fn embedded_config_parses() {
        let config = ConfigLoader::embedded().unwrap();
        assert_eq!(config.chase_action, Some(ActionId(9)));
        assert_eq!(config.max_queue_time_depth, GameTime::from_millis(1600));
        assert_eq!(config.tick_interval, GameTime::from_millis(50));
    }

    #[test]
    fn missing_keys_use_defaults() {
        let config = ConfigLoader::from_toml_str("max_synthesized_per_tick = 2").unwrap();
        assert_eq!(config.max_synthesized_per_tick, 2);
        assert_eq!(config.chase_action, None);
        assert_eq!(config.anticipation_timeout, EngineConfig::DEFAULT_ANTICIPATION_TIMEOUT);
    }

    #[test]
    fn rejects_zero_tick_interval() {
        assert!(ConfigLoader::from_toml_str("tick_interval = 0").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chase_action = 3").unwrap();
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.chase_action, Some(ActionId(3)));
    }
}
