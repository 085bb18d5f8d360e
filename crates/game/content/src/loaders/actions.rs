//! Action definition loader.
//!
//! Loads action definitions from RON files (each file holds a list) and
//! validates them into an [`ActionRegistry`].

use std::path::Path;

use anyhow::Context;
use game_core::{ActionDefinition, ActionRegistry};

use crate::loaders::{LoadResult, read_file};

/// Embedded action files shipped with the crate, in load order.
const EMBEDDED: [(&str, &str); 3] = [
    ("melee.ron", include_str!("../../data/actions/melee.ron")),
    ("ranged.ron", include_str!("../../data/actions/ranged.ron")),
    ("support.ron", include_str!("../../data/actions/support.ron")),
];

/// Loader for action definitions.
pub struct ActionLoader;

impl ActionLoader {
    /// Loads and validates the embedded action set.
    pub fn embedded() -> LoadResult<ActionRegistry> {
        let mut definitions = Vec::new();
        for (name, content) in EMBEDDED {
            definitions
                .extend(Self::from_ron_str(content).with_context(|| format!("in {name}"))?);
        }
        Self::build(definitions)
    }

    /// Loads every `*.ron` file in `dir` (sorted by file name) into one registry.
    pub fn load_dir(dir: &Path) -> LoadResult<ActionRegistry> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read action directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        paths.sort();

        let mut definitions = Vec::new();
        for path in &paths {
            definitions.extend(Self::load_file(path)?);
        }
        Self::build(definitions)
    }

    /// Parses one RON file without validating cross-references.
    pub fn load_file(path: &Path) -> LoadResult<Vec<ActionDefinition>> {
        let content = read_file(path)?;
        Self::from_ron_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Parses a RON list of definitions.
    pub fn from_ron_str(content: &str) -> LoadResult<Vec<ActionDefinition>> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse actions RON: {}", e))
    }

    /// Validates parsed definitions into a registry.
    pub fn build(definitions: Vec<ActionDefinition>) -> LoadResult<ActionRegistry> {
        let count = definitions.len();
        ActionRegistry::new(definitions)
            .with_context(|| format!("Invalid action set ({count} definitions)"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use game_core::{
        ActionBehavior, ActionId, BlockingMode, BuffKind, ConfigError, EffectKind, GameTime,
        TargetingMode,
    };

    use super::*;

    #[test]
    fn embedded_actions_load() {
        let registry = ActionLoader::embedded().unwrap();
        assert_eq!(registry.len(), 13);

        let slash = registry.get(ActionId(1)).unwrap();
        assert_eq!(slash.name, "slash");
        assert_eq!(slash.targeting, TargetingMode::Explicit { max_targets: 1 });
        assert_eq!(slash.execution_delay, GameTime::from_millis(250));
        assert!(slash.hostile && slash.client_anticipate);

        let opener = registry.get(ActionId(3)).unwrap();
        assert_eq!(opener.chain, Some(ActionId(4)));

        let guard = registry.get(ActionId(7)).unwrap();
        assert_eq!(guard.blocking, BlockingMode::Never);
        assert_eq!(
            guard.behavior,
            ActionBehavior::Buff {
                kind: BuffKind::DamageReceived,
                multiplier: 0.5,
            }
        );
    }

    #[test]
    fn projectile_hit_effects_parse() {
        let registry = ActionLoader::embedded().unwrap();
        let shot = registry.get(ActionId(5)).unwrap();
        let charge = shot.charge.as_ref().unwrap();
        assert_eq!(charge.stage_multipliers, vec![1.5, 2.0, 3.0]);

        let EffectKind::SpawnProjectile(projectile) = &shot.effects[0].kind else {
            panic!("expected a projectile effect");
        };
        assert_eq!(projectile.on_hit.len(), 1);
        assert!(matches!(
            &projectile.on_hit[0].kind,
            EffectKind::Damage(damage) if damage.scales_with_charge
        ));
    }

    #[test]
    fn embedded_set_satisfies_embedded_config() {
        let registry = ActionLoader::embedded().unwrap();
        let config = crate::ConfigLoader::embedded().unwrap();
        registry.check_config(&config).unwrap();
    }

    #[test]
    fn dangling_chain_is_rejected() {
        let ron = r#"[(id: 1, name: "a", behavior: Strike, chain: Some(2))]"#;
        let definitions = ActionLoader::from_ron_str(ron).unwrap();
        let err = ActionLoader::build(definitions).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownReference { .. })
        ));
    }

    #[test]
    fn load_dir_merges_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.ron"),
            r#"[(id: 2, name: "follow", behavior: Strike)]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a.ron"),
            r#"[(id: 1, name: "lead", behavior: Strike, chain: Some(2))]"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = ActionLoader::load_dir(dir.path()).unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![ActionId(1), ActionId(2)]);
    }

    #[test]
    fn duplicate_ids_across_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.ron", "b.ron"] {
            fs::write(
                dir.path().join(name),
                r#"[(id: 1, name: "dup", behavior: Strike)]"#,
            )
            .unwrap();
        }
        assert!(ActionLoader::load_dir(dir.path()).is_err());
    }
}
