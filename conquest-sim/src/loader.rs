use anyhow::{Context, Result};
use conquest_core::{MapModel, RulesConfig};
use std::path::Path;

/// Load a map data file, or the built-in classic board when no path is given.
pub fn load_map(path: Option<&Path>) -> Result<MapModel> {
    let map = match path {
        Some(path) => {
            log::info!("Loading map from {:?}", path);
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read map file {}", path.display()))?;
            MapModel::from_json_str(&json)
                .with_context(|| format!("Invalid map file {}", path.display()))?
        }
        None => MapModel::classic().context("Built-in classic map failed to load")?,
    };

    log::info!(
        "Loaded map '{}': {} territories, {} continents",
        map.name(),
        map.territory_count(),
        map.continents().len()
    );
    Ok(map)
}

/// Load rules from a JSON file, or the canonical defaults.
pub fn load_rules(path: Option<&Path>) -> Result<RulesConfig> {
    let Some(path) = path else {
        return Ok(RulesConfig::default());
    };

    log::info!("Loading rules from {:?}", path);
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file {}", path.display()))?;
    RulesConfig::from_json_str(&json)
        .with_context(|| format!("Invalid rules file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_map_is_classic() {
        let map = load_map(None).unwrap();
        assert_eq!(map.territory_count(), 42);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_map(Some(Path::new("/nonexistent/board.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/board.json"));
    }

    #[test]
    fn test_rules_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "min_reinforcements": 4, "modifiers": {{ "force_ratio_bonus": true }} }}"#)
            .unwrap();

        let rules = load_rules(Some(file.path())).unwrap();
        assert_eq!(rules.min_reinforcements, 4);
        assert_eq!(rules.max_attacker_dice, 3);
        assert!(rules.modifiers.force_ratio_bonus);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "territories_per_army": 0 }}"#).unwrap();

        assert!(load_rules(Some(file.path())).is_err());
    }
}
