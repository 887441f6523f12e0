use crate::error::MapError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunable rule constants.
///
/// The defaults are the canonical ruleset; every optional battle modifier is
/// switched off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Reinforcement floor, applied before continent bonuses.
    pub min_reinforcements: u32,
    /// Territories needed per reinforcement army.
    pub territories_per_army: u32,
    pub max_attacker_dice: usize,
    pub max_defender_dice: usize,
    /// Total starting armies per player, keyed by player count.
    pub starting_armies: BTreeMap<usize, u32>,
    pub modifiers: ModifierConfig,
}

/// Settings for the optional battle modifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierConfig {
    /// Territories whose defenders get +1 on their highest die.
    pub fortified_territories: Vec<String>,
    /// Defending stacks at least this large lose one army fewer (0 = off).
    pub fortification_threshold: u32,
    /// Attacker at 3x the defender's armies gets +1 on their highest die.
    pub force_ratio_bonus: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            min_reinforcements: 3,
            territories_per_army: 3,
            max_attacker_dice: 3,
            max_defender_dice: 2,
            starting_armies: [(2, 40), (3, 35), (4, 30), (5, 25), (6, 20)]
                .into_iter()
                .collect(),
            modifiers: ModifierConfig::default(),
        }
    }
}

impl RulesConfig {
    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        let config: RulesConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the game unplayable.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.territories_per_army == 0 {
            return Err(MapError::InvalidConfig(
                "territories_per_army must be at least 1".into(),
            ));
        }
        if self.max_attacker_dice == 0 || self.max_defender_dice == 0 {
            return Err(MapError::InvalidConfig(
                "dice limits must be at least 1".into(),
            ));
        }
        if self.starting_armies.is_empty() {
            return Err(MapError::InvalidConfig(
                "starting_armies table is empty".into(),
            ));
        }
        if let Some(&count) = self.starting_armies.keys().find(|&&count| count < 2) {
            return Err(MapError::InvalidConfig(format!(
                "starting_armies has an entry for {count} players"
            )));
        }
        Ok(())
    }

    /// Starting army total for a game with `player_count` players.
    pub fn starting_armies_for(&self, player_count: usize) -> Option<u32> {
        self.starting_armies.get(&player_count).copied()
    }

    pub fn supported_player_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.starting_armies.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RulesConfig::default();
        assert_eq!(config.min_reinforcements, 3);
        assert_eq!(config.territories_per_army, 3);
        assert_eq!(config.starting_armies_for(2), Some(40));
        assert_eq!(config.starting_armies_for(6), Some(20));
        assert_eq!(config.starting_armies_for(7), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = RulesConfig::from_json_str(r#"{ "min_reinforcements": 4 }"#).unwrap();
        assert_eq!(config.min_reinforcements, 4);
        assert_eq!(config.max_attacker_dice, 3);
        assert!(config.modifiers.fortified_territories.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = RulesConfig::from_json_str(r#"{ "territories_per_army": 0 }"#).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));

        let err = RulesConfig::from_json_str(r#"{ "starting_armies": { "1": 50 } }"#).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));
    }
}
