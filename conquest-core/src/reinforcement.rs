//! Reinforcement income.
//!
//! `max(3, floor(territories / 3))`, plus the bonus of every continent held
//! in full. The floor applies to the territory part only.

use crate::config::RulesConfig;
use crate::map::MapModel;
use crate::state::{PlayerId, Territory};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Reinforcement income split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reinforcements {
    /// Territory-count income after the floor.
    pub base: u32,
    pub continent_bonus: u32,
    /// Continents held in full, in map order.
    pub continents: Vec<String>,
}

impl Reinforcements {
    pub fn total(&self) -> u32 {
        self.base + self.continent_bonus
    }
}

/// Income for a player owning exactly the territories named in `owned`.
pub fn reinforcements_for<'a>(
    owned: impl IntoIterator<Item = &'a str>,
    map: &MapModel,
    config: &RulesConfig,
) -> Reinforcements {
    let owned: FxHashSet<&str> = owned.into_iter().collect();

    let by_count = owned.len() as u32 / config.territories_per_army.max(1);
    let base = by_count.max(config.min_reinforcements);

    let mut continent_bonus = 0;
    let mut continents = Vec::new();
    for continent in map.continents() {
        let held = !continent.territories.is_empty()
            && continent
                .territories
                .iter()
                .all(|t| owned.contains(t.as_str()));
        if held {
            continent_bonus += continent.bonus;
            continents.push(continent.name.clone());
        }
    }

    Reinforcements {
        base,
        continent_bonus,
        continents,
    }
}

/// Income for `player` given every territory in the game.
#[instrument(skip(territories, map, config), name = "reinforcements")]
pub fn reinforcements(
    player: PlayerId,
    territories: &[Territory],
    map: &MapModel,
    config: &RulesConfig,
) -> Reinforcements {
    reinforcements_for(
        territories
            .iter()
            .filter(|t| t.is_owned_by(player))
            .map(|t| t.name.as_str()),
        map,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{owned_territories, two_continent_map};
    use proptest::prelude::*;

    #[test]
    fn test_single_territory_gets_minimum() {
        let map = MapModel::classic().unwrap();
        let income = reinforcements_for(["Japan"], &map, &RulesConfig::default());
        assert_eq!(income.total(), 3);
        assert!(income.continents.is_empty());
    }

    #[test]
    fn test_full_north_america_nine_territories() {
        let map = MapModel::classic().unwrap();
        let na = map.continent_of("Alaska").unwrap().clone();
        let territories = owned_territories(&na.territories, 0);

        let income = reinforcements(0, &territories, &map, &RulesConfig::default());
        assert_eq!(income.base, 3);
        assert_eq!(income.continent_bonus, 5);
        assert_eq!(income.total(), 8);
        assert_eq!(income.continents, vec!["North America".to_string()]);
    }

    #[test]
    fn test_floor_applies_before_bonus() {
        // Australia: 4 territories, bonus 2 -> max(3, 1) + 2 = 5, not max(3, 1 + 2) = 3
        let map = MapModel::classic().unwrap();
        let income = reinforcements_for(
            ["Indonesia", "New Guinea", "Western Australia", "Eastern Australia"],
            &map,
            &RulesConfig::default(),
        );
        assert_eq!(income.total(), 5);
    }

    #[test]
    fn test_partial_continent_gets_no_bonus() {
        let map = two_continent_map();
        let income = reinforcements_for(["A", "B"], &map, &RulesConfig::default());
        assert_eq!(income.continent_bonus, 0);
    }

    #[test]
    fn test_other_players_territories_ignored() {
        let map = two_continent_map();
        let mut territories = owned_territories(&["A", "B", "C"], 0);
        territories.extend(owned_territories(&["D", "E", "F"], 1));

        let p0 = reinforcements(0, &territories, &map, &RulesConfig::default());
        let p1 = reinforcements(1, &territories, &map, &RulesConfig::default());
        assert_eq!(p0.continents, vec!["West".to_string()]);
        assert_eq!(p1.continents, vec!["East".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_never_below_floor_plus_bonus(count in 0usize..=42) {
            let map = MapModel::classic().unwrap();
            let names: Vec<&str> = map.territory_names().take(count).collect();
            let income = reinforcements_for(names.iter().copied(), &map, &RulesConfig::default());

            prop_assert!(income.base >= 3);
            prop_assert_eq!(income.base, 3u32.max(count as u32 / 3));
            prop_assert!(income.total() >= 3 + income.continent_bonus);
        }
    }
}
