//! Static map model: territories, continents and adjacency.
//!
//! Loaded once from a map data file and shared read-only by every game on
//! that map. Lookups never fail: an unknown name has no neighbours and no
//! continent.

use crate::error::MapError;
use crate::state::TerritoryName;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Embedded classic board (42 territories, 6 continents).
const CLASSIC_MAP_JSON: &str = include_str!("../data/classic.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continent {
    pub name: String,
    /// Armies granted per turn to a player holding every member.
    pub bonus: u32,
    pub territories: Vec<TerritoryName>,
}

/// One territory entry from the map data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryDef {
    pub name: TerritoryName,
    /// Listed neighbours. The file need not list each edge in both directions.
    #[serde(default)]
    pub adjacent: Vec<TerritoryName>,
}

/// On-disk layout of a map data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFile {
    #[serde(default)]
    pub name: String,
    pub continents: Vec<Continent>,
    pub territories: Vec<TerritoryDef>,
}

#[derive(Debug, Clone)]
pub struct MapModel {
    name: String,
    continents: Vec<Continent>,
    territories: Vec<TerritoryDef>,
    /// Territory name -> index into `territories`
    index: FxHashMap<TerritoryName, usize>,
    /// Territory index -> index into `continents`
    continent_of: Vec<usize>,
    /// Symmetric closure of the listed adjacencies, per territory index
    neighbors: Vec<Vec<TerritoryName>>,
}

impl MapModel {
    /// Build a map, checking that every reference resolves and that each
    /// territory sits in exactly one continent.
    pub fn new(
        name: impl Into<String>,
        continents: Vec<Continent>,
        territories: Vec<TerritoryDef>,
    ) -> Result<Self, MapError> {
        let mut index = FxHashMap::default();
        for (idx, def) in territories.iter().enumerate() {
            if index.insert(def.name.clone(), idx).is_some() {
                return Err(MapError::DuplicateTerritory(def.name.clone()));
            }
        }

        let mut memberships: Vec<Vec<usize>> = vec![Vec::new(); territories.len()];
        for (c_idx, continent) in continents.iter().enumerate() {
            for member in &continent.territories {
                let &t_idx = index.get(member).ok_or_else(|| MapError::UnknownReference {
                    context: format!("Continent {}", continent.name),
                    name: member.clone(),
                })?;
                memberships[t_idx].push(c_idx);
            }
        }

        let mut continent_of = Vec::with_capacity(territories.len());
        for (t_idx, found) in memberships.iter().enumerate() {
            match found.as_slice() {
                [only] => continent_of.push(*only),
                other => {
                    return Err(MapError::ContinentMembership {
                        name: territories[t_idx].name.clone(),
                        count: other.len(),
                    })
                }
            }
        }

        let mut neighbor_sets: Vec<FxHashSet<usize>> =
            vec![FxHashSet::default(); territories.len()];
        for (idx, def) in territories.iter().enumerate() {
            for adj in &def.adjacent {
                let &adj_idx = index.get(adj).ok_or_else(|| MapError::UnknownReference {
                    context: format!("Adjacency of {}", def.name),
                    name: adj.clone(),
                })?;
                if adj_idx == idx {
                    continue;
                }
                if !territories[adj_idx].adjacent.contains(&def.name) {
                    log::debug!("One-directional adjacency {} -> {}", def.name, adj);
                }
                neighbor_sets[idx].insert(adj_idx);
                neighbor_sets[adj_idx].insert(idx);
            }
        }

        // Keep file order so iteration is deterministic
        let neighbors = neighbor_sets
            .iter()
            .map(|set| {
                let mut ids: Vec<usize> = set.iter().copied().collect();
                ids.sort_unstable();
                ids.into_iter()
                    .map(|i| territories[i].name.clone())
                    .collect()
            })
            .collect();

        Ok(Self {
            name: name.into(),
            continents,
            territories,
            index,
            continent_of,
            neighbors,
        })
    }

    pub fn from_map_file(file: MapFile) -> Result<Self, MapError> {
        Self::new(file.name, file.continents, file.territories)
    }

    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        let file: MapFile = serde_json::from_str(json)?;
        Self::from_map_file(file)
    }

    /// The classic 42-territory board.
    pub fn classic() -> Result<Self, MapError> {
        Self::from_json_str(CLASSIC_MAP_JSON)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn continents(&self) -> &[Continent] {
        &self.continents
    }

    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }

    /// Territory names in file order.
    pub fn territory_names(&self) -> impl Iterator<Item = &str> {
        self.territories.iter().map(|t| t.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Neighbours of `name`; empty for an unknown territory.
    pub fn adjacent(&self, name: &str) -> &[TerritoryName] {
        self.index
            .get(name)
            .map(|&idx| self.neighbors[idx].as_slice())
            .unwrap_or(&[])
    }

    /// Whether `a` and `b` share a border, listed in either direction.
    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.adjacent(a).iter().any(|n| n == b)
    }

    /// The continent containing `name`.
    pub fn continent_of(&self, name: &str) -> Option<&Continent> {
        self.index
            .get(name)
            .map(|&idx| &self.continents[self.continent_of[idx]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, adjacent: &[&str]) -> TerritoryDef {
        TerritoryDef {
            name: name.to_string(),
            adjacent: adjacent.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn continent(name: &str, bonus: u32, members: &[&str]) -> Continent {
        Continent {
            name: name.to_string(),
            bonus,
            territories: members.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_classic_map_loads() {
        let map = MapModel::classic().unwrap();
        assert_eq!(map.territory_count(), 42);
        assert_eq!(map.continents().len(), 6);

        let na = map.continent_of("Alaska").unwrap();
        assert_eq!(na.name, "North America");
        assert_eq!(na.bonus, 5);
        assert_eq!(na.territories.len(), 9);
    }

    #[test]
    fn test_classic_adjacency_is_symmetric() {
        let map = MapModel::classic().unwrap();
        for name in map.territory_names() {
            for adj in map.adjacent(name) {
                assert!(map.are_adjacent(adj, name), "{adj} -> {name} missing");
            }
        }
        assert!(map.are_adjacent("Alaska", "Kamchatka"));
        assert!(map.are_adjacent("Brazil", "North Africa"));
        assert!(!map.are_adjacent("Alaska", "Japan"));
    }

    #[test]
    fn test_unknown_key_has_no_neighbors() {
        let map = MapModel::classic().unwrap();
        assert!(map.adjacent("Atlantis").is_empty());
        assert!(map.continent_of("Atlantis").is_none());
        assert!(!map.are_adjacent("Atlantis", "Alaska"));
    }

    #[test]
    fn test_one_directional_listing_is_adjacent_both_ways() {
        let map = MapModel::new(
            "tiny",
            vec![continent("Only", 1, &["A", "B"])],
            vec![def("A", &["B"]), def("B", &[])],
        )
        .unwrap();

        assert!(map.are_adjacent("A", "B"));
        assert!(map.are_adjacent("B", "A"));
        assert_eq!(map.adjacent("B"), &["A".to_string()]);
    }

    #[test]
    fn test_duplicate_territory_rejected() {
        let result = MapModel::new(
            "dup",
            vec![continent("Only", 1, &["A"])],
            vec![def("A", &[]), def("A", &[])],
        );
        assert!(matches!(result, Err(MapError::DuplicateTerritory(n)) if n == "A"));
    }

    #[test]
    fn test_unknown_adjacency_rejected() {
        let result = MapModel::new(
            "bad",
            vec![continent("Only", 1, &["A"])],
            vec![def("A", &["Nowhere"])],
        );
        assert!(matches!(result, Err(MapError::UnknownReference { .. })));
    }

    #[test]
    fn test_territory_without_continent_rejected() {
        let result = MapModel::new(
            "orphan",
            vec![continent("Only", 1, &["A"])],
            vec![def("A", &["B"]), def("B", &["A"])],
        );
        assert!(matches!(
            result,
            Err(MapError::ContinentMembership { count: 0, .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            MapModel::from_json_str("{ not json"),
            Err(MapError::Parse(_))
        ));
    }
}
