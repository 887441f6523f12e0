//! Fortify connectivity: breadth-first search over one player's territories.
//!
//! Armies may travel through any chain of the player's own territories, so a
//! fortify destination is legal when it lies in the same owned component as
//! the source.

use crate::map::MapModel;
use crate::state::{PlayerId, Territory};
use game_pathfinding::{Bfs, Graph};
use rustc_hash::FxHashSet;
use std::collections::HashSet;

/// The map restricted to territories owned by a single player.
pub struct OwnedSubgraph<'a> {
    map: &'a MapModel,
    owned: FxHashSet<&'a str>,
}

impl<'a> OwnedSubgraph<'a> {
    pub fn new(map: &'a MapModel, player: PlayerId, territories: &'a [Territory]) -> Self {
        let owned = territories
            .iter()
            .filter(|t| t.is_owned_by(player))
            .map(|t| t.name.as_str())
            .collect();
        Self { map, owned }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owned.contains(name)
    }
}

impl<'a> Graph<&'a str, ()> for OwnedSubgraph<'a> {
    fn neighbors(&self, node: &'a str, _context: &()) -> Vec<&'a str> {
        self.map
            .adjacent(node)
            .iter()
            .map(String::as_str)
            .filter(|n| self.owned.contains(n))
            .collect()
    }
}

/// Whether `to` can be reached from `from` stepping only on `player`'s territories.
///
/// Both endpoints must themselves be owned by `player`.
pub fn connected(
    from: &str,
    to: &str,
    player: PlayerId,
    territories: &[Territory],
    map: &MapModel,
) -> bool {
    route(from, to, player, territories, map).is_some()
}

/// Fewest-hop chain of owned territories from `from` to `to`, endpoints included.
pub fn route(
    from: &str,
    to: &str,
    player: PlayerId,
    territories: &[Territory],
    map: &MapModel,
) -> Option<Vec<String>> {
    let graph = OwnedSubgraph::new(map, player, territories);
    if !graph.contains(from) || !graph.contains(to) {
        return None;
    }
    // Resolve `from` to the subgraph's own borrow so node lifetimes line up
    let start = graph.owned.get(from).copied()?;
    let goal = graph.owned.get(to).copied()?;

    Bfs::find_path(&graph, start, goal, &())
        .map(|path| path.into_iter().map(str::to_string).collect())
}

/// Every territory reachable from `from` through `player`'s own territories.
pub fn reachable_from(
    from: &str,
    player: PlayerId,
    territories: &[Territory],
    map: &MapModel,
) -> Vec<String> {
    let graph = OwnedSubgraph::new(map, player, territories);
    let Some(start) = graph.owned.get(from).copied() else {
        return Vec::new();
    };

    let reached: HashSet<&str> = Bfs::reachable(&graph, start, &());
    // Report in map order for deterministic callers
    map.territory_names()
        .filter(|name| reached.contains(name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chain_map, owned_territories};
    use proptest::prelude::*;

    fn chain_with_gap() -> Vec<Territory> {
        // A-B-C-D, player 0 owns A, B, D; player 1 owns C
        let mut territories = owned_territories(&["A", "B"], 0);
        territories.extend(owned_territories(&["C"], 1));
        territories.extend(owned_territories(&["D"], 0));
        territories
    }

    #[test]
    fn test_gap_blocks_connection() {
        let map = chain_map();
        let territories = chain_with_gap();

        assert!(connected("A", "B", 0, &territories, &map));
        assert!(!connected("A", "D", 0, &territories, &map));
    }

    #[test]
    fn test_path_through_own_chain() {
        let map = chain_map();
        let territories = owned_territories(&["A", "B", "C", "D"], 0);

        assert!(connected("A", "D", 0, &territories, &map));
        assert_eq!(
            route("A", "D", 0, &territories, &map).unwrap(),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn test_unowned_endpoint_not_connected() {
        let map = chain_map();
        let territories = chain_with_gap();

        assert!(!connected("B", "C", 0, &territories, &map));
        assert!(!connected("C", "B", 0, &territories, &map));
        assert!(!connected("A", "Nowhere", 0, &territories, &map));
    }

    #[test]
    fn test_cycle_on_classic_map_terminates() {
        let map = MapModel::classic().unwrap();
        let names: Vec<String> = map.territory_names().map(str::to_string).collect();
        let territories = owned_territories(&names, 0);

        // Whole board owned: every territory reachable despite many cycles
        assert!(connected("Argentina", "Japan", 0, &territories, &map));
        assert_eq!(reachable_from("Argentina", 0, &territories, &map).len(), 42);
    }

    #[test]
    fn test_reachable_from_stops_at_gap() {
        let map = chain_map();
        let territories = chain_with_gap();

        assert_eq!(reachable_from("A", 0, &territories, &map), vec!["A", "B"]);
        assert_eq!(reachable_from("D", 0, &territories, &map), vec!["D"]);
        assert!(reachable_from("C", 0, &territories, &map).is_empty());
    }

    proptest! {
        /// Any BFS route only steps on owned, adjacent territories.
        #[test]
        fn prop_route_is_owned_and_adjacent(owners in proptest::collection::vec(0u32..2, 42)) {
            let map = MapModel::classic().unwrap();
            let territories: Vec<Territory> = map
                .territory_names()
                .zip(&owners)
                .enumerate()
                .map(|(id, (name, &owner))| Territory {
                    id: id as u32,
                    name: name.to_string(),
                    owner: Some(owner),
                    armies: 1,
                })
                .collect();

            let first = territories.iter().find(|t| t.owner == Some(0));
            if let Some(first) = first {
                for target in territories.iter().filter(|t| t.owner == Some(0)) {
                    if let Some(path) = route(&first.name, &target.name, 0, &territories, &map) {
                        for step in path.windows(2) {
                            prop_assert!(map.are_adjacent(&step[0], &step[1]));
                        }
                        for name in &path {
                            let owner = territories.iter().find(|t| &t.name == name).unwrap().owner;
                            prop_assert_eq!(owner, Some(0));
                        }
                    }
                }
            }
        }
    }
}
