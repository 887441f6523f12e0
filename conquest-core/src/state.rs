use crate::phase::Phase;
use serde::{Deserialize, Serialize};

pub type PlayerId = u32;
pub type TerritoryName = String;

/// A single ownable region, as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub id: u32,
    /// Key into the [`MapModel`](crate::map::MapModel) for adjacency and continent lookup.
    pub name: TerritoryName,
    /// `None` only before territories are dealt.
    pub owner: Option<PlayerId>,
    /// At least 1 once owned.
    pub armies: u32,
}

impl Territory {
    pub fn new(id: u32, name: impl Into<TerritoryName>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            armies: 0,
        }
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Position in the turn order (unique, contiguous `0..N`).
    pub turn_order: u32,
    /// Armies granted but not yet placed on the board.
    pub armies_available: u32,
    /// Set once when the player loses their last territory; never cleared.
    pub eliminated: bool,
}

impl Player {
    pub fn new(id: PlayerId, turn_order: u32) -> Self {
        Self {
            id,
            turn_order,
            armies_available: 0,
            eliminated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Completed rounds of play, starting at 1 once setup ends. Never decreases.
    pub turn: u32,
    pub phase: Phase,
    /// Turn-order index of the active player.
    pub current_player: u32,
    /// Set exactly once; the game is over from then on.
    pub winner: Option<PlayerId>,
    /// Reset at end of turn.
    pub fortified_this_turn: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self {
            turn: 0,
            phase: Phase::Setup,
            current_player: 0,
            winner: None,
            fortified_this_turn: false,
        }
    }
}

/// Read-only view of every record the engine needs for one game.
///
/// Supplied by the caller, never held by the engine between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game: Game,
    pub players: Vec<Player>,
    pub territories: Vec<Territory>,
}

impl GameSnapshot {
    pub fn territory(&self, name: &str) -> Option<&Territory> {
        self.territories.iter().find(|t| t.name == name)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The player whose turn it is.
    pub fn active_player(&self) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.turn_order == self.game.current_player)
    }

    /// Territories owned by `player`.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Territory> {
        self.territories
            .iter()
            .filter(move |t| t.is_owned_by(player))
    }

    pub fn territory_count(&self, player: PlayerId) -> usize {
        self.owned_by(player).count()
    }

    /// Players sorted by turn order.
    pub fn players_in_turn_order(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.iter().collect();
        players.sort_by_key(|p| p.turn_order);
        players
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GameBuilder;

    #[test]
    fn test_lookup_helpers() {
        let state = GameBuilder::new()
            .with_players(2)
            .with_territory("A", Some(0), 3)
            .with_territory("B", Some(1), 1)
            .with_territory("C", Some(0), 2)
            .build();

        assert_eq!(state.territory("B").unwrap().owner, Some(1));
        assert!(state.territory("Z").is_none());
        assert_eq!(state.territory_count(0), 2);
        assert_eq!(state.territory_count(1), 1);
        assert_eq!(state.active_player().unwrap().id, 0);
    }

    #[test]
    fn test_players_in_turn_order() {
        let mut state = GameBuilder::new().with_players(3).build();
        state.players.reverse();

        let order: Vec<u32> = state
            .players_in_turn_order()
            .iter()
            .map(|p| p.turn_order)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameBuilder::new()
            .with_players(2)
            .with_territory("A", Some(0), 3)
            .build();

        let json = serde_json::to_string(&state).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
