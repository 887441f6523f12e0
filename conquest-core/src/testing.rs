//! Fixtures for tests: a fluent snapshot builder, scripted dice and small maps.

use crate::combat::{DiceSource, DIE_FACES};
use crate::map::{Continent, MapModel, TerritoryDef};
use crate::phase::Phase;
use crate::state::{Game, GameSnapshot, Player, PlayerId, Territory};
use std::collections::VecDeque;

pub struct GameBuilder {
    state: GameSnapshot,
}

impl GameBuilder {
    /// Empty game in turn 1's reinforcement phase.
    pub fn new() -> Self {
        Self {
            state: GameSnapshot {
                game: Game {
                    turn: 1,
                    phase: Phase::Reinforcement,
                    ..Default::default()
                },
                players: Vec::new(),
                territories: Vec::new(),
            },
        }
    }

    /// Players `0..n`, each seated at their own id in the turn order.
    pub fn with_players(mut self, n: u32) -> Self {
        self.state.players = (0..n).map(|id| Player::new(id, id)).collect();
        self
    }

    pub fn with_territory(mut self, name: &str, owner: Option<PlayerId>, armies: u32) -> Self {
        let id = self.state.territories.len() as u32;
        self.state.territories.push(Territory {
            id,
            name: name.to_string(),
            owner,
            armies,
        });
        self
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.state.game.phase = phase;
        self
    }

    pub fn turn(mut self, turn: u32) -> Self {
        self.state.game.turn = turn;
        self
    }

    /// Turn-order index of the active player.
    pub fn current_player(mut self, turn_order: u32) -> Self {
        self.state.game.current_player = turn_order;
        self
    }

    pub fn armies_available(mut self, player: PlayerId, armies: u32) -> Self {
        if let Some(p) = self.state.player_mut(player) {
            p.armies_available = armies;
        }
        self
    }

    pub fn eliminated(mut self, player: PlayerId) -> Self {
        if let Some(p) = self.state.player_mut(player) {
            p.eliminated = true;
        }
        self
    }

    pub fn fortified(mut self) -> Self {
        self.state.game.fortified_this_turn = true;
        self
    }

    pub fn build(self) -> GameSnapshot {
        self.state
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Dice that replay a fixed sequence of faces.
///
/// Once the script runs out every further roll is a 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self) -> u8 {
        self.faces.pop_front().unwrap_or(1).clamp(1, DIE_FACES)
    }
}

/// One territory per name, all owned by `owner` with a single army.
pub fn owned_territories(names: &[impl AsRef<str>], owner: PlayerId) -> Vec<Territory> {
    names
        .iter()
        .enumerate()
        .map(|(id, name)| Territory {
            id: id as u32,
            name: name.as_ref().to_string(),
            owner: Some(owner),
            armies: 1,
        })
        .collect()
}

fn linear_map(name: &str, continents: Vec<Continent>, names: &[&str]) -> MapModel {
    let territories = names
        .iter()
        .enumerate()
        .map(|(i, name)| TerritoryDef {
            name: name.to_string(),
            adjacent: names
                .get(i + 1)
                .map(|next| vec![next.to_string()])
                .unwrap_or_default(),
        })
        .collect();

    match MapModel::new(name, continents, territories) {
        Ok(map) => map,
        Err(e) => panic!("fixture map {name} is invalid: {e}"),
    }
}

/// `A - B - C - D`, one continent worth 2.
pub fn chain_map() -> MapModel {
    linear_map(
        "Chain",
        vec![Continent {
            name: "Line".into(),
            bonus: 2,
            territories: ["A", "B", "C", "D"].map(String::from).to_vec(),
        }],
        &["A", "B", "C", "D"],
    )
}

/// `A - B - C - D - E - F`: West holds A, B, C (bonus 2) and East holds D, E, F (bonus 3).
pub fn two_continent_map() -> MapModel {
    linear_map(
        "Two Continents",
        vec![
            Continent {
                name: "West".into(),
                bonus: 2,
                territories: ["A", "B", "C"].map(String::from).to_vec(),
            },
            Continent {
                name: "East".into(),
                bonus: 3,
                territories: ["D", "E", "F"].map(String::from).to_vec(),
            },
        ],
        &["A", "B", "C", "D", "E", "F"],
    )
}
