//! AI decision-making subsystem
//!
//! This module defines the [`AiPlayer`] trait and the built-in strategies.
//!
//! An AI sees the same read-only snapshot as everyone else, through an
//! [`AiView`], together with the list of legal commands from
//! [`legal_commands`](crate::engine::legal_commands). It answers with a
//! [`Decision`], which the caller turns into ordinary [`Command`]s and feeds
//! through [`apply_action`](crate::engine::apply_action) like any human
//! action. There is no privileged path: an illegal decision is simply
//! rejected.
//!
//! # Determinism
//!
//! Implementations must be deterministic given the same seed, so a game can
//! be replayed from its seed alone.

pub mod greedy;

pub use greedy::GreedyAi;

use crate::input::Command;
use crate::map::MapModel;
use crate::phase::Phase;
use crate::state::{GameSnapshot, PlayerId, Territory, TerritoryName};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What one player can see when deciding.
#[derive(Debug, Clone, Copy)]
pub struct AiView<'a> {
    pub player: PlayerId,
    pub state: &'a GameSnapshot,
    pub map: &'a MapModel,
}

impl<'a> AiView<'a> {
    pub fn new(player: PlayerId, state: &'a GameSnapshot, map: &'a MapModel) -> Self {
        Self { player, state, map }
    }

    pub fn phase(&self) -> Phase {
        self.state.game.phase
    }

    pub fn armies_available(&self) -> u32 {
        self.state
            .player(self.player)
            .map(|p| p.armies_available)
            .unwrap_or(0)
    }

    pub fn territory(&self, name: &str) -> Option<&'a Territory> {
        self.state.territory(name)
    }

    pub fn own_territories(&self) -> impl Iterator<Item = &'a Territory> {
        self.state.owned_by(self.player)
    }

    /// Neighbouring territories held by someone else.
    pub fn hostile_neighbors(&self, name: &str) -> impl Iterator<Item = &'a Territory> + '_ {
        let player = self.player;
        self.map
            .adjacent(name)
            .iter()
            .filter_map(|n| self.state.territory(n))
            .filter(move |t| t.owner.is_some_and(|o| o != player))
    }

    /// Owned territories with at least one hostile neighbour.
    pub fn is_border(&self, name: &str) -> bool {
        self.hostile_neighbors(name).next().is_some()
    }
}

/// An AI's choice for the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Armies to place, per territory.
    Place(Vec<(TerritoryName, u32)>),
    Attack {
        from: TerritoryName,
        to: TerritoryName,
    },
    Fortify {
        from: TerritoryName,
        to: TerritoryName,
        armies: u32,
    },
    /// Leave the current phase (or end the turn from fortify).
    EndPhase,
}

impl Decision {
    /// The commands this decision stands for in `phase`.
    pub fn into_commands(self, phase: Phase) -> Vec<Command> {
        match self {
            Decision::Place(placements) => placements
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(territory, count)| Command::PlaceArmies { territory, count })
                .collect(),
            Decision::Attack { from, to } => vec![Command::Attack {
                from,
                to,
                move_in: None,
            }],
            Decision::Fortify { from, to, armies } => vec![Command::Fortify { from, to, armies }],
            Decision::EndPhase => match phase {
                Phase::Reinforcement => vec![Command::BeginAttack],
                Phase::Attack => vec![Command::EndAttack],
                Phase::Fortify => vec![Command::EndTurn],
                Phase::Setup | Phase::Finished => vec![],
            },
        }
    }
}

/// AI decision-making trait.
///
/// `available` lists legal commands for this step. Placement commands are
/// offered one army at a time; a decision may bundle several.
pub trait AiPlayer: Send + Sync {
    fn name(&self) -> &'static str;

    fn decide(&mut self, view: &AiView<'_>, available: &[Command]) -> Decision;
}

/// Random AI that picks legal commands at random
pub struct RandomAi {
    rng: StdRng,
}

impl RandomAi {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl AiPlayer for RandomAi {
    fn name(&self) -> &'static str {
        "RandomAi"
    }

    fn decide(&mut self, view: &AiView<'_>, available: &[Command]) -> Decision {
        match view.phase() {
            Phase::Setup | Phase::Reinforcement => {
                let targets: Vec<&TerritoryName> = available
                    .iter()
                    .filter_map(|c| match c {
                        Command::PlaceArmies { territory, .. } => Some(territory),
                        _ => None,
                    })
                    .collect();
                if targets.is_empty() {
                    return Decision::EndPhase;
                }

                let mut placements: Vec<(TerritoryName, u32)> = Vec::new();
                for _ in 0..view.armies_available() {
                    let Some(&target) = targets.choose(&mut self.rng) else {
                        break;
                    };
                    match placements.iter_mut().find(|(name, _)| name == target) {
                        Some((_, count)) => *count += 1,
                        None => placements.push((target.clone(), 1)),
                    }
                }
                Decision::Place(placements)
            }
            Phase::Attack => {
                let attacks: Vec<&Command> = available
                    .iter()
                    .filter(|c| matches!(c, Command::Attack { .. }))
                    .collect();
                // Keep attacking 3 times in 4
                if self.rng.gen_ratio(3, 4) {
                    if let Some(Command::Attack { from, to, .. }) = attacks.choose(&mut self.rng) {
                        return Decision::Attack {
                            from: from.clone(),
                            to: to.clone(),
                        };
                    }
                }
                Decision::EndPhase
            }
            Phase::Fortify => {
                let moves: Vec<&Command> = available
                    .iter()
                    .filter(|c| matches!(c, Command::Fortify { armies, .. } if *armies > 0))
                    .collect();
                if self.rng.gen::<bool>() {
                    if let Some(Command::Fortify { from, to, armies }) = moves.choose(&mut self.rng)
                    {
                        return Decision::Fortify {
                            from: from.clone(),
                            to: to.clone(),
                            armies: self.rng.gen_range(1..=*armies),
                        };
                    }
                }
                Decision::EndPhase
            }
            Phase::Finished => Decision::EndPhase,
        }
    }
}

/// Strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Random legal moves
    Easy,
    /// Greedy heuristics
    #[default]
    Normal,
}

impl Difficulty {
    pub fn build(self, seed: u64) -> Box<dyn AiPlayer> {
        match self {
            Difficulty::Easy => Box::new(RandomAi::new(seed)),
            Difficulty::Normal => Box::new(GreedyAi::new()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => f.write_str("easy"),
            Difficulty::Normal => f.write_str("normal"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            other => Err(format!("unknown difficulty '{other}' (expected easy or normal)")),
        }
    }
}
