//! Typed failures returned by the rules engine.
//!
//! Every rejected action is reported as a [`RulesError`]; nothing is ever
//! partially applied. [`RulesError::kind`] groups variants into the four
//! buckets callers usually branch on.

use crate::phase::Phase;
use crate::state::{PlayerId, TerritoryName};
use thiserror::Error;

/// Coarse classification of a [`RulesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong phase, wrong turn, too few armies, fortify already used.
    PreconditionViolation,
    /// Unknown territory or player.
    InvalidReference,
    /// Attack between territories that do not share a border.
    NotAdjacent,
    /// Fortify between territories with no owned path between them.
    NotConnected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Attacker needs at least 2 armies, has {armies}")]
    InsufficientAttackerForce { armies: u32 },

    #[error("Defender needs at least 1 army, has {armies}")]
    InsufficientDefenderForce { armies: u32 },

    #[error("{action} is not allowed during the {phase} phase")]
    PhaseViolation { action: &'static str, phase: Phase },

    #[error("{remaining} reinforcement armies must be placed first")]
    ReinforcementsRemaining { remaining: u32 },

    #[error("Fortify has already been used this turn")]
    FortifyAlreadyUsed,

    #[error("Insufficient armies: requested {requested}, available {available}")]
    InsufficientArmies { requested: u32, available: u32 },

    #[error("Army count must be at least 1")]
    InvalidArmyCount,

    #[error("Player {player} does not own {territory}")]
    NotOwner {
        player: PlayerId,
        territory: TerritoryName,
    },

    #[error("Player {player} cannot attack their own territory {territory}")]
    CannotAttackOwnTerritory {
        player: PlayerId,
        territory: TerritoryName,
    },

    #[error("It is not player {player}'s turn")]
    NotYourTurn { player: PlayerId },

    #[error("Game is already finished")]
    GameFinished,

    #[error("Unknown territory: {0}")]
    UnknownTerritory(TerritoryName),

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("{from} does not border {to}")]
    NotAdjacent {
        from: TerritoryName,
        to: TerritoryName,
    },

    #[error("No owned path connects {from} to {to}")]
    NotConnected {
        from: TerritoryName,
        to: TerritoryName,
    },

    #[error("{0} cannot be both source and target")]
    SameTerritory(TerritoryName),

    #[error("Invalid game setup: {0}")]
    InvalidSetup(String),
}

impl RulesError {
    /// Bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RulesError::UnknownTerritory(_) | RulesError::UnknownPlayer(_) => {
                ErrorKind::InvalidReference
            }
            RulesError::NotAdjacent { .. } => ErrorKind::NotAdjacent,
            RulesError::NotConnected { .. } => ErrorKind::NotConnected,
            _ => ErrorKind::PreconditionViolation,
        }
    }
}

/// Failure to load or validate a map data file or rules config.
#[derive(Error, Debug)]
pub enum MapError {
    /// Malformed JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Territory listed twice
    #[error("Duplicate territory: {0}")]
    DuplicateTerritory(String),
    /// A continent or adjacency list names a territory that does not exist
    #[error("{context} references unknown territory {name}")]
    UnknownReference { context: String, name: String },
    /// A territory that belongs to no continent, or to more than one
    #[error("Territory {name} belongs to {count} continents (expected 1)")]
    ContinentMembership { name: String, count: usize },
    /// Rules config with a value that would break the game
    #[error("Invalid rules config: {0}")]
    InvalidConfig(String),
}
