use crate::phase::ActionKind;
use crate::state::{PlayerId, TerritoryName};
use serde::{Deserialize, Serialize};

/// A command issued by one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerAction {
    pub player: PlayerId,
    pub command: Command,
}

impl PlayerAction {
    pub fn new(player: PlayerId, command: Command) -> Self {
        Self { player, command }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Command {
    // Setup / Reinforcement
    PlaceArmies {
        territory: TerritoryName,
        count: u32,
    },
    BeginAttack,

    // Attack
    Attack {
        from: TerritoryName,
        to: TerritoryName,
        /// Armies to move in on conquest. `None` moves as many as dice rolled.
        move_in: Option<u32>,
    },
    EndAttack,

    // Fortify
    Fortify {
        from: TerritoryName,
        to: TerritoryName,
        armies: u32,
    },

    EndTurn,
}

impl Command {
    pub fn kind(&self) -> ActionKind {
        match self {
            Command::PlaceArmies { .. } => ActionKind::PlaceArmies,
            Command::BeginAttack => ActionKind::BeginAttack,
            Command::Attack { .. } => ActionKind::Attack,
            Command::EndAttack => ActionKind::EndAttack,
            Command::Fortify { .. } => ActionKind::Fortify,
            Command::EndTurn => ActionKind::EndTurn,
        }
    }

    pub fn attack(from: &str, to: &str) -> Self {
        Command::Attack {
            from: from.to_string(),
            to: to.to_string(),
            move_in: None,
        }
    }

    pub fn place(territory: &str, count: u32) -> Self {
        Command::PlaceArmies {
            territory: territory.to_string(),
            count,
        }
    }

    pub fn fortify(from: &str, to: &str, armies: u32) -> Self {
        Command::Fortify {
            from: from.to_string(),
            to: to.to_string(),
            armies,
        }
    }

    /// Commands that close out a phase or turn rather than act on the board.
    pub fn is_phase_end(&self) -> bool {
        matches!(
            self,
            Command::BeginAttack | Command::EndAttack | Command::EndTurn
        )
    }
}
