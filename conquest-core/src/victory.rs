//! Elimination and victory detection.
//!
//! Derived purely from territory ownership; re-run after every conquest,
//! since a player can be knocked out mid-attack.

use crate::state::{Player, PlayerId, Territory};
use serde::{Deserialize, Serialize};

/// How the game stands after the latest ownership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Two or more players still hold territory.
    Undecided,
    Winner(PlayerId),
    /// Nobody holds territory. Treated as a draw.
    NoSurvivors,
}

/// A player is eliminated once they own no territory.
pub fn is_eliminated(player: PlayerId, territories: &[Territory]) -> bool {
    !territories.iter().any(|t| t.is_owned_by(player))
}

/// Players who are neither flagged eliminated nor territory-less.
pub fn surviving_players<'a>(
    players: &'a [Player],
    territories: &'a [Territory],
) -> impl Iterator<Item = &'a Player> {
    players
        .iter()
        .filter(move |p| !p.eliminated && !is_eliminated(p.id, territories))
}

/// Classify the game from current ownership.
pub fn outcome(players: &[Player], territories: &[Territory]) -> GameOutcome {
    let mut survivors = surviving_players(players, territories);
    match (survivors.next(), survivors.next()) {
        (Some(only), None) => GameOutcome::Winner(only.id),
        (None, _) => GameOutcome::NoSurvivors,
        (Some(_), Some(_)) => GameOutcome::Undecided,
    }
}

/// The sole surviving player, if exactly one remains.
pub fn winner<'a>(players: &'a [Player], territories: &[Territory]) -> Option<&'a Player> {
    match outcome(players, territories) {
        GameOutcome::Winner(id) => players.iter().find(|p| p.id == id),
        GameOutcome::Undecided | GameOutcome::NoSurvivors => None,
    }
}
