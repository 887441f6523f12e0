//! Phase enumeration and the per-phase action surface.
//!
//! Phase flow within a game:
//! - Setup          -> Reinforcement (once every player has placed all starting armies)
//! - Reinforcement  -> Attack        (only with zero armies left to place)
//! - Attack         -> Fortify       (or straight to end of turn)
//! - Fortify        -> Reinforcement of the next eligible player
//! - any            -> Finished      (once a winner is known)

use crate::error::RulesError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    Reinforcement,
    Attack,
    Fortify,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "Setup",
            Phase::Reinforcement => "Reinforcement",
            Phase::Attack => "Attack",
            Phase::Fortify => "Fortify",
            Phase::Finished => "Finished",
        };
        f.write_str(name)
    }
}

/// The kinds of action a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PlaceArmies,
    BeginAttack,
    Attack,
    EndAttack,
    Fortify,
    EndTurn,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::PlaceArmies => "PlaceArmies",
            ActionKind::BeginAttack => "BeginAttack",
            ActionKind::Attack => "Attack",
            ActionKind::EndAttack => "EndAttack",
            ActionKind::Fortify => "Fortify",
            ActionKind::EndTurn => "EndTurn",
        }
    }
}

impl Phase {
    /// Whether `action` belongs to this phase's action surface.
    pub fn permits(self, action: ActionKind) -> bool {
        use ActionKind::*;
        match self {
            Phase::Setup => matches!(action, PlaceArmies),
            Phase::Reinforcement => matches!(action, PlaceArmies | BeginAttack),
            Phase::Attack => matches!(action, Attack | EndAttack | EndTurn),
            Phase::Fortify => matches!(action, Fortify | EndTurn),
            Phase::Finished => false,
        }
    }

    /// Reject `action` unless this phase permits it.
    pub fn require(self, action: ActionKind) -> Result<(), RulesError> {
        if self == Phase::Finished {
            return Err(RulesError::GameFinished);
        }
        if !self.permits(action) {
            return Err(RulesError::PhaseViolation {
                action: action.name(),
                phase: self,
            });
        }
        Ok(())
    }

    /// The in-turn successor reached by an explicit transition.
    ///
    /// `Fortify` has no in-turn successor: leaving it ends the turn.
    pub fn next_in_turn(self) -> Option<Phase> {
        match self {
            Phase::Reinforcement => Some(Phase::Attack),
            Phase::Attack => Some(Phase::Fortify),
            Phase::Setup | Phase::Fortify | Phase::Finished => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_rejected_during_fortify() {
        let err = Phase::Fortify.require(ActionKind::Attack).unwrap_err();
        assert_eq!(
            err,
            RulesError::PhaseViolation {
                action: "Attack",
                phase: Phase::Fortify
            }
        );
    }

    #[test]
    fn test_setup_only_places() {
        assert!(Phase::Setup.permits(ActionKind::PlaceArmies));
        assert!(!Phase::Setup.permits(ActionKind::BeginAttack));
        assert!(!Phase::Setup.permits(ActionKind::EndTurn));
    }

    #[test]
    fn test_finished_rejects_everything() {
        for action in [
            ActionKind::PlaceArmies,
            ActionKind::BeginAttack,
            ActionKind::Attack,
            ActionKind::EndAttack,
            ActionKind::Fortify,
            ActionKind::EndTurn,
        ] {
            assert_eq!(
                Phase::Finished.require(action),
                Err(RulesError::GameFinished)
            );
        }
    }

    #[test]
    fn test_in_turn_order() {
        assert_eq!(Phase::Reinforcement.next_in_turn(), Some(Phase::Attack));
        assert_eq!(Phase::Attack.next_in_turn(), Some(Phase::Fortify));
        assert_eq!(Phase::Fortify.next_in_turn(), None);
        assert!(Phase::Finished.is_terminal());
    }
}
