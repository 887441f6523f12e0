//! The rules step function.
//!
//! [`apply_action`] takes a read-only [`GameSnapshot`] and one
//! [`PlayerAction`], validates it against the current phase, turn, board and
//! map, and returns the next snapshot plus the events describing the change.
//! Validation completes before any mutation, and mutation happens on a clone,
//! so a rejected action leaves nothing behind.

use crate::combat::{CombatResolver, DiceSource};
use crate::config::RulesConfig;
use crate::connectivity;
use crate::error::RulesError;
use crate::input::{Command, PlayerAction};
use crate::map::MapModel;
use crate::modifiers::{BattleContext, BattleOrchestrator, ModifierRegistry, ResolvedBattle};
use crate::phase::Phase;
use crate::reinforcement::{reinforcements, Reinforcements};
use crate::state::{GameSnapshot, PlayerId, TerritoryName};
use crate::victory::{self, GameOutcome};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Static inputs shared by every call for one game: board, rules and modifiers.
#[derive(Debug, Clone, Copy)]
pub struct RulesContext<'a> {
    pub map: &'a MapModel,
    pub config: &'a RulesConfig,
    pub modifiers: &'a ModifierRegistry,
}

impl<'a> RulesContext<'a> {
    pub fn new(map: &'a MapModel, config: &'a RulesConfig, modifiers: &'a ModifierRegistry) -> Self {
        Self {
            map,
            config,
            modifiers,
        }
    }

    pub fn orchestrator(&self) -> BattleOrchestrator {
        BattleOrchestrator::new(CombatResolver::from_config(self.config))
    }
}

/// Something that changed, for the caller to persist or announce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    ArmiesPlaced {
        player: PlayerId,
        territory: TerritoryName,
        count: u32,
    },
    SetupCompleted,
    ReinforcementsGranted {
        player: PlayerId,
        reinforcements: Reinforcements,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    BattleResolved {
        attacker: PlayerId,
        defender: PlayerId,
        from: TerritoryName,
        to: TerritoryName,
        battle: ResolvedBattle,
    },
    TerritoryConquered {
        player: PlayerId,
        previous_owner: PlayerId,
        territory: TerritoryName,
        armies_moved: u32,
    },
    PlayerEliminated {
        player: PlayerId,
        by: PlayerId,
    },
    Fortified {
        player: PlayerId,
        from: TerritoryName,
        to: TerritoryName,
        armies: u32,
    },
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
        turn: u32,
    },
    GameWon {
        player: PlayerId,
    },
    /// Nobody holds territory any more.
    GameDrawn,
}

/// The accepted result of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: GameSnapshot,
    pub events: Vec<GameEvent>,
}

/// Validate and apply one action.
#[instrument(skip_all, name = "apply_action", fields(player = action.player, command = action.command.kind().name()))]
pub fn apply_action(
    state: &GameSnapshot,
    action: &PlayerAction,
    ctx: &RulesContext<'_>,
    dice: &mut dyn DiceSource,
) -> Result<Transition, RulesError> {
    state.game.phase.require(action.command.kind())?;

    let player = action.player;
    if state.player(player).is_none() {
        return Err(RulesError::UnknownPlayer(player));
    }
    if state.game.phase != Phase::Setup
        && state.active_player().map(|p| p.id) != Some(player)
    {
        return Err(RulesError::NotYourTurn { player });
    }

    let mut step = Step {
        state: state.clone(),
        events: Vec::new(),
        ctx,
    };

    match &action.command {
        Command::PlaceArmies { territory, count } => step.place_armies(player, territory, *count)?,
        Command::BeginAttack => step.begin_attack(player)?,
        Command::Attack { from, to, move_in } => step.attack(player, from, to, *move_in, dice)?,
        Command::EndAttack => step.advance_phase(),
        Command::Fortify { from, to, armies } => step.fortify(player, from, to, *armies)?,
        Command::EndTurn => step.end_turn(player),
    }

    log::trace!(
        "Player {} {:?} -> {} events",
        player,
        action.command,
        step.events.len()
    );

    Ok(Transition {
        state: step.state,
        events: step.events,
    })
}

/// Working copy for one action.
struct Step<'s, 'c> {
    state: GameSnapshot,
    events: Vec<GameEvent>,
    ctx: &'s RulesContext<'c>,
}

impl Step<'_, '_> {
    fn owned_territory(&self, player: PlayerId, name: &str) -> Result<usize, RulesError> {
        let idx = self.territory_index(name)?;
        if !self.state.territories[idx].is_owned_by(player) {
            return Err(RulesError::NotOwner {
                player,
                territory: name.to_string(),
            });
        }
        Ok(idx)
    }

    fn territory_index(&self, name: &str) -> Result<usize, RulesError> {
        self.state
            .territories
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| RulesError::UnknownTerritory(name.to_string()))
    }

    fn change_phase(&mut self, to: Phase) {
        let from = self.state.game.phase;
        if from != to {
            self.state.game.phase = to;
            self.events.push(GameEvent::PhaseChanged { from, to });
        }
    }

    /// Move to the in-turn successor of the current phase.
    fn advance_phase(&mut self) {
        if let Some(next) = self.state.game.phase.next_in_turn() {
            self.change_phase(next);
        }
    }

    fn grant_reinforcements(&mut self, player: PlayerId) {
        let event = grant_income(&mut self.state, player, self.ctx.map, self.ctx.config);
        self.events.push(event);
    }

    fn place_armies(
        &mut self,
        player: PlayerId,
        territory: &str,
        count: u32,
    ) -> Result<(), RulesError> {
        if count == 0 {
            return Err(RulesError::InvalidArmyCount);
        }
        let idx = self.owned_territory(player, territory)?;
        let available = self
            .state
            .player(player)
            .map(|p| p.armies_available)
            .unwrap_or(0);
        if count > available {
            return Err(RulesError::InsufficientArmies {
                requested: count,
                available,
            });
        }

        self.state.territories[idx].armies += count;
        if let Some(p) = self.state.player_mut(player) {
            p.armies_available -= count;
        }
        self.events.push(GameEvent::ArmiesPlaced {
            player,
            territory: territory.to_string(),
            count,
        });

        if self.state.game.phase == Phase::Setup
            && self.state.players.iter().all(|p| p.armies_available == 0)
        {
            self.complete_setup();
        }
        Ok(())
    }

    fn complete_setup(&mut self) {
        let events = complete_setup(&mut self.state, self.ctx.map, self.ctx.config);
        self.events.extend(events);
    }

    fn begin_attack(&mut self, player: PlayerId) -> Result<(), RulesError> {
        let remaining = self
            .state
            .player(player)
            .map(|p| p.armies_available)
            .unwrap_or(0);
        if remaining > 0 {
            return Err(RulesError::ReinforcementsRemaining { remaining });
        }
        self.advance_phase();
        Ok(())
    }

    fn attack(
        &mut self,
        player: PlayerId,
        from: &str,
        to: &str,
        move_in: Option<u32>,
        dice: &mut dyn DiceSource,
    ) -> Result<(), RulesError> {
        if move_in == Some(0) {
            return Err(RulesError::InvalidArmyCount);
        }
        let from_idx = self.owned_territory(player, from)?;
        let to_idx = self.territory_index(to)?;

        let defender = match self.state.territories[to_idx].owner {
            Some(owner) if owner == player => {
                return Err(RulesError::CannotAttackOwnTerritory {
                    player,
                    territory: to.to_string(),
                })
            }
            Some(owner) => owner,
            None => return Err(RulesError::InvalidSetup(format!("{to} has no owner"))),
        };
        if !self.ctx.map.are_adjacent(from, to) {
            return Err(RulesError::NotAdjacent {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let attacker_player = self
            .state
            .player(player)
            .ok_or(RulesError::UnknownPlayer(player))?;
        let defender_player = self
            .state
            .player(defender)
            .ok_or(RulesError::UnknownPlayer(defender))?;
        let battle_ctx = BattleContext {
            attacker: attacker_player,
            defender: defender_player,
            source: &self.state.territories[from_idx],
            target: &self.state.territories[to_idx],
            territories: &self.state.territories,
            map: self.ctx.map,
        };
        let battle = self
            .ctx
            .orchestrator()
            .resolve(self.ctx.modifiers, &battle_ctx, dice)?;

        let outcome = battle.outcome.clone();
        self.state.territories[from_idx].armies -= outcome.attacker_losses;
        self.state.territories[to_idx].armies -= outcome.defender_losses;
        self.events.push(GameEvent::BattleResolved {
            attacker: player,
            defender,
            from: from.to_string(),
            to: to.to_string(),
            battle,
        });

        if outcome.conquered {
            // At least one army moves in and one stays home
            let max_move = self.state.territories[from_idx].armies - 1;
            let rolled = outcome.attacker_dice.len() as u32;
            let moved = move_in
                .unwrap_or(rolled)
                .clamp(rolled.min(max_move), max_move);

            self.state.territories[from_idx].armies -= moved;
            let target = &mut self.state.territories[to_idx];
            target.owner = Some(player);
            target.armies = moved;
            self.events.push(GameEvent::TerritoryConquered {
                player,
                previous_owner: defender,
                territory: to.to_string(),
                armies_moved: moved,
            });

            self.check_elimination(defender, player);
            self.check_victory();
        }
        Ok(())
    }

    fn check_elimination(&mut self, player: PlayerId, by: PlayerId) {
        if !victory::is_eliminated(player, &self.state.territories) {
            return;
        }
        if let Some(p) = self.state.player_mut(player) {
            if p.eliminated {
                return;
            }
            p.eliminated = true;
            p.armies_available = 0;
        }
        log::debug!("Player {} eliminated by {}", player, by);
        self.events.push(GameEvent::PlayerEliminated { player, by });
    }

    fn check_victory(&mut self) {
        match victory::outcome(&self.state.players, &self.state.territories) {
            GameOutcome::Undecided => {}
            GameOutcome::Winner(player) => {
                self.state.game.winner = Some(player);
                self.change_phase(Phase::Finished);
                self.events.push(GameEvent::GameWon { player });
            }
            GameOutcome::NoSurvivors => {
                self.change_phase(Phase::Finished);
                self.events.push(GameEvent::GameDrawn);
            }
        }
    }

    fn fortify(
        &mut self,
        player: PlayerId,
        from: &str,
        to: &str,
        armies: u32,
    ) -> Result<(), RulesError> {
        if self.state.game.fortified_this_turn {
            return Err(RulesError::FortifyAlreadyUsed);
        }
        if armies == 0 {
            return Err(RulesError::InvalidArmyCount);
        }
        let from_idx = self.owned_territory(player, from)?;
        let to_idx = self.owned_territory(player, to)?;
        if from_idx == to_idx {
            return Err(RulesError::SameTerritory(from.to_string()));
        }

        let movable = self.state.territories[from_idx].armies.saturating_sub(1);
        if armies > movable {
            return Err(RulesError::InsufficientArmies {
                requested: armies,
                available: movable,
            });
        }
        if !connectivity::connected(from, to, player, &self.state.territories, self.ctx.map) {
            return Err(RulesError::NotConnected {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.state.territories[from_idx].armies -= armies;
        self.state.territories[to_idx].armies += armies;
        self.state.game.fortified_this_turn = true;
        self.events.push(GameEvent::Fortified {
            player,
            from: from.to_string(),
            to: to.to_string(),
            armies,
        });
        Ok(())
    }

    fn end_turn(&mut self, player: PlayerId) {
        let current = self.state.game.current_player;
        let next = next_player(&self.state, current);
        let (next_id, next_order) = next.unwrap_or((player, current));

        // Wrapping past the end of the order starts a new round
        if next_order <= current {
            self.state.game.turn += 1;
        }
        self.state.game.current_player = next_order;
        self.state.game.fortified_this_turn = false;
        self.events.push(GameEvent::TurnEnded {
            player,
            next_player: next_id,
            turn: self.state.game.turn,
        });

        self.change_phase(Phase::Reinforcement);
        self.grant_reinforcements(next_id);
    }
}

/// Add `player`'s income for the turn to their armies available.
fn grant_income(
    state: &mut GameSnapshot,
    player: PlayerId,
    map: &MapModel,
    config: &RulesConfig,
) -> GameEvent {
    let income = reinforcements(player, &state.territories, map, config);
    if let Some(p) = state.player_mut(player) {
        p.armies_available += income.total();
    }
    GameEvent::ReinforcementsGranted {
        player,
        reinforcements: income,
    }
}

/// Leave `Setup` for turn 1: the first seat in turn order starts its
/// reinforcement phase with this turn's income already granted.
pub(crate) fn complete_setup(
    state: &mut GameSnapshot,
    map: &MapModel,
    config: &RulesConfig,
) -> Vec<GameEvent> {
    log::debug!("Setup complete for {} players", state.players.len());
    let mut events = vec![GameEvent::SetupCompleted];
    state.game.turn = 1;
    state.game.fortified_this_turn = false;

    let from = state.game.phase;
    if from != Phase::Reinforcement {
        state.game.phase = Phase::Reinforcement;
        events.push(GameEvent::PhaseChanged {
            from,
            to: Phase::Reinforcement,
        });
    }

    let first = state
        .players_in_turn_order()
        .into_iter()
        .find(|p| !p.eliminated)
        .map(|p| (p.id, p.turn_order));
    if let Some((id, order)) = first {
        state.game.current_player = order;
        events.push(grant_income(state, id, map, config));
    }
    events
}

/// The next non-eliminated player after turn-order index `current`, wrapping.
fn next_player(state: &GameSnapshot, current: u32) -> Option<(PlayerId, u32)> {
    let order = state.players_in_turn_order();
    let after = order
        .iter()
        .filter(|p| p.turn_order > current)
        .chain(order.iter().filter(|p| p.turn_order <= current));
    after
        .filter(|p| !p.eliminated)
        .map(|p| (p.id, p.turn_order))
        .next()
}

/// Commands `player` could legally issue right now.
///
/// Placement is offered one army at a time and fortify moves everything
/// movable; callers may submit other counts, which are validated as usual.
pub fn legal_commands(state: &GameSnapshot, player: PlayerId, ctx: &RulesContext<'_>) -> Vec<Command> {
    let phase = state.game.phase;
    if phase.is_terminal() {
        return Vec::new();
    }
    if phase != Phase::Setup && state.active_player().map(|p| p.id) != Some(player) {
        return Vec::new();
    }
    let available = state.player(player).map(|p| p.armies_available).unwrap_or(0);

    let mut commands = Vec::new();
    match phase {
        Phase::Setup | Phase::Reinforcement => {
            if available > 0 {
                commands.extend(state.owned_by(player).map(|t| Command::place(&t.name, 1)));
            } else if phase == Phase::Reinforcement {
                commands.push(Command::BeginAttack);
            }
        }
        Phase::Attack => {
            for source in state.owned_by(player).filter(|t| t.armies >= 2) {
                for target in ctx.map.adjacent(&source.name) {
                    let hostile = state
                        .territory(target)
                        .is_some_and(|t| t.owner.is_some_and(|o| o != player) && t.armies >= 1);
                    if hostile {
                        commands.push(Command::attack(&source.name, target));
                    }
                }
            }
            commands.push(Command::EndAttack);
            commands.push(Command::EndTurn);
        }
        Phase::Fortify => {
            if !state.game.fortified_this_turn {
                for source in state.owned_by(player).filter(|t| t.armies >= 2) {
                    let reachable =
                        connectivity::reachable_from(&source.name, player, &state.territories, ctx.map);
                    for target in reachable.iter().filter(|n| **n != source.name) {
                        commands.push(Command::fortify(&source.name, target, source.armies - 1));
                    }
                }
            }
            commands.push(Command::EndTurn);
        }
        Phase::Finished => {}
    }
    commands
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
