use anyhow::{bail, Result};
use conquest_core::{
    apply_action, legal_commands, new_game, AiPlayer, AiView, Command, Difficulty, GameEvent,
    GameSnapshot, MapModel, ModifierRegistry, Phase, PlayerAction, PlayerId, RandomDice,
    RulesConfig, RulesContext,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;

/// How to run one AI-only game.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub players: usize,
    pub difficulty: Difficulty,
    pub seed: u64,
    /// Stop after this many full rounds even without a winner.
    pub max_turns: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            players: 3,
            difficulty: Difficulty::Normal,
            seed: 12345,
            max_turns: 200,
        }
    }
}

/// Final statistics for one game.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub map: String,
    pub players: usize,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub turns: u32,
    pub finished: bool,
    pub winner: Option<PlayerId>,
    pub actions: u64,
    pub rejected: u64,
    pub battles: u64,
    pub conquests: u64,
    /// In the order they were knocked out.
    pub eliminated: Vec<PlayerId>,
    /// Territories held per player at the end.
    pub territories: BTreeMap<PlayerId, usize>,
}

#[derive(Default)]
struct Tally {
    actions: u64,
    rejected: u64,
    battles: u64,
    conquests: u64,
    eliminated: Vec<PlayerId>,
}

impl Tally {
    fn record(&mut self, events: &[GameEvent]) {
        self.actions += 1;
        for event in events {
            match event {
                GameEvent::BattleResolved { .. } => self.battles += 1,
                GameEvent::TerritoryConquered { .. } => self.conquests += 1,
                GameEvent::PlayerEliminated { player, by } => {
                    log::info!("Player {} eliminated by player {}", player, by);
                    self.eliminated.push(*player);
                }
                GameEvent::GameWon { player } => log::info!("Player {} wins", player),
                GameEvent::GameDrawn => log::info!("Game ends with no survivors"),
                _ => {}
            }
        }
    }
}

/// Who acts next: during setup the first player (in turn order) with armies
/// left to place, otherwise the active player.
fn next_actor(state: &GameSnapshot) -> Option<PlayerId> {
    if state.game.phase == Phase::Setup {
        return state
            .players_in_turn_order()
            .into_iter()
            .find(|p| p.armies_available > 0)
            .map(|p| p.id);
    }
    state.active_player().map(|p| p.id)
}

/// A command that always makes progress: one army placed, or the phase closed.
fn fallback_command(available: &[Command]) -> Option<Command> {
    available
        .iter()
        .find(|c| matches!(c, Command::PlaceArmies { .. }))
        .or_else(|| available.iter().find(|c| c.is_phase_end()))
        .cloned()
}

/// Play a full game between AIs on `map`.
pub fn run_game(map: &MapModel, rules: &RulesConfig, options: &RunOptions) -> Result<GameSummary> {
    let registry = ModifierRegistry::with_builtins(&rules.modifiers);
    let ctx = RulesContext::new(map, rules, &registry);

    let mut deal_rng = StdRng::seed_from_u64(options.seed);
    let mut dice = RandomDice::from_seed(options.seed.wrapping_add(1));
    let mut state = new_game(map, options.players, rules, &mut deal_rng)?;

    let mut ais: Vec<Box<dyn AiPlayer>> = (0..options.players as u64)
        .map(|i| options.difficulty.build(options.seed.wrapping_add(100 + i)))
        .collect();
    log::info!(
        "Starting {}-player game on '{}' with {} AI (seed {})",
        options.players,
        map.name(),
        options.difficulty,
        options.seed
    );

    let mut tally = Tally::default();
    let mut round = state.game.turn;

    while !state.game.phase.is_terminal() && state.game.turn <= options.max_turns {
        let Some(player) = next_actor(&state) else {
            bail!("No player can act in phase {}", state.game.phase);
        };
        let Some(ai) = ais.get_mut(player as usize) else {
            bail!("No AI seated for player {}", player);
        };

        let phase = state.game.phase;
        let available = legal_commands(&state, player, &ctx);
        let decision = ai.decide(&AiView::new(player, &state, map), &available);
        let mut commands = decision.into_commands(phase);
        if commands.is_empty() {
            commands.extend(fallback_command(&available));
        }

        for command in commands {
            let action = PlayerAction::new(player, command);
            match apply_action(&state, &action, &ctx, &mut dice) {
                Ok(transition) => {
                    tally.record(&transition.events);
                    state = transition.state;
                }
                Err(e) => {
                    tally.rejected += 1;
                    log::warn!(
                        "{} (player {}) issued rejected command {:?}: {}",
                        ai.name(),
                        player,
                        action.command,
                        e
                    );
                    let Some(fallback) = fallback_command(&legal_commands(&state, player, &ctx))
                    else {
                        bail!("Player {} is stuck in phase {}", player, state.game.phase);
                    };
                    let transition =
                        apply_action(&state, &PlayerAction::new(player, fallback), &ctx, &mut dice)?;
                    tally.record(&transition.events);
                    state = transition.state;
                    break;
                }
            }
            // The decision was made for the phase it saw
            if state.game.phase != phase {
                break;
            }
        }

        if state.game.turn != round {
            round = state.game.turn;
            let held: Vec<String> = state
                .players
                .iter()
                .map(|p| format!("P{}={}", p.id, state.territory_count(p.id)))
                .collect();
            log::info!("Turn {} | {}", round, held.join(" "));
        }
    }

    let finished = state.game.phase.is_terminal();
    if !finished {
        log::info!("Stopped after {} turns without a winner", options.max_turns);
    }

    Ok(GameSummary {
        map: map.name().to_string(),
        players: options.players,
        difficulty: options.difficulty,
        seed: options.seed,
        turns: state.game.turn.min(options.max_turns),
        finished,
        winner: state.game.winner,
        actions: tally.actions,
        rejected: tally.rejected,
        battles: tally.battles,
        conquests: tally.conquests,
        eliminated: tally.eliminated,
        territories: state
            .players
            .iter()
            .map(|p| (p.id, state.territory_count(p.id)))
            .collect(),
    })
}
