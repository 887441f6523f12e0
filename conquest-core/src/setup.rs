//! Opening deal: shuffle the board and hand territories out round-robin.

use crate::config::RulesConfig;
use crate::engine::complete_setup;
use crate::error::RulesError;
use crate::map::MapModel;
use crate::state::{Game, GameSnapshot, Player, Territory};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::instrument;

/// A fresh game in the `Setup` phase.
///
/// Every territory is dealt with one army on it. Each player keeps the
/// starting total for this player count, less the armies already dealt, to
/// place during setup.
#[instrument(skip(map, config, rng), fields(map_name = map.name()))]
pub fn new_game<R: Rng + ?Sized>(
    map: &MapModel,
    player_count: usize,
    config: &RulesConfig,
    rng: &mut R,
) -> Result<GameSnapshot, RulesError> {
    let starting = config.starting_armies_for(player_count).ok_or_else(|| {
        let supported: Vec<String> = config
            .supported_player_counts()
            .map(|n| n.to_string())
            .collect();
        RulesError::InvalidSetup(format!(
            "No starting armies configured for {player_count} players (supported: {})",
            supported.join(", ")
        ))
    })?;
    if player_count < 2 {
        return Err(RulesError::InvalidSetup(format!(
            "At least 2 players are needed, got {player_count}"
        )));
    }
    if map.territory_count() < player_count {
        return Err(RulesError::InvalidSetup(format!(
            "Map {} has {} territories for {} players",
            map.name(),
            map.territory_count(),
            player_count
        )));
    }

    let mut players: Vec<Player> = (0..player_count as u32)
        .map(|id| Player::new(id, id))
        .collect();

    let mut deal: Vec<&str> = map.territory_names().collect();
    deal.shuffle(rng);

    let mut territories: Vec<Territory> = map
        .territory_names()
        .enumerate()
        .map(|(id, name)| Territory::new(id as u32, name))
        .collect();
    for (i, name) in deal.iter().enumerate() {
        let owner = (i % player_count) as u32;
        if let Some(t) = territories.iter_mut().find(|t| t.name == *name) {
            t.owner = Some(owner);
            t.armies = 1;
        }
    }

    for player in &mut players {
        let dealt = territories
            .iter()
            .filter(|t| t.is_owned_by(player.id))
            .count() as u32;
        if dealt > starting {
            return Err(RulesError::InvalidSetup(format!(
                "Player {} was dealt {} territories but starts with {} armies",
                player.id, dealt, starting
            )));
        }
        player.armies_available = starting - dealt;
    }

    log::debug!(
        "Dealt {} territories to {} players, {} starting armies each",
        territories.len(),
        player_count,
        starting
    );

    let mut state = GameSnapshot {
        game: Game::default(),
        players,
        territories,
    };
    // Nothing left to place: play starts straight away
    if state.players.iter().all(|p| p.armies_available == 0) {
        complete_setup(&mut state, map, config);
    }
    Ok(state)
}
