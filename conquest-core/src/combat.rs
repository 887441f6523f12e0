//! Dice combat resolution.
//!
//! The attacker rolls up to 3 dice (one fewer than their armies), the
//! defender up to 2. Both sets are sorted high-to-low and compared pairwise:
//! the attacker wins a pair only with a strictly higher die. Ties go to the
//! defender.

use crate::config::RulesConfig;
use crate::error::RulesError;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const DIE_FACES: u8 = 6;

/// Source of six-sided die results.
pub trait DiceSource {
    /// One die, uniformly distributed in `1..=6`.
    fn roll(&mut self) -> u8;
}

/// Dice backed by a uniform distribution over any RNG.
///
/// `Uniform<u8>` rejects out-of-zone samples, so faces are unbiased.
pub struct RandomDice<R = StdRng> {
    rng: R,
    die: Uniform<u8>,
}

impl<R: Rng> RandomDice<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            die: Uniform::new_inclusive(1, DIE_FACES),
        }
    }
}

impl RandomDice<StdRng> {
    /// Reproducible dice for replays and tests.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> DiceSource for RandomDice<R> {
    fn roll(&mut self) -> u8 {
        self.die.sample(&mut self.rng)
    }
}

/// Both sides' dice, each sorted descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRolls {
    pub attacker: Vec<u8>,
    pub defender: Vec<u8>,
}

impl DiceRolls {
    pub fn new(attacker: Vec<u8>, defender: Vec<u8>) -> Self {
        let mut rolls = Self { attacker, defender };
        rolls.sort_descending();
        rolls
    }

    pub fn sort_descending(&mut self) {
        self.attacker.sort_unstable_by(|a, b| b.cmp(a));
        self.defender.sort_unstable_by(|a, b| b.cmp(a));
    }

    /// Number of die pairs that will be compared.
    pub fn pairs(&self) -> usize {
        self.attacker.len().min(self.defender.len())
    }
}

/// Result of one round of dice.
///
/// The caller applies the losses; nothing here touches a territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub attacker_dice: Vec<u8>,
    pub defender_dice: Vec<u8>,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    /// Defender has no armies left after losses.
    pub conquered: bool,
}

/// The base dice-comparison algorithm, parameterised by dice limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatResolver {
    pub max_attacker_dice: usize,
    pub max_defender_dice: usize,
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self {
            max_attacker_dice: 3,
            max_defender_dice: 2,
        }
    }
}

impl CombatResolver {
    pub fn from_config(config: &RulesConfig) -> Self {
        Self {
            max_attacker_dice: config.max_attacker_dice,
            max_defender_dice: config.max_defender_dice,
        }
    }

    /// How many dice each side rolls. Validates both forces.
    pub fn dice_counts(
        &self,
        attacker_armies: u32,
        defender_armies: u32,
    ) -> Result<(usize, usize), RulesError> {
        if attacker_armies < 2 {
            return Err(RulesError::InsufficientAttackerForce {
                armies: attacker_armies,
            });
        }
        if defender_armies < 1 {
            return Err(RulesError::InsufficientDefenderForce {
                armies: defender_armies,
            });
        }

        // One army always stays behind
        let attacker = self.max_attacker_dice.min((attacker_armies - 1) as usize);
        let defender = self.max_defender_dice.min(defender_armies as usize);
        Ok((attacker, defender))
    }

    /// Roll both sides' dice.
    pub fn roll(
        &self,
        attacker_armies: u32,
        defender_armies: u32,
        dice: &mut dyn DiceSource,
    ) -> Result<DiceRolls, RulesError> {
        let (attacker_count, defender_count) =
            self.dice_counts(attacker_armies, defender_armies)?;

        let attacker = (0..attacker_count).map(|_| dice.roll()).collect();
        let defender = (0..defender_count).map(|_| dice.roll()).collect();
        Ok(DiceRolls::new(attacker, defender))
    }

    /// Roll and compare in one step.
    #[instrument(skip(self, dice), name = "resolve_battle")]
    pub fn resolve(
        &self,
        attacker_armies: u32,
        defender_armies: u32,
        dice: &mut dyn DiceSource,
    ) -> Result<BattleOutcome, RulesError> {
        let rolls = self.roll(attacker_armies, defender_armies, dice)?;
        Ok(compare_dice(&rolls, defender_armies))
    }
}

/// Roll and compare with the canonical dice limits.
pub fn resolve(
    attacker_armies: u32,
    defender_armies: u32,
    dice: &mut dyn DiceSource,
) -> Result<BattleOutcome, RulesError> {
    CombatResolver::default().resolve(attacker_armies, defender_armies, dice)
}

/// Compare sorted dice pairwise and tally losses.
///
/// Every pair costs exactly one army on one side, so the losses always sum
/// to [`DiceRolls::pairs`].
pub fn compare_dice(rolls: &DiceRolls, defender_armies: u32) -> BattleOutcome {
    let mut attacker_losses = 0;
    let mut defender_losses = 0;

    for (attack, defend) in rolls.attacker.iter().zip(&rolls.defender) {
        if attack > defend {
            defender_losses += 1;
        } else {
            attacker_losses += 1;
        }
    }

    BattleOutcome {
        attacker_dice: rolls.attacker.clone(),
        defender_dice: rolls.defender.clone(),
        attacker_losses,
        defender_losses,
        conquered: defender_armies.saturating_sub(defender_losses) == 0,
    }
}
