//! Battle modifier chain.
//!
//! Modifiers wrap the base dice comparison in [`crate::combat`] without
//! changing it: they may rewrite the sorted dice before comparison and
//! adjust the loss tally afterwards. Each modifier is a pure
//! applicability check plus transforms, holding no per-battle state.
//!
//! With the default [`ModifierConfig`] no built-in modifier applies, and the
//! chain is a pass-through.

use crate::combat::{compare_dice, BattleOutcome, CombatResolver, DiceRolls, DiceSource, DIE_FACES};
use crate::config::ModifierConfig;
use crate::error::RulesError;
use crate::map::MapModel;
use crate::state::{Player, Territory};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::instrument;

/// Everything a modifier may inspect about one battle.
#[derive(Debug, Clone, Copy)]
pub struct BattleContext<'a> {
    pub attacker: &'a Player,
    pub defender: &'a Player,
    pub source: &'a Territory,
    pub target: &'a Territory,
    pub territories: &'a [Territory],
    pub map: &'a MapModel,
}

/// Loss tally that modifiers may adjust after the dice comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Losses {
    pub attacker: u32,
    pub defender: u32,
}

pub trait BattleModifier: Send + Sync {
    fn name(&self) -> &str;

    /// Lower runs first.
    fn priority(&self) -> i32;

    fn applies(&self, ctx: &BattleContext<'_>) -> bool;

    /// Rewrite dice before comparison. Faces are capped at 6 and re-sorted afterwards.
    fn adjust_dice(&self, _ctx: &BattleContext<'_>, _rolls: &mut DiceRolls) {}

    /// Adjust losses after comparison.
    fn adjust_losses(&self, _ctx: &BattleContext<'_>, _losses: &mut Losses) {}
}

/// Add one to the highest die, capped at a six.
pub fn bump_highest(dice: &mut [u8]) {
    if let Some(top) = dice.iter_mut().max() {
        *top = (*top + 1).min(DIE_FACES);
    }
}

/// +1 to the defender's best die on specially fortified ground.
pub struct TerrainModifier {
    fortified: FxHashSet<String>,
}

impl TerrainModifier {
    pub fn new(fortified: impl IntoIterator<Item = String>) -> Self {
        Self {
            fortified: fortified.into_iter().collect(),
        }
    }
}

impl BattleModifier for TerrainModifier {
    fn name(&self) -> &str {
        "terrain"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn applies(&self, ctx: &BattleContext<'_>) -> bool {
        self.fortified.contains(ctx.target.name.as_str())
    }

    fn adjust_dice(&self, _ctx: &BattleContext<'_>, rolls: &mut DiceRolls) {
        bump_highest(&mut rolls.defender);
    }
}

/// +1 to the attacker's best die when attacking at three-to-one or better.
pub struct ForceRatioModifier {
    enabled: bool,
}

impl ForceRatioModifier {
    const RATIO: u32 = 3;

    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl BattleModifier for ForceRatioModifier {
    fn name(&self) -> &str {
        "force_ratio"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn applies(&self, ctx: &BattleContext<'_>) -> bool {
        self.enabled && ctx.source.armies >= ctx.target.armies.saturating_mul(Self::RATIO)
    }

    fn adjust_dice(&self, _ctx: &BattleContext<'_>, rolls: &mut DiceRolls) {
        bump_highest(&mut rolls.attacker);
    }
}

/// Large garrisons lose one army fewer per battle.
pub struct FortificationModifier {
    /// 0 disables the modifier
    threshold: u32,
}

impl FortificationModifier {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl BattleModifier for FortificationModifier {
    fn name(&self) -> &str {
        "fortification"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn applies(&self, ctx: &BattleContext<'_>) -> bool {
        self.threshold > 0 && ctx.target.armies >= self.threshold
    }

    fn adjust_losses(&self, _ctx: &BattleContext<'_>, losses: &mut Losses) {
        losses.defender = losses.defender.saturating_sub(1);
    }
}

/// Priority-ordered set of modifiers, built explicitly and passed to the engine.
#[derive(Default)]
pub struct ModifierRegistry {
    modifiers: Vec<Box<dyn BattleModifier>>,
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.modifiers.iter().map(|m| (m.name(), m.priority())))
            .finish()
    }
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in modifiers, configured from `config`.
    pub fn with_builtins(config: &ModifierConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TerrainModifier::new(
            config.fortified_territories.iter().cloned(),
        )));
        registry.register(Box::new(ForceRatioModifier::new(config.force_ratio_bonus)));
        registry.register(Box::new(FortificationModifier::new(
            config.fortification_threshold,
        )));
        registry
    }

    /// Add a modifier. Equal priorities keep registration order.
    pub fn register(&mut self, modifier: Box<dyn BattleModifier>) {
        let at = self
            .modifiers
            .partition_point(|m| m.priority() <= modifier.priority());
        self.modifiers.insert(at, modifier);
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Modifiers applicable to `ctx`, in ascending priority.
    pub fn applicable<'r>(&'r self, ctx: &BattleContext<'_>) -> Vec<&'r dyn BattleModifier> {
        self.modifiers
            .iter()
            .filter(|m| m.applies(ctx))
            .map(|m| m.as_ref())
            .collect()
    }
}

/// Registry shared across threads, for callers that register at runtime.
///
/// Battles hold the read guard for their whole resolution, so registration
/// waits for in-flight battles and readers never block each other.
#[derive(Clone, Default)]
pub struct SharedModifierRegistry {
    inner: Arc<RwLock<ModifierRegistry>>,
}

impl SharedModifierRegistry {
    pub fn new(registry: ModifierRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn register(&self, modifier: Box<dyn BattleModifier>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(modifier);
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ModifierRegistry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A battle outcome with the names of the modifiers that shaped it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBattle {
    pub outcome: BattleOutcome,
    pub applied_modifiers: Vec<String>,
}

/// Runs the base resolver with the applicable modifiers composed around it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BattleOrchestrator {
    pub resolver: CombatResolver,
}

impl BattleOrchestrator {
    pub fn new(resolver: CombatResolver) -> Self {
        Self { resolver }
    }

    #[instrument(skip_all, name = "battle", fields(from = %ctx.source.name, to = %ctx.target.name))]
    pub fn resolve(
        &self,
        registry: &ModifierRegistry,
        ctx: &BattleContext<'_>,
        dice: &mut dyn DiceSource,
    ) -> Result<ResolvedBattle, RulesError> {
        let attacker_armies = ctx.source.armies;
        let defender_armies = ctx.target.armies;

        let mut rolls = self.resolver.roll(attacker_armies, defender_armies, dice)?;
        let active = registry.applicable(ctx);

        for modifier in &active {
            modifier.adjust_dice(ctx, &mut rolls);
            for face in rolls.attacker.iter_mut().chain(rolls.defender.iter_mut()) {
                *face = (*face).clamp(1, DIE_FACES);
            }
            rolls.sort_descending();
        }

        let mut outcome = compare_dice(&rolls, defender_armies);

        if !active.is_empty() {
            let mut losses = Losses {
                attacker: outcome.attacker_losses,
                defender: outcome.defender_losses,
            };
            for modifier in &active {
                modifier.adjust_losses(ctx, &mut losses);
            }
            outcome.defender_losses = losses.defender.min(defender_armies);
            outcome.conquered = defender_armies.saturating_sub(outcome.defender_losses) == 0;
            // The attacker keeps one army home, plus one to move in on conquest
            let keep = if outcome.conquered { 2 } else { 1 };
            outcome.attacker_losses = losses.attacker.min(attacker_armies - keep);
        }

        let applied_modifiers: Vec<String> = active.iter().map(|m| m.name().to_string()).collect();
        log::trace!(
            "Battle {} -> {}: {:?} vs {:?}, losses {}/{}, modifiers {:?}",
            ctx.source.name,
            ctx.target.name,
            outcome.attacker_dice,
            outcome.defender_dice,
            outcome.attacker_losses,
            outcome.defender_losses,
            applied_modifiers
        );

        Ok(ResolvedBattle {
            outcome,
            applied_modifiers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chain_map, ScriptedDice};

    struct Fixture {
        players: Vec<Player>,
        territories: Vec<Territory>,
        map: MapModel,
    }

    impl Fixture {
        fn new(attacker_armies: u32, defender_armies: u32) -> Self {
            Self {
                players: vec![Player::new(0, 0), Player::new(1, 1)],
                territories: vec![
                    Territory {
                        id: 0,
                        name: "A".into(),
                        owner: Some(0),
                        armies: attacker_armies,
                    },
                    Territory {
                        id: 1,
                        name: "B".into(),
                        owner: Some(1),
                        armies: defender_armies,
                    },
                ],
                map: chain_map(),
            }
        }

        fn ctx(&self) -> BattleContext<'_> {
            BattleContext {
                attacker: &self.players[0],
                defender: &self.players[1],
                source: &self.territories[0],
                target: &self.territories[1],
                territories: &self.territories,
                map: &self.map,
            }
        }
    }

    /// Records which modifiers ran and in what order via dice edits.
    struct SetDefenderTop {
        name: &'static str,
        priority: i32,
        value: u8,
    }

    impl BattleModifier for SetDefenderTop {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn applies(&self, _ctx: &BattleContext<'_>) -> bool {
            true
        }
        fn adjust_dice(&self, _ctx: &BattleContext<'_>, rolls: &mut DiceRolls) {
            rolls.defender[0] = self.value;
        }
    }

    #[test]
    fn test_default_chain_is_pass_through() {
        let fixture = Fixture::new(4, 3);
        let registry = ModifierRegistry::with_builtins(&ModifierConfig::default());
        assert_eq!(registry.len(), 3);
        assert!(registry.applicable(&fixture.ctx()).is_empty());

        let mut dice = ScriptedDice::new([6, 4, 2, 5, 3]);
        let battle = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap();

        let mut base_dice = ScriptedDice::new([6, 4, 2, 5, 3]);
        let base = CombatResolver::default().resolve(4, 3, &mut base_dice).unwrap();
        assert_eq!(battle.outcome, base);
        assert!(battle.applied_modifiers.is_empty());
    }

    #[test]
    fn test_terrain_turns_win_into_tie() {
        let fixture = Fixture::new(2, 1);
        let config = ModifierConfig {
            fortified_territories: vec!["B".into()],
            ..Default::default()
        };
        let registry = ModifierRegistry::with_builtins(&config);

        // Attacker 5 vs defender 4 would win; terrain lifts defender to 5
        let mut dice = ScriptedDice::new([5, 4]);
        let battle = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap();

        assert_eq!(battle.outcome.defender_dice, vec![5]);
        assert_eq!(battle.outcome.attacker_losses, 1);
        assert_eq!(battle.applied_modifiers, vec!["terrain".to_string()]);
    }

    #[test]
    fn test_bump_caps_at_six_and_resorts() {
        let fixture = Fixture::new(2, 2);
        let config = ModifierConfig {
            fortified_territories: vec!["B".into()],
            ..Default::default()
        };
        let registry = ModifierRegistry::with_builtins(&config);

        let mut dice = ScriptedDice::new([6, 6, 3]);
        let battle = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap();
        assert_eq!(battle.outcome.defender_dice, vec![6, 3]);

        // Equal dice: one is bumped and the pair re-sorted
        let mut dice = ScriptedDice::new([6, 5, 5]);
        let battle = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap();
        assert_eq!(battle.outcome.defender_dice, vec![6, 5]);
        assert_eq!(battle.outcome.attacker_losses, 1);
    }

    #[test]
    fn test_fortification_floors_losses_at_zero() {
        let fixture = Fixture::new(4, 5);
        let config = ModifierConfig {
            fortification_threshold: 5,
            ..Default::default()
        };
        let registry = ModifierRegistry::with_builtins(&config);

        // 6,6,6 vs 1,1 -> defender would lose 2, fortification saves one
        let mut dice = ScriptedDice::new([6, 6, 6, 1, 1]);
        let battle = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap();
        assert_eq!(battle.outcome.defender_losses, 1);

        // Defender wins both: 0 losses stays 0
        let mut dice = ScriptedDice::new([1, 1, 1, 6, 6]);
        let battle = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap();
        assert_eq!(battle.outcome.defender_losses, 0);
        assert_eq!(battle.outcome.attacker_losses, 2);
    }

    #[test]
    fn test_force_ratio_requires_enable() {
        let fixture = Fixture::new(9, 3);
        let off = ModifierRegistry::with_builtins(&ModifierConfig::default());
        assert!(off.applicable(&fixture.ctx()).is_empty());

        let on = ModifierRegistry::with_builtins(&ModifierConfig {
            force_ratio_bonus: true,
            ..Default::default()
        });
        let ctx = fixture.ctx();
        let applicable = on.applicable(&ctx);
        let names: Vec<&str> = applicable.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["force_ratio"]);
    }

    #[test]
    fn test_modifiers_run_in_priority_order() {
        let fixture = Fixture::new(2, 1);
        let mut registry = ModifierRegistry::new();
        registry.register(Box::new(SetDefenderTop {
            name: "late",
            priority: 50,
            value: 2,
        }));
        registry.register(Box::new(SetDefenderTop {
            name: "early",
            priority: -5,
            value: 6,
        }));

        let mut dice = ScriptedDice::new([4, 1]);
        let battle = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap();

        // "late" runs last, so its value sticks: attacker 4 beats 2
        assert_eq!(battle.applied_modifiers, vec!["early", "late"]);
        assert_eq!(battle.outcome.defender_dice, vec![2]);
        assert!(battle.outcome.conquered);
    }

    #[test]
    fn test_shared_registry_registers_through_lock() {
        let shared = SharedModifierRegistry::default();
        let reader = shared.clone();
        shared.register(Box::new(ForceRatioModifier::new(true)));

        assert_eq!(reader.read().len(), 1);
    }

    #[test]
    fn test_orchestrator_validates_forces() {
        let fixture = Fixture::new(1, 3);
        let registry = ModifierRegistry::new();
        let mut dice = ScriptedDice::new([6]);

        let err = BattleOrchestrator::default()
            .resolve(&registry, &fixture.ctx(), &mut dice)
            .unwrap_err();
        assert_eq!(err, RulesError::InsufficientAttackerForce { armies: 1 });
    }
}
