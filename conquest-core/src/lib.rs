//! # Conquest Rules Core
//!
//! Rules engine for a territory-conquest board game: dice combat,
//! reinforcement income, fortify connectivity, the turn/phase machine and
//! win detection.
//!
//! The engine owns no game state. Callers hand it a read-only
//! [`GameSnapshot`] plus one [`PlayerAction`] and get back either the next
//! snapshot with the [`GameEvent`]s describing the change, or a typed
//! [`RulesError`]. Persistence, networking and presentation live outside.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  AI Players │────▶│ PlayerAction │────▶│ apply_action │
//! │  (decide)   │     │  (command)   │     │  (pure fn)   │
//! └─────────────┘     └──────────────┘     └──────┬───────┘
//!                                                 │
//!     ┌──────────────┐  ┌─────────────┐   ┌───────▼───────┐
//!     │ MapModel +   │─▶│   Battle    │──▶│  Transition   │
//!     │ RulesConfig  │  │ Orchestrator│   │ state + events│
//!     └──────────────┘  └─────────────┘   └───────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`MapModel`] | Static territories, continents and adjacency |
//! | [`GameSnapshot`] | Game, player and territory records for one game |
//! | [`Command`] | Player actions (PlaceArmies, Attack, Fortify, etc.) |
//! | [`apply_action`] | Pure function: `(snapshot, action) -> Transition` |
//! | [`CombatResolver`] | Base dice comparison |
//! | [`ModifierRegistry`] | Battle modifiers composed around the resolver |
//! | [`AiPlayer`] | Trait for AI decision making |

pub mod ai;
pub mod combat;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod input;
pub mod map;
pub mod modifiers;
pub mod phase;
pub mod reinforcement;
pub mod setup;
pub mod state;
pub mod testing;
pub mod victory;

pub use ai::{AiPlayer, AiView, Decision, Difficulty, GreedyAi, RandomAi};
pub use combat::{BattleOutcome, CombatResolver, DiceRolls, DiceSource, RandomDice};
pub use config::{ModifierConfig, RulesConfig};
pub use engine::{apply_action, legal_commands, GameEvent, RulesContext, Transition};
pub use error::{ErrorKind, MapError, RulesError};
pub use input::{Command, PlayerAction};
pub use map::{Continent, MapModel};
pub use modifiers::{
    BattleContext, BattleModifier, BattleOrchestrator, ModifierRegistry, SharedModifierRegistry,
};
pub use phase::Phase;
pub use reinforcement::{reinforcements, Reinforcements};
pub use setup::new_game;
pub use state::{Game, GameSnapshot, Player, PlayerId, Territory, TerritoryName};
pub use victory::GameOutcome;
