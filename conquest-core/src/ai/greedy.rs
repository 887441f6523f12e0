use crate::ai::{AiPlayer, AiView, Decision};
use crate::input::Command;
use crate::phase::Phase;

/// A deterministic, priority-based AI.
///
/// Unlike `RandomAi`, this implementation always picks the highest-scoring
/// legal command based on immediate board position.
#[derive(Default)]
pub struct GreedyAi;

impl GreedyAi {
    pub fn new() -> Self {
        Self
    }

    /// How exposed an owned territory is: hostile armies next door minus our own.
    fn threat(&self, view: &AiView<'_>, name: &str) -> i64 {
        let own = view.territory(name).map(|t| t.armies).unwrap_or(0) as i64;
        let hostile: i64 = view.hostile_neighbors(name).map(|t| t.armies as i64).sum();
        hostile - own
    }

    /// Scores an attack. 0 or negative scores are ignored.
    fn score_attack(&self, view: &AiView<'_>, from: &str, to: &str) -> i64 {
        let (Some(source), Some(target)) = (view.territory(from), view.territory(to)) else {
            return -1;
        };
        // Only attack with a clear edge
        let edge = source.armies as i64 - target.armies as i64 - 1;
        if edge <= 0 {
            return edge;
        }

        // Prefer targets that finish off a continent
        let completes_continent = view.map.continent_of(to).is_some_and(|continent| {
            continent
                .territories
                .iter()
                .filter(|t| t.as_str() != to)
                .all(|t| view.territory(t).is_some_and(|t| t.is_owned_by(view.player)))
        });
        // Last territory of its owner
        let eliminates = target
            .owner
            .is_some_and(|owner| view.state.territory_count(owner) == 1);

        edge * 10 + if completes_continent { 50 } else { 0 } + if eliminates { 100 } else { 0 }
    }

    fn place(&self, view: &AiView<'_>, available: &[Command]) -> Decision {
        let armies = view.armies_available();
        let best = available
            .iter()
            .filter_map(|c| match c {
                Command::PlaceArmies { territory, .. } => Some(territory),
                _ => None,
            })
            // Ties go to the first candidate
            .fold(None::<(&String, i64)>, |best, name| {
                let score = self.threat(view, name);
                match best {
                    Some((_, top)) if top >= score => best,
                    _ => Some((name, score)),
                }
            });

        match best {
            Some((name, _)) if armies > 0 => Decision::Place(vec![(name.clone(), armies)]),
            _ => Decision::EndPhase,
        }
    }

    fn attack(&self, view: &AiView<'_>, available: &[Command]) -> Decision {
        let mut best: Option<(&String, &String)> = None;
        let mut best_score = 0;

        for cmd in available {
            if let Command::Attack { from, to, .. } = cmd {
                let score = self.score_attack(view, from, to);
                if score > best_score {
                    best_score = score;
                    best = Some((from, to));
                }
            }
        }

        match best {
            Some((from, to)) => Decision::Attack {
                from: from.clone(),
                to: to.clone(),
            },
            None => Decision::EndPhase,
        }
    }

    /// Move the largest interior stack towards the most threatened border.
    fn fortify(&self, view: &AiView<'_>, available: &[Command]) -> Decision {
        let mut best: Option<(&Command, i64)> = None;

        for cmd in available {
            let Command::Fortify { from, to, armies } = cmd else {
                continue;
            };
            if view.is_border(from) || !view.is_border(to) {
                continue;
            }
            let score = *armies as i64 * 100 + self.threat(view, to);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((cmd, score));
            }
        }

        match best {
            Some((Command::Fortify { from, to, armies }, _)) => Decision::Fortify {
                from: from.clone(),
                to: to.clone(),
                armies: *armies,
            },
            _ => Decision::EndPhase,
        }
    }
}

impl AiPlayer for GreedyAi {
    fn name(&self) -> &'static str {
        "GreedyAi"
    }

    fn decide(&mut self, view: &AiView<'_>, available: &[Command]) -> Decision {
        match view.phase() {
            Phase::Setup | Phase::Reinforcement => self.place(view, available),
            Phase::Attack => self.attack(view, available),
            Phase::Fortify => self.fortify(view, available),
            Phase::Finished => Decision::EndPhase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameSnapshot;
    use crate::testing::{chain_map, two_continent_map, GameBuilder};

    fn chain_state(phase: Phase) -> GameSnapshot {
        GameBuilder::new()
            .with_players(2)
            .with_territory("A", Some(0), 6)
            .with_territory("B", Some(0), 2)
            .with_territory("C", Some(1), 4)
            .with_territory("D", Some(1), 1)
            .phase(phase)
            .build()
    }

    #[test]
    fn test_places_on_threatened_border() {
        let map = chain_map();
        let state = GameBuilder::new()
            .with_players(2)
            .with_territory("A", Some(0), 1)
            .with_territory("B", Some(0), 2)
            .with_territory("C", Some(1), 4)
            .with_territory("D", Some(1), 1)
            .armies_available(0, 4)
            .build();
        let available = vec![Command::place("A", 1), Command::place("B", 1)];

        let decision = GreedyAi::new().decide(&AiView::new(0, &state, &map), &available);
        assert_eq!(decision, Decision::Place(vec![("B".into(), 4)]));
    }

    #[test]
    fn test_declines_unfavourable_attack() {
        let map = chain_map();
        let state = chain_state(Phase::Attack);
        let available = vec![Command::attack("B", "C"), Command::EndAttack];

        let decision = GreedyAi::new().decide(&AiView::new(0, &state, &map), &available);
        assert_eq!(decision, Decision::EndPhase);
    }

    #[test]
    fn test_prefers_eliminating_attack() {
        let map = two_continent_map();
        let state = GameBuilder::new()
            .with_players(3)
            .with_territory("A", Some(1), 2)
            .with_territory("B", Some(0), 8)
            .with_territory("C", Some(2), 1)
            .with_territory("D", Some(2), 1)
            .with_territory("E", Some(2), 1)
            .with_territory("F", Some(2), 1)
            .phase(Phase::Attack)
            .build();
        let available = vec![
            Command::attack("B", "C"),
            Command::attack("B", "A"),
            Command::EndAttack,
        ];

        let decision = GreedyAi::new().decide(&AiView::new(0, &state, &map), &available);
        assert_eq!(
            decision,
            Decision::Attack {
                from: "B".into(),
                to: "A".into()
            }
        );
    }

    #[test]
    fn test_fortifies_interior_to_border() {
        let map = chain_map();
        let state = chain_state(Phase::Fortify);
        let available = vec![
            Command::fortify("A", "B", 5),
            Command::fortify("B", "A", 1),
            Command::EndTurn,
        ];

        let decision = GreedyAi::new().decide(&AiView::new(0, &state, &map), &available);
        assert_eq!(
            decision,
            Decision::Fortify {
                from: "A".into(),
                to: "B".into(),
                armies: 5
            }
        );
    }
}
