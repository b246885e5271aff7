//! Round-robin pairing plan.
//!
//! Every engine meets every other engine `games_per_pairing` times per ordered pair, so each
//! unordered pair plays `2 * games_per_pairing` games in total. Colours alternate inside a
//! pairing: even game indices give white to the first-listed engine, odd ones swap.

use std::fmt::Display;

use tracing::trace;

/// One game of the plan. Engines are referred to by their index in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledGame {
    /// Position of this game in the whole plan.
    pub index: usize,
    /// Position of this game among the games of its pairing.
    pub game_in_pairing: usize,
    /// Roster index of the engine playing white.
    pub white: usize,
    /// Roster index of the engine playing black.
    pub black: usize,
}

impl Display for ScheduledGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[#{} VS #{}]", self.white, self.black)
    }
}

/// Expands a roster size into an ordered list of games. Does not run anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobinSchedule {
    games_per_pairing: usize,
}

impl RoundRobinSchedule {
    /// Creates a schedule playing `games_per_pairing` games for each ordered pair.
    pub fn new(games_per_pairing: usize) -> Self {
        Self { games_per_pairing }
    }

    /// Games played for each ordered pair.
    pub fn games_per_pairing(&self) -> usize {
        self.games_per_pairing
    }

    /// Number of games [`plan`](Self::plan) yields for `num_engines` engines.
    pub fn total_games(&self, num_engines: usize) -> usize {
        num_engines * num_engines.saturating_sub(1) * self.games_per_pairing
    }

    /// The full plan for a roster of `num_engines` engines.
    pub fn plan(&self, num_engines: usize) -> Vec<ScheduledGame> {
        let mut pending = Vec::with_capacity(self.total_games(num_engines));
        for i in 0..num_engines {
            for j in 0..num_engines {
                if i == j {
                    continue;
                }
                for game in 0..self.games_per_pairing {
                    let (white, black) = if game % 2 == 0 { (i, j) } else { (j, i) };
                    pending.push(ScheduledGame {
                        index: pending.len(),
                        game_in_pairing: game,
                        white,
                        black,
                    });
                }
            }
        }
        trace!(games = pending.len(), "round-robin planned");
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_games() {
        for n in 0..6 {
            for k in 0..4 {
                let schedule = RoundRobinSchedule::new(k);
                assert_eq!(schedule.plan(n).len(), n * n.saturating_sub(1) * k);
                assert_eq!(schedule.total_games(n), schedule.plan(n).len());
            }
        }
    }

    #[test]
    fn test_two_engines_three_games() {
        let plan = RoundRobinSchedule::new(3).plan(2);
        assert_eq!(plan.len(), 6);
        let whites = plan.iter().map(|g| g.white).collect::<Vec<_>>();
        // A is white in 0, 2, 4 and B in 1, 3, 5
        assert_eq!(whites, [0, 1, 0, 1, 0, 1]);
        for (i, game) in plan.iter().enumerate() {
            assert_eq!(game.index, i);
            assert_ne!(game.white, game.black);
        }
    }

    #[test]
    fn test_colours_alternate_within_pairing() {
        let plan = RoundRobinSchedule::new(4).plan(3);
        for pairing in plan.chunks(4) {
            let first = (pairing[0].white, pairing[0].black);
            for game in pairing {
                let expected = if game.game_in_pairing % 2 == 0 {
                    first
                } else {
                    (first.1, first.0)
                };
                assert_eq!((game.white, game.black), expected);
            }
        }
    }

    #[test]
    fn test_every_ordered_pair_once() {
        let plan = RoundRobinSchedule::new(1).plan(4);
        let mut pairs = plan.iter().map(|g| (g.white, g.black)).collect::<Vec<_>>();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), 12);
    }

    #[test]
    fn test_single_engine_plays_nothing() {
        assert!(RoundRobinSchedule::new(5).plan(1).is_empty());
    }
}
