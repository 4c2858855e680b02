use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::Grid;

/// What the judge wants the orchestrator to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Keep collapsing.
    Continue,
    /// Undo up to `steps` most recent placements.
    Rollback {
        /// Number of placements to undo, at least one.
        steps: usize,
    },
    /// Abandon the generation.
    Stop {
        /// Human-readable justification, logged by the orchestrator.
        reason: String,
    },
}

/// Arbitrates continue/rollback/stop at each step of a generation.
///
/// Consulted only when at least one placement could be rolled back.
pub trait Judge {
    /// Decide from the current grid state.
    fn decide(&mut self, grid: &Grid) -> Decision;

    /// When above zero, every rolled-back placement also bans the undone
    /// pattern at that cell for the rest of the generation, preventing an
    /// immediate re-collapse into the same contradiction. Zero disables
    /// the tabu.
    fn rollback_penalty(&self) -> usize {
        0
    }
}

/// Never rolls back, never stops.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysContinueJudge;

impl AlwaysContinueJudge {
    /// Construct the pass-through judge.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Judge for AlwaysContinueJudge {
    fn decide(&mut self, _grid: &Grid) -> Decision {
        Decision::Continue
    }
}

/// Rolls back a single step with a fixed probability, else continues.
pub struct RandomJudge {
    rng: StdRng,
    rollback_chance: f64,
    penalty: usize,
}

impl RandomJudge {
    /// Construct with a seed and a rollback probability in `[0, 1]`.
    #[must_use]
    pub fn new(seed: u64, rollback_chance: f64) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&rollback_chance),
            "Rollback chance must be a probability"
        );
        Self {
            rng: StdRng::seed_from_u64(seed),
            rollback_chance,
            penalty: 0,
        }
    }

    /// Enable the rollback tabu (see [`Judge::rollback_penalty`]).
    #[must_use]
    pub fn with_rollback_penalty(mut self, penalty: usize) -> Self {
        self.penalty = penalty;
        self
    }
}

impl Judge for RandomJudge {
    fn decide(&mut self, _grid: &Grid) -> Decision {
        if self.rng.random::<f64>() < self.rollback_chance {
            Decision::Rollback { steps: 1 }
        } else {
            Decision::Continue
        }
    }

    fn rollback_penalty(&self) -> usize {
        self.penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Catalog, MetaPattern, Rect};
    use std::sync::Arc;

    fn any_grid() -> Grid {
        let catalog = Arc::new(Catalog::new(vec![MetaPattern::new(0, "p0", 1.0)]));
        Grid::new(catalog, Rect::new(2, 2))
    }

    #[test]
    fn always_continue_continues() {
        let grid = any_grid();
        let mut judge = AlwaysContinueJudge::new();
        for _ in 0..10 {
            assert_eq!(judge.decide(&grid), Decision::Continue);
        }
    }

    #[test]
    fn certain_rollback_always_rolls_back_one_step() {
        let grid = any_grid();
        let mut judge = RandomJudge::new(0, 1.0);
        for _ in 0..10 {
            assert_eq!(judge.decide(&grid), Decision::Rollback { steps: 1 });
        }
    }

    #[test]
    fn zero_chance_never_rolls_back() {
        let grid = any_grid();
        let mut judge = RandomJudge::new(0, 0.0);
        for _ in 0..10 {
            assert_eq!(judge.decide(&grid), Decision::Continue);
        }
    }

    #[test]
    fn penalty_defaults_off_and_is_configurable() {
        assert_eq!(RandomJudge::new(0, 0.5).rollback_penalty(), 0);
        assert_eq!(
            RandomJudge::new(0, 0.5).with_rollback_penalty(1).rollback_penalty(),
            1
        );
        assert_eq!(AlwaysContinueJudge::new().rollback_penalty(), 0);
    }
}
