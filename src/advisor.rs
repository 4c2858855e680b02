use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{Grid, MetaPattern, Point, weighted_choice};

/// Chooses one pattern from a candidate set given the local grid context.
///
/// Advisors may read the grid but never mutate it. The returned uid must
/// belong to `candidates`; `None` is surfaced by the orchestrator as
/// [`Outcome::JudgeError`](crate::Outcome::JudgeError).
pub trait Advisor {
    /// Pick one of `candidates` (uid-sorted, never empty) for `point`.
    fn select(&mut self, candidates: &[&MetaPattern], grid: &Grid, point: Point) -> Option<u32>;
}

/// Weighted random selection with an owned, explicitly seeded RNG.
pub struct RandomAdvisor {
    rng: StdRng,
}

impl RandomAdvisor {
    /// Construct with a seed; identical seeds replay identical choices.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Advisor for RandomAdvisor {
    fn select(&mut self, candidates: &[&MetaPattern], _grid: &Grid, _point: Point) -> Option<u32> {
        weighted_choice(candidates, &mut self.rng).map(|pattern| pattern.uid)
    }
}

/// Always takes the heaviest candidate; the first encountered wins ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyAdvisor;

impl GreedyAdvisor {
    /// Construct the greedy advisor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Advisor for GreedyAdvisor {
    fn select(&mut self, candidates: &[&MetaPattern], _grid: &Grid, _point: Point) -> Option<u32> {
        let mut best: Option<&&MetaPattern> = None;
        for candidate in candidates {
            let heavier = best.is_none_or(|current| candidate.weight > current.weight);
            if heavier {
                best = Some(candidate);
            }
        }
        best.map(|pattern| pattern.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ALL_DIRECTIONS, Catalog, Rect};
    use std::sync::Arc;

    fn catalog_with_weights(weights: &[f32]) -> Arc<Catalog> {
        let count = weights.len() as u32;
        let mut patterns: Vec<MetaPattern> = weights
            .iter()
            .enumerate()
            .map(|(uid, &weight)| MetaPattern::new(uid as u32, format!("p{uid}"), weight))
            .collect();
        for pattern in &mut patterns {
            for dir in ALL_DIRECTIONS {
                for uid in 0..count {
                    pattern.rules.insert(dir, uid);
                }
            }
        }
        Arc::new(Catalog::new(patterns))
    }

    #[test]
    fn greedy_takes_the_heaviest() {
        let catalog = catalog_with_weights(&[1.0, 5.0, 3.0]);
        let grid = Grid::new(catalog.clone(), Rect::new(2, 2));
        let candidates: Vec<&MetaPattern> = catalog.all().iter().collect();

        let mut advisor = GreedyAdvisor::new();
        assert_eq!(
            advisor.select(&candidates, &grid, Point::new(0, 0)),
            Some(1)
        );
    }

    #[test]
    fn greedy_breaks_ties_towards_the_first_candidate() {
        let catalog = catalog_with_weights(&[2.0, 2.0, 2.0]);
        let grid = Grid::new(catalog.clone(), Rect::new(2, 2));
        let candidates: Vec<&MetaPattern> = catalog.all().iter().collect();

        let mut advisor = GreedyAdvisor::new();
        assert_eq!(
            advisor.select(&candidates, &grid, Point::new(0, 0)),
            Some(0)
        );
    }

    #[test]
    fn random_stays_inside_the_candidate_set() {
        let catalog = catalog_with_weights(&[1.0, 1.0, 1.0, 1.0]);
        let grid = Grid::new(catalog.clone(), Rect::new(2, 2));
        let candidates: Vec<&MetaPattern> = catalog.all().iter().skip(2).collect();

        let mut advisor = RandomAdvisor::new(7);
        for _ in 0..30 {
            let uid = advisor
                .select(&candidates, &grid, Point::new(0, 0))
                .unwrap();
            assert!(uid == 2 || uid == 3);
        }
    }

    #[test]
    fn random_is_deterministic_per_seed() {
        let catalog = catalog_with_weights(&[1.0, 2.0, 3.0]);
        let grid = Grid::new(catalog.clone(), Rect::new(2, 2));
        let candidates: Vec<&MetaPattern> = catalog.all().iter().collect();

        let mut a = RandomAdvisor::new(11);
        let mut b = RandomAdvisor::new(11);
        for _ in 0..20 {
            assert_eq!(
                a.select(&candidates, &grid, Point::new(0, 0)),
                b.select(&candidates, &grid, Point::new(0, 0))
            );
        }
    }
}
