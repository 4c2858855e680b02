//! Property-based checks over randomized runs.

use proptest::prelude::*;
use std::sync::Arc;

use wavegrid::{
    ALL_DIRECTIONS, Catalog, Grid, MetaPattern, Outcome, Point, RandomAdvisor, RandomJudge, Rect,
    Wfc,
};

const FOREST: &str = include_str!("../demos/forest.json");

fn open_catalog(count: u32) -> Arc<Catalog> {
    let mut patterns: Vec<MetaPattern> = (0..count)
        .map(|uid| MetaPattern::new(uid, format!("p{uid}"), 1.0))
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

fn assert_entropy_consistency(grid: &Grid) {
    let (height, width) = grid.size();
    for x in 0..height {
        for y in 0..width {
            let p = Point::new(x, y);
            let expected = if grid.uid_at(p).is_some() {
                0
            } else {
                grid.valid_patterns(p).len()
            };
            assert_eq!(grid.entropy_at(p), expected, "stale entropy at {p}");
        }
    }
}

/// Collapse the least-entropy cell with a deterministic candidate pick.
fn place_least_entropy(grid: &mut Grid, pick: usize) -> Option<Point> {
    let p = grid.find_least_entropy_cell()?;
    let candidates = grid.valid_patterns(p);
    if candidates.is_empty() {
        return None;
    }
    let uid = candidates[pick % candidates.len()].uid;
    grid.place(p, uid);
    grid.update_entropy(p);
    Some(p)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn entropy_stays_consistent_through_a_generation(
        width in 2usize..6,
        height in 2usize..6,
        seed in 0u64..200,
    ) {
        let catalog = Arc::new(Catalog::from_json(FOREST).unwrap());
        let grid = Grid::new(catalog, Rect::new(width, height));
        let mut wfc = Wfc::new(
            grid,
            Box::new(RandomJudge::new(seed, 0.1)),
            Box::new(RandomAdvisor::new(seed)),
        );

        let budget = width * height * 8 + 16;
        for _ in 0..budget {
            let result = wfc.step();
            assert_entropy_consistency(wfc.grid());
            if !result.success
                || result.outcome == Some(Outcome::Collapsed)
                || wfc.grid().is_collapsed()
            {
                break;
            }
        }
    }

    #[test]
    fn generations_are_deterministic_per_seed(
        width in 2usize..5,
        height in 2usize..5,
        seed in 0u64..200,
    ) {
        let run = || {
            let catalog = Arc::new(Catalog::from_json(FOREST).unwrap());
            let grid = Grid::new(catalog, Rect::new(width, height));
            let mut wfc = Wfc::new(
                grid,
                Box::new(RandomJudge::new(seed, 0.15)),
                Box::new(RandomAdvisor::new(seed)),
            );
            let succeeded = wfc.generate();
            (succeeded, wfc.grid().uids())
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn lifo_resets_restore_the_captured_state(
        width in 2usize..6,
        height in 2usize..6,
        warmup in 0usize..3,
        undo in 1usize..4,
        pick in 0usize..7,
    ) {
        let mut grid = Grid::new(open_catalog(3), Rect::new(width, height));
        for _ in 0..warmup {
            place_least_entropy(&mut grid, pick);
        }
        let uids_before = grid.uids();
        let entropy_before = grid.entropy().clone();

        let mut placed = Vec::new();
        for offset in 0..undo {
            match place_least_entropy(&mut grid, pick + offset) {
                Some(point) => placed.push(point),
                None => break,
            }
        }
        for point in placed.into_iter().rev() {
            grid.reset(point);
        }

        prop_assert_eq!(grid.uids(), uids_before);
        prop_assert_eq!(grid.entropy(), &entropy_before);
        assert_entropy_consistency(&grid);
    }
}
