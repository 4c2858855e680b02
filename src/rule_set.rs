use std::collections::BTreeSet;

use crate::Direction;

/// Per-direction allowed-neighbour sets for one pattern.
///
/// Neighbours are referred to by uid rather than by reference, so mutually
/// referencing patterns stay plain data; resolution goes through the
/// [`Catalog`](crate::Catalog).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    allowed: [BTreeSet<u32>; 4],
}

impl RuleSet {
    /// An empty rule set: nothing is allowed anywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from explicit per-direction uid sets.
    #[must_use]
    pub fn from_sets(
        up: BTreeSet<u32>,
        down: BTreeSet<u32>,
        left: BTreeSet<u32>,
        right: BTreeSet<u32>,
    ) -> Self {
        Self {
            allowed: [up, down, left, right],
        }
    }

    /// The uids allowed next to this pattern in `direction`.
    #[must_use]
    pub fn allowed(&self, direction: Direction) -> &BTreeSet<u32> {
        &self.allowed[direction.index()]
    }

    /// Whether `uid` may sit next to this pattern in `direction`.
    #[must_use]
    pub fn allows(&self, direction: Direction, uid: u32) -> bool {
        self.allowed[direction.index()].contains(&uid)
    }

    /// Allow `uid` next to this pattern in `direction`.
    pub fn insert(&mut self, direction: Direction, uid: u32) {
        self.allowed[direction.index()].insert(uid);
    }

    /// Total number of adjacency entries across all directions.
    #[must_use]
    pub fn num_rules(&self) -> usize {
        self.allowed.iter().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ALL_DIRECTIONS;

    #[test]
    fn insert_and_query() {
        let mut rules = RuleSet::new();
        rules.insert(Direction::Up, 3);
        rules.insert(Direction::Up, 5);
        rules.insert(Direction::Left, 3);

        assert!(rules.allows(Direction::Up, 3));
        assert!(rules.allows(Direction::Up, 5));
        assert!(!rules.allows(Direction::Down, 3));
        assert_eq!(rules.num_rules(), 3);
    }

    #[test]
    fn directions_are_independent() {
        let mut rules = RuleSet::new();
        rules.insert(Direction::Right, 1);
        for dir in ALL_DIRECTIONS {
            assert_eq!(rules.allows(dir, 1), dir == Direction::Right);
        }
    }
}
