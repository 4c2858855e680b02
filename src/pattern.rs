use std::collections::BTreeSet;

use crate::{RuleSet, Weighted};

/// A single image variant of a [`MetaPattern`].
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    /// Path of the sprite, relative to the catalog's image folder.
    pub image_path: String,
    /// Relative frequency among the variants of one `MetaPattern`.
    pub weight: f32,
}

impl Pattern {
    /// Construct a new variant.
    #[must_use]
    pub fn new(image_path: impl Into<String>, weight: f32) -> Self {
        debug_assert!(weight >= 0.0, "Variant weight must not be negative");
        Self {
            image_path: image_path.into(),
            weight,
        }
    }
}

/// An atomic tile choice of the palette.
///
/// Adjacency rules are attached after construction (patterns may reference
/// each other), so `rules` starts empty and is filled by the catalog
/// builder.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaPattern {
    /// Unique non-negative identifier. `-1` is reserved on the wire for the
    /// empty cell and therefore never appears here.
    pub uid: u32,
    /// Human-readable name.
    pub name: String,
    /// Whether agents may stand on this tile.
    pub is_walkable: bool,
    /// Free-form labels used by text rules.
    pub tags: BTreeSet<String>,
    /// Relative frequency in generated grids. Strictly positive.
    pub weight: f32,
    /// Per-direction allowed-neighbour uids.
    pub rules: RuleSet,
    /// Image variants, in declaration order.
    pub patterns: Vec<Pattern>,
}

impl MetaPattern {
    /// Construct a pattern with no tags, variants or rules.
    #[must_use]
    pub fn new(uid: u32, name: impl Into<String>, weight: f32) -> Self {
        debug_assert!(weight > 0.0, "Pattern weight must be greater than zero");
        Self {
            uid,
            name: name.into(),
            is_walkable: false,
            tags: BTreeSet::new(),
            weight,
            rules: RuleSet::new(),
            patterns: Vec::new(),
        }
    }
}

impl Weighted for MetaPattern {
    fn weight(&self) -> f32 {
        self.weight
    }
}

impl Weighted for Pattern {
    fn weight(&self) -> f32 {
        self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    #[test]
    fn rules_attach_after_construction() {
        let mut pattern = MetaPattern::new(7, "floor", 2.0);
        assert_eq!(pattern.rules.num_rules(), 0);

        pattern.rules.insert(Direction::Up, 7);
        assert!(pattern.rules.allows(Direction::Up, 7));
    }
}
