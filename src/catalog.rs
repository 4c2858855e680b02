use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::{ALL_DIRECTIONS, Direction, MetaPattern};

/// Reserved text rule that expands to the whole palette.
pub const RULE_ALL: &str = "all";

/// One bidirectional-consistency violation: `pattern` allows `neighbour` in
/// `direction`, but `neighbour` does not allow `pattern` back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// The pattern whose rule is one-sided.
    pub pattern_uid: u32,
    /// The neighbour that fails to reciprocate.
    pub neighbour_uid: u32,
    /// The direction of the one-sided rule, as seen from the pattern.
    pub direction: Direction,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "pattern {} allows {} {}wards, but not the reverse",
            self.pattern_uid, self.neighbour_uid, self.direction
        )
    }
}

/// Outcome of the catalog consistency check. Advisory: an asymmetric
/// catalog still loads, so callers may inspect the violations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every violating `(pattern, neighbour, direction)` triple.
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// True when the palette is symmetric under `opposite(direction)`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.is_ok() {
            return write!(f, "Validation result: success");
        }
        writeln!(f, "Validation result: fail ({} errors)", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}

/// The immutable palette of one generation session: every [`MetaPattern`]
/// available, indexed for uid, tag and text-rule lookup.
#[derive(Clone, Debug)]
pub struct Catalog {
    patterns: Vec<MetaPattern>,
    index: HashMap<u32, usize>,
    report: ValidationReport,
}

impl Catalog {
    /// Build a catalog over `patterns` and run the consistency check.
    ///
    /// The validation report is retained (see [`Self::validation`]);
    /// asymmetries never abort construction.
    #[must_use]
    pub fn new(patterns: Vec<MetaPattern>) -> Self {
        let mut index = HashMap::with_capacity(patterns.len());
        for (position, pattern) in patterns.iter().enumerate() {
            let previous = index.insert(pattern.uid, position);
            debug_assert!(previous.is_none(), "Duplicate pattern uid {}", pattern.uid);
        }
        let report = validate(&patterns, &index);
        Self {
            patterns,
            index,
            report,
        }
    }

    /// Number of patterns in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when the palette is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Every pattern, in registration order.
    #[must_use]
    pub fn all(&self) -> &[MetaPattern] {
        &self.patterns
    }

    /// Look a pattern up by uid.
    #[must_use]
    pub fn by_uid(&self, uid: u32) -> Option<&MetaPattern> {
        self.index.get(&uid).map(|&position| &self.patterns[position])
    }

    /// The dense palette position of `uid`, if registered.
    #[must_use]
    pub fn position(&self, uid: u32) -> Option<usize> {
        self.index.get(&uid).copied()
    }

    /// Every pattern carrying `tag`. Warns when nothing matches.
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<&MetaPattern> {
        let matches: Vec<&MetaPattern> = self
            .patterns
            .iter()
            .filter(|pattern| pattern.tags.contains(tag))
            .collect();
        if matches.is_empty() {
            log::warn!("zero patterns with tag: {tag}");
        }
        matches
    }

    /// Resolve a text rule: the reserved word [`RULE_ALL`] expands to the
    /// whole palette, any other string is a tag.
    #[must_use]
    pub fn resolve_text_rule(&self, text: &str) -> Vec<&MetaPattern> {
        if text == RULE_ALL {
            self.patterns.iter().collect()
        } else {
            self.by_tag(text)
        }
    }

    /// The consistency report computed at construction time.
    #[must_use]
    pub fn validation(&self) -> &ValidationReport {
        &self.report
    }
}

fn validate(patterns: &[MetaPattern], index: &HashMap<u32, usize>) -> ValidationReport {
    let mut errors = Vec::new();
    for pattern in patterns {
        for direction in ALL_DIRECTIONS {
            for &neighbour_uid in pattern.rules.allowed(direction) {
                let reciprocated = index
                    .get(&neighbour_uid)
                    .map(|&position| &patterns[position])
                    .is_some_and(|neighbour| {
                        neighbour.rules.allows(direction.opposite(), pattern.uid)
                    });
                if !reciprocated {
                    errors.push(ValidationError {
                        pattern_uid: pattern.uid,
                        neighbour_uid,
                        direction,
                    });
                }
            }
        }
    }
    ValidationReport { errors }
}
