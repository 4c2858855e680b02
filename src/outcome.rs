use crate::Point;

/// The closed set of ways a single step can end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No empty cell remains; terminal success.
    Collapsed,
    /// The selected cell has no valid pattern.
    ZeroChoice,
    /// A placement left some empty cell with zero valid patterns.
    ZeroEntropy,
    /// The advisor failed to pick a candidate.
    JudgeError,
    /// The judge decided to stop; terminal failure.
    JudgeStopped,
    /// The rollback budget is spent; terminal failure.
    RollbackLimitExceeded,
}

impl Outcome {
    /// Whether this outcome ends a generation successfully.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Collapsed)
    }

    /// Whether a judge-ordered rollback may still rescue the generation.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::ZeroChoice | Self::ZeroEntropy)
    }
}

/// What one call to [`Wfc::step`](crate::Wfc::step) did.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    /// True when the step advanced the search (placement or rollback).
    pub success: bool,
    /// The cell the step acted on, if any.
    pub chosen_point: Option<Point>,
    /// The uid placed by the step, if a placement happened.
    pub chosen_pattern: Option<u32>,
    /// Terminal or failure classification, when the step produced one.
    pub outcome: Option<Outcome>,
    /// The cell a failure was detected at, if any.
    pub failed_point: Option<Point>,
    /// Number of placements undone, when the step was a rollback.
    pub rolled_back: usize,
}

impl StepResult {
    pub(crate) fn failure(outcome: Outcome) -> Self {
        Self {
            outcome: Some(outcome),
            ..Self::default()
        }
    }
}
