use crate::progress::WfcProgress;
use crate::{ActionType, Advisor, Decision, Grid, History, Judge, Outcome, StepResult};

/// The collapse loop: selects cells, consults the advisor and judge,
/// records history, and enforces the rollback budget.
pub struct Wfc {
    grid: Grid,
    judge: Box<dyn Judge>,
    advisor: Box<dyn Advisor>,
    history: History,
    rollback_count: usize,
    max_rollbacks: Option<usize>,
    initialized: bool,
    last_step: Option<StepResult>,
}

impl Wfc {
    /// Construct an orchestrator over `grid`. The rollback budget defaults
    /// to `⌊√(width·height)⌋`; see [`Self::with_max_rollbacks`].
    #[must_use]
    pub fn new(grid: Grid, judge: Box<dyn Judge>, advisor: Box<dyn Advisor>) -> Self {
        let (height, width) = grid.size();
        Self {
            grid,
            judge,
            advisor,
            history: History::new(),
            rollback_count: 0,
            max_rollbacks: Some((width * height).isqrt()),
            initialized: false,
            last_step: None,
        }
    }

    /// Override the rollback budget; `None` disables the cap entirely.
    #[must_use]
    pub fn with_max_rollbacks(mut self, max_rollbacks: Option<usize>) -> Self {
        self.max_rollbacks = max_rollbacks;
        self
    }

    /// Swap in a differently configured history (e.g. one keeping full
    /// grid states).
    #[must_use]
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    /// The grid being generated.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The step log of the current generation.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Placements undone so far in the current generation.
    #[must_use]
    pub fn rollback_count(&self) -> usize {
        self.rollback_count
    }

    /// The most recent step's result, outcome included.
    #[must_use]
    pub fn last_step(&self) -> Option<&StepResult> {
        self.last_step.as_ref()
    }

    fn initialize(&mut self) {
        self.grid.initialize();
        self.history.clear();
        self.rollback_count = 0;
        self.last_step = None;
        self.initialized = true;
    }

    fn budget_spent(&self) -> bool {
        self.max_rollbacks
            .is_some_and(|max| self.rollback_count >= max)
    }

    /// Perform one unit of work: exactly one of budget check, judge
    /// arbitration, or placement.
    pub fn step(&mut self) -> StepResult {
        if !self.initialized {
            self.initialize();
        }
        let result = self.arbitrate();
        self.last_step = Some(result.clone());
        result
    }

    fn arbitrate(&mut self) -> StepResult {
        if self.budget_spent() {
            return StepResult::failure(Outcome::RollbackLimitExceeded);
        }
        if self.history.has_rollback_snapshots() {
            match self.judge.decide(&self.grid) {
                Decision::Stop { reason } => {
                    log::info!("judge stopped the generation: {reason}");
                    return StepResult::failure(Outcome::JudgeStopped);
                }
                Decision::Rollback { steps } => return self.rollback(steps),
                Decision::Continue => {}
            }
        }
        self.collapse_once()
    }

    /// Select, choose, place, propagate. Every path with a chosen point
    /// appends a PLACE snapshot before returning.
    fn collapse_once(&mut self) -> StepResult {
        let Some(point) = self.grid.find_least_entropy_cell() else {
            return StepResult {
                success: true,
                outcome: Some(Outcome::Collapsed),
                ..StepResult::default()
            };
        };

        let mut result = StepResult {
            chosen_point: Some(point),
            ..StepResult::default()
        };
        let candidates = self.grid.valid_patterns(point);
        let possible: Vec<u32> = candidates.iter().map(|pattern| pattern.uid).collect();

        if candidates.is_empty() {
            result.outcome = Some(Outcome::ZeroChoice);
            result.failed_point = Some(point);
            self.history
                .add_step(&result, &self.grid, ActionType::Place, &possible);
            return result;
        }

        let chosen = self
            .advisor
            .select(&candidates, &self.grid, point)
            .filter(|uid| possible.contains(uid));
        let Some(uid) = chosen else {
            result.outcome = Some(Outcome::JudgeError);
            result.failed_point = Some(point);
            self.history
                .add_step(&result, &self.grid, ActionType::Place, &possible);
            return result;
        };

        result.chosen_pattern = Some(uid);
        self.grid.place(point, uid);
        self.grid.update_entropy(point);

        if let Some(failed) = self.grid.zero_entropy_cell() {
            result.outcome = Some(Outcome::ZeroEntropy);
            result.failed_point = Some(failed);
            self.history
                .add_step(&result, &self.grid, ActionType::Place, &possible);
            return result;
        }

        result.success = true;
        self.history
            .add_step(&result, &self.grid, ActionType::Place, &possible);
        result
    }

    /// Undo up to `steps` placements, newest first, re-propagating after
    /// each. Applies the judge's tabu penalty and records one ROLLBACK
    /// snapshot for the whole batch.
    fn rollback(&mut self, steps: usize) -> StepResult {
        let penalty = self.judge.rollback_penalty();
        let mut undone = 0;
        let mut last_point = None;
        for _ in 0..steps {
            let Some(snapshot) = self.history.pop_rollback_snapshot() else {
                break;
            };
            let point = snapshot.action_point;
            if penalty > 0 {
                if let Some(uid) = snapshot.chosen_pattern_uid {
                    self.grid.ban(point, uid);
                }
            }
            self.grid.reset(point);
            undone += 1;
            last_point = Some(point);
        }
        self.rollback_count += undone;
        log::debug!(
            "rolled back {undone} placement(s), {} total this generation",
            self.rollback_count
        );

        let result = StepResult {
            success: true,
            chosen_point: last_point,
            rolled_back: undone,
            ..StepResult::default()
        };
        self.history
            .add_step(&result, &self.grid, ActionType::Rollback, &[]);
        result
    }

    /// After a recoverable failure, let the judge try a rescue. Returns
    /// true when a rollback happened and the generation should continue.
    fn try_rescue(&mut self, progress: &mut WfcProgress) -> bool {
        if !self.history.has_rollback_snapshots() {
            return false;
        }
        if self.budget_spent() {
            self.last_step = Some(StepResult::failure(Outcome::RollbackLimitExceeded));
            return false;
        }
        match self.judge.decide(&self.grid) {
            Decision::Rollback { steps } => {
                let result = self.rollback(steps);
                progress.record_rollbacks(result.rolled_back);
                self.last_step = Some(result);
                true
            }
            Decision::Stop { reason } => {
                log::info!("judge stopped the generation: {reason}");
                self.last_step = Some(StepResult::failure(Outcome::JudgeStopped));
                false
            }
            Decision::Continue => false,
        }
    }

    /// Run a full generation: reset grid and history, then step until the
    /// grid collapses, a failure sticks, or the rollback budget is spent.
    /// A `ZERO_CHOICE`/`ZERO_ENTROPY` failure only ends the run if the
    /// judge declines to roll back. Returns whether the grid collapsed.
    pub fn generate(&mut self) -> bool {
        self.initialize();
        let (height, width) = self.grid.size();
        let mut progress = WfcProgress::new(width * height);

        loop {
            if self.grid.is_collapsed() {
                break;
            }
            let result = self.step();
            if result.success {
                if result.chosen_pattern.is_some() {
                    progress.increment();
                }
                if result.rolled_back > 0 {
                    progress.record_rollbacks(result.rolled_back);
                }
                if result.outcome == Some(Outcome::Collapsed) {
                    break;
                }
                continue;
            }
            let recoverable = result
                .outcome
                .is_some_and(Outcome::is_recoverable);
            if !recoverable || !self.try_rescue(&mut progress) {
                break;
            }
        }

        progress.finish();
        self.grid.is_collapsed()
    }
}
