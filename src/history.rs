use crate::{Grid, Point, StepResult};

/// What a snapshot records: a placement or an undo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionType {
    /// A pattern was placed (or a placement was attempted and failed).
    Place,
    /// One or more placements were undone.
    Rollback,
}

/// Per-cell state captured by a full grid snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellState {
    /// Entropy at capture time.
    pub entropy: usize,
    /// Walkability of the collapsed pattern, `None` for empty cells.
    pub is_walkable: Option<bool>,
    /// Uid of the collapsed pattern, `None` for empty cells.
    pub pattern_uid: Option<u32>,
}

/// A full copy of the grid at one moment, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridState {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// One entry per cell, row-major.
    pub cells: Vec<CellState>,
}

impl GridState {
    /// Capture `grid` as it stands.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let (height, width) = grid.size();
        let mut cells = Vec::with_capacity(width * height);
        for x in 0..height {
            for y in 0..width {
                let p = Point::new(x, y);
                let pattern = grid.pattern_at(p);
                cells.push(CellState {
                    entropy: grid.entropy_at(p),
                    is_walkable: pattern.map(|q| q.is_walkable),
                    pattern_uid: pattern.map(|q| q.uid),
                });
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }
}

/// One immutable history entry, taken after a step ran.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Position in the full log, starting at zero.
    pub step_number: usize,
    /// Whether the step placed or rolled back.
    pub action_type: ActionType,
    /// The cell the step acted on.
    pub action_point: Point,
    /// Full grid copy, present only when the history keeps grid states.
    pub grid_state: Option<GridState>,
    /// Uids that were candidates at the chosen cell.
    pub possible_pattern_uids: Vec<u32>,
    /// Uid the step placed, if any.
    pub chosen_pattern_uid: Option<u32>,
    /// Walkability of the placed pattern, if any.
    pub chosen_is_walkable: Option<bool>,
}

/// The reversible step log of one generation.
///
/// Two sequences share appends but are consumed differently: the full log
/// is never shrunk by rollback, while the rollback stack pops one entry per
/// undone placement. Only snapshots that actually placed a pattern enter
/// the stack, so popping always undoes a real placement.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<Snapshot>,
    rollback: Vec<Snapshot>,
    keep_grid_states: bool,
}

impl History {
    /// A history recording compact snapshots (no per-cell grid copies).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A history that additionally captures the full grid in each snapshot.
    /// Feature extraction needs it; plain generation does not, and the
    /// copies are quadratic in the grid area.
    #[must_use]
    pub fn with_grid_states() -> Self {
        Self {
            keep_grid_states: true,
            ..Self::default()
        }
    }

    /// Number of entries in the full log.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.snapshots.len()
    }

    /// The full log, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// True when at least one placement could be rolled back.
    #[must_use]
    pub fn has_rollback_snapshots(&self) -> bool {
        !self.rollback.is_empty()
    }

    /// Append a snapshot of the post-step grid. Steps without a chosen
    /// point (terminal outcomes) are not recorded.
    pub fn add_step(
        &mut self,
        step: &StepResult,
        grid: &Grid,
        action_type: ActionType,
        possible_patterns: &[u32],
    ) {
        let Some(point) = step.chosen_point else {
            return;
        };
        let chosen_is_walkable = step
            .chosen_pattern
            .and_then(|uid| grid.catalog().by_uid(uid))
            .map(|pattern| pattern.is_walkable);
        let snapshot = Snapshot {
            step_number: self.snapshots.len(),
            action_type,
            action_point: point,
            grid_state: self.keep_grid_states.then(|| GridState::from_grid(grid)),
            possible_pattern_uids: possible_patterns.to_vec(),
            chosen_pattern_uid: step.chosen_pattern,
            chosen_is_walkable,
        };
        if action_type == ActionType::Place && step.chosen_pattern.is_some() {
            self.rollback.push(snapshot.clone());
        }
        self.snapshots.push(snapshot);
    }

    /// The most recent undoable placement, without consuming it.
    #[must_use]
    pub fn last_rollback_snapshot(&self) -> Option<&Snapshot> {
        self.rollback.last()
    }

    /// Pop the most recent undoable placement from the rollback stack. The
    /// full log keeps its copy.
    pub fn pop_rollback_snapshot(&mut self) -> Option<Snapshot> {
        self.rollback.pop()
    }

    /// Drop both sequences.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.rollback.clear();
    }
}
