use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporting for a generation: position tracks net placements,
/// the message tracks rollbacks.
pub struct WfcProgress {
    bar: ProgressBar,
    rollbacks: usize,
}

impl WfcProgress {
    /// Create a bar sized to the number of cells to collapse.
    pub fn new(cells_to_collapse: usize) -> Self {
        let bar = ProgressBar::new(cells_to_collapse as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} cells (rolled back: {msg})",
            )
            .unwrap()
            .progress_chars("##-"),
        );
        bar.set_message("0");
        Self { bar, rollbacks: 0 }
    }

    /// One placement done.
    pub fn increment(&self) {
        self.bar.inc(1);
    }

    /// `undone` placements were rolled back.
    pub fn record_rollbacks(&mut self, undone: usize) {
        self.rollbacks += undone;
        let position = self.bar.position().saturating_sub(undone as u64);
        self.bar.set_position(position);
        self.bar.set_message(self.rollbacks.to_string());
    }

    /// Total rollbacks recorded so far.
    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    /// Finish and clear the display.
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}
