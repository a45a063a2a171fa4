//! Terminal rendering adapter for scan progress.
//!
//! Presentation only: the scan-state machine knows nothing about this.
//! The stability bar and countdown stand in for the scan-circle overlay
//! of the original operator UI.

use facegate_core::ScanProgress;
use facegate_engine::ScanObserver;
use std::io::Write;

pub struct TermProgress {
    active: bool,
}

impl TermProgress {
    pub fn new() -> Self {
        Self { active: false }
    }

    /// Terminate the status line once the scan is over.
    pub fn finish(&mut self) {
        if self.active {
            eprintln!();
            self.active = false;
        }
    }
}

impl ScanObserver for TermProgress {
    fn on_progress(&mut self, progress: &ScanProgress) {
        let filled = progress.consecutive.min(progress.required) as usize;
        let empty = (progress.required as usize).saturating_sub(filled);
        let bar: String = "#".repeat(filled) + &".".repeat(empty);
        let remaining = progress.remaining().as_secs();

        eprint!("\rscanning [{bar}] hold steady ({remaining}s left)   ");
        let _ = std::io::stderr().flush();
        self.active = true;
    }
}
