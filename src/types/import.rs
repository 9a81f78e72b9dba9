use std::fmt;

use serde::{Deserialize, Serialize};

/// Running or final totals of one CSV import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    /// True when the run stopped early because it was cancelled.
    pub cancelled: bool,
}

impl ImportSummary {
    /// Message shown while later batches are still pending.
    pub fn progress_message(&self) -> String {
        format!("{} imported, {} skipped so far...", self.imported, self.skipped)
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} imported, {} skipped", self.imported, self.skipped)?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Notification emitted by the importer while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportEvent {
    /// Emitted once after every processed batch.
    Progress {
        processed: usize,
        total: usize,
        summary: ImportSummary,
        message: String,
    },
    /// Emitted once when the run ends, including after cancellation.
    Finished {
        summary: ImportSummary,
        message: String,
    },
}

/// UI-facing state of the importer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterStatus {
    pub importing: bool,
    /// File currently being imported; cleared when the run ends.
    pub selected_file: Option<String>,
    pub summary: Option<String>,
    pub error: Option<String>,
}
