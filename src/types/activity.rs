use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of bookmarks created on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub date: NaiveDate,
    pub count: usize,
    /// Tooltip text, e.g. `2024-05-01 - 3 bookmarks`.
    pub label: String,
}
