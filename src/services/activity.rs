// repomark bookmarking activity
// Turns a bookmark list into a per-day series for the activity chart.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::activity::ActivityPoint;
use crate::types::bookmark::BookmarkRecord;

/// Counts bookmarks per UTC calendar day, oldest day first.
pub fn bookmark_activity(bookmarks: &[BookmarkRecord]) -> Vec<ActivityPoint> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for bookmark in bookmarks {
        *per_day.entry(bookmark.bookmarked_at.date_naive()).or_insert(0) += 1;
    }

    per_day
        .into_iter()
        .map(|(date, count)| ActivityPoint {
            date,
            count,
            label: format!(
                "{} - {} bookmark{}",
                date.format("%Y-%m-%d"),
                count,
                if count == 1 { "" } else { "s" }
            ),
        })
        .collect()
}
