//! Unit tests for the per-day bookmark activity series.

use chrono::{NaiveDate, TimeZone, Utc};

use repomark::services::activity::bookmark_activity;
use repomark::types::bookmark::BookmarkRecord;

fn bookmarked(id: u32, y: i32, m: u32, d: u32, h: u32) -> BookmarkRecord {
    BookmarkRecord::from_document(
        id.to_string(),
        format!("r{}", id),
        format!("o/r{}", id),
        format!("https://github.com/o/r{}", id),
        None,
        None,
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
    )
}

#[test]
fn test_empty_list() {
    assert!(bookmark_activity(&[]).is_empty());
}

#[test]
fn test_groups_by_day_sorted_ascending() {
    let records = vec![
        bookmarked(1, 2024, 5, 3, 9),
        bookmarked(2, 2024, 5, 1, 23),
        bookmarked(3, 2024, 5, 3, 0),
        bookmarked(4, 2023, 12, 31, 12),
    ];

    let points = bookmark_activity(&records);
    let days: Vec<(NaiveDate, usize)> = points.iter().map(|p| (p.date, p.count)).collect();
    assert_eq!(
        days,
        vec![
            (NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(), 1),
            (NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1),
            (NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(), 2),
        ]
    );
}

#[test]
fn test_labels_pluralize() {
    let records = vec![
        bookmarked(1, 2024, 1, 1, 1),
        bookmarked(2, 2024, 1, 2, 1),
        bookmarked(3, 2024, 1, 2, 2),
    ];
    let labels: Vec<String> = bookmark_activity(&records).into_iter().map(|p| p.label).collect();
    assert_eq!(labels, vec!["2024-01-01 - 1 bookmark", "2024-01-02 - 2 bookmarks"]);
}

#[test]
fn test_serializes_date_as_iso_day() {
    let points = bookmark_activity(&[bookmarked(1, 2024, 2, 29, 10)]);
    let json = serde_json::to_value(&points[0]).unwrap();
    assert_eq!(json["date"], "2024-02-29");
    assert_eq!(json["count"], 1);
}
