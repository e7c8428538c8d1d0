//! Tests for state module

use super::*;
use serde_json::json;

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert_eq!(state.phase, Phase::Ready);
    assert!(state.position.is_empty());
    assert!(state.cursor.is_none());
    assert_eq!(state.pages, 0);
    assert!(!state.is_exhausted());
}

#[test]
fn test_pagination_state_transitions_return_new_values() {
    let start = PaginationState::at_position(vec![0, 0]);
    let fetching = start.fetching();
    assert_eq!(start.phase, Phase::Ready);
    assert_eq!(fetching.phase, Phase::Fetching);

    let next = fetching.with_page(10).with_position(vec![0, 1]);
    assert_eq!(next.phase, Phase::Ready);
    assert_eq!(next.position, vec![0, 1]);
    assert_eq!(next.pages, 1);
    assert_eq!(next.total_fetched, 10);
    assert_eq!(fetching.position, vec![0, 0]);
}

#[test]
fn test_exhausted_is_monotone() {
    let done = PaginationState::at_position(vec![3]).exhausted();
    assert!(done.is_exhausted());
    assert!(done.fetching().is_exhausted());
    assert!(done.with_position(vec![4]).is_exhausted());
    assert!(done.with_cursor("2024-01-01").is_exhausted());
    assert!(done.with_next_url("http://x").is_exhausted());
    assert_eq!(done.with_position(vec![4]).position, vec![3]);
}

// ============================================================================
// CursorValue Tests
// ============================================================================

#[test]
fn test_cursor_value_numeric_ordering() {
    let nine = CursorValue::parse("9");
    let ten = CursorValue::parse("10");
    assert_eq!(nine, CursorValue::Integer(9));
    assert_eq!(ten.compare(&nine), std::cmp::Ordering::Greater);
}

#[test]
fn test_cursor_value_text_ordering() {
    let a = CursorValue::parse("2024-01-01 00:00:00");
    let b = CursorValue::parse("2024-03-05 12:00:00");
    assert_eq!(a.compare(&b), std::cmp::Ordering::Less);
    assert_eq!(b.to_string(), "2024-03-05 12:00:00");
}

#[test]
fn test_cursor_value_from_json() {
    assert_eq!(CursorValue::from_json(&json!(42)), Some(CursorValue::Integer(42)));
    assert_eq!(
        CursorValue::from_json(&json!("abc")),
        Some(CursorValue::Text("abc".into()))
    );
    assert_eq!(CursorValue::from_json(&json!("")), None);
    assert_eq!(CursorValue::from_json(&json!(null)), None);
    assert_eq!(CursorValue::from_json(&json!({"a": 1})), None);
}

// ============================================================================
// CursorTracker Tests
// ============================================================================

#[test]
fn test_tracker_advances_monotonically() {
    let mut tracker = CursorTracker::new(&IncrementalCursor::new("systemdatum", "2024-01-01"));

    assert_eq!(
        tracker.observe(&json!({"systemdatum": "2024-02-01 10:00:00"})),
        CursorCheck::Fresh
    );
    assert_eq!(tracker.current_value().to_string(), "2024-02-01 10:00:00");

    // Older (but still after the seed) does not move the cursor back
    assert_eq!(
        tracker.observe(&json!({"systemdatum": "2024-01-15 00:00:00"})),
        CursorCheck::Fresh
    );
    assert_eq!(tracker.current_value().to_string(), "2024-02-01 10:00:00");
}

#[test]
fn test_tracker_filters_records_before_seed() {
    let mut tracker = CursorTracker::new(&IncrementalCursor::new("systemnyckel", "100"));
    let check = tracker.observe(&json!({"systemnyckel": "99"}));
    assert_eq!(check, CursorCheck::Seen);
    assert!(!check.should_emit());
    assert_eq!(tracker.seen_count(), 1);

    assert_eq!(tracker.observe(&json!({"systemnyckel": "100"})), CursorCheck::Fresh);
    assert_eq!(tracker.observe(&json!({"systemnyckel": 150})), CursorCheck::Fresh);
    assert_eq!(tracker.current_value(), &CursorValue::Integer(150));
}

#[test]
fn test_tracker_unreadable_records_emit_without_advancing() {
    let mut tracker = CursorTracker::new(&IncrementalCursor::new("meta.updated", "0"));
    let check = tracker.observe(&json!({"meta": {}}));
    assert_eq!(check, CursorCheck::Unreadable);
    assert!(check.should_emit());
    assert_eq!(tracker.unreadable_count(), 1);
    assert_eq!(tracker.current_value(), &CursorValue::Integer(0));

    assert_eq!(tracker.observe(&json!({"meta": {"updated": 7}})), CursorCheck::Fresh);
    assert_eq!(tracker.current_value(), &CursorValue::Integer(7));
}

#[test]
fn test_tracker_resume_from_prior_value() {
    let cursor = IncrementalCursor::new("datum", "2025-01-01");
    let tracker = CursorTracker::resume_from(&cursor, Some("2025-06-01"));
    assert_eq!(tracker.start_value().to_string(), "2025-06-01");
    assert_eq!(tracker.path(), "datum");

    let tracker = CursorTracker::resume_from(&cursor, None);
    assert_eq!(tracker.start_value().to_string(), "2025-01-01");
}
