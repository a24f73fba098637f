use crate::types::SessionRecord;

/// Inclusive bounds of the week labels present in `records`.
///
/// Returns `None` when no record carries a week.
pub fn selectable_range(records: &[SessionRecord]) -> Option<(i64, i64)> {
    let mut weeks = records.iter().filter_map(|r| r.week);
    let first = weeks.next()?;
    Some(weeks.fold((first, first), |(lo, hi), w| (lo.min(w), hi.max(w))))
}

/// Keep the records whose week lies in `[low, high]`.
///
/// Bounds are clamped into the selectable range and an inverted pair is
/// swapped. Records without a week never pass.
pub fn filter(records: &[SessionRecord], low: i64, high: i64) -> Vec<SessionRecord> {
    let Some((min_week, max_week)) = selectable_range(records) else {
        return Vec::new();
    };
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let low = low.clamp(min_week, max_week);
    let high = high.clamp(min_week, max_week);
    records
        .iter()
        .filter(|r| matches!(r.week, Some(w) if (low..=high).contains(&w)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(week: Option<i64>) -> SessionRecord {
        SessionRecord {
            date: None,
            month: None,
            week,
            sessions: Some(1.0),
            week_txns: Some(1.0),
        }
    }

    #[test]
    fn range_ignores_missing_and_order() {
        let a = vec![rec(Some(5)), rec(None), rec(Some(2)), rec(Some(9)), rec(Some(2))];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(selectable_range(&a), Some((2, 9)));
        assert_eq!(selectable_range(&b), Some((2, 9)));
        assert_eq!(selectable_range(&[rec(None)]), None);
        assert_eq!(selectable_range(&[]), None);
    }

    #[test]
    fn filter_is_inclusive_and_idempotent() {
        let rows: Vec<_> = (1..=6).map(|w| rec(Some(w))).chain([rec(None)]).collect();
        let once = filter(&rows, 2, 4);
        let weeks: Vec<_> = once.iter().filter_map(|r| r.week).collect();
        assert_eq!(weeks, vec![2, 3, 4]);
        assert_eq!(once.len(), 3);
        assert_eq!(filter(&once, 2, 4), once);
    }

    #[test]
    fn filter_clamps_and_swaps_bounds() {
        let rows: Vec<_> = (3..=5).map(|w| rec(Some(w))).collect();
        assert_eq!(filter(&rows, -10, 100).len(), 3);
        assert_eq!(filter(&rows, 4, 3).len(), 2);
        assert!(filter(&[rec(None)], 0, 10).is_empty());
    }
}
