//! Group-by reduction and the contact ratio metric.
//!
//! One generic pass serves every dashboard view: the caller names the key,
//! the summed column, the averaged column and the output order.

use crate::config::SortOrder;
use crate::types::{AggregatedGroup, GroupKey, RecordRatio, SessionRecord};
use std::collections::BTreeMap;

/// Sessions per million transactions.
pub const CONTACT_RATIO_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Week,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Sessions,
    WeekTxns,
}

impl Measure {
    fn of(self, r: &SessionRecord) -> Option<f64> {
        match self {
            Measure::Sessions => r.sessions,
            Measure::WeekTxns => r.week_txns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSpec {
    pub group_by: GroupBy,
    pub sum_field: Measure,
    pub mean_field: Measure,
    pub order: SortOrder,
}

impl AggregationSpec {
    /// Sum of sessions and mean of weekly transactions, keyed by `group_by`.
    pub fn contact_ratio(group_by: GroupBy, order: SortOrder) -> Self {
        Self {
            group_by,
            sum_field: Measure::Sessions,
            mean_field: Measure::WeekTxns,
            order,
        }
    }
}

fn key_of(r: &SessionRecord, by: GroupBy) -> Option<GroupKey> {
    match by {
        GroupBy::Week => r.week.map(GroupKey::Week),
        GroupBy::Date => r.date.map(GroupKey::Date),
    }
}

#[derive(Default)]
struct Acc {
    sum: f64,
    mean_total: f64,
    mean_count: usize,
}

/// `1_000_000 * sum / mean`.
///
/// A missing operand gives `None`. Zero `mean` gives an infinity with the
/// sign of `sum`; `0 / 0` is reported as missing.
pub fn contact_ratio(sum: Option<f64>, mean: Option<f64>) -> Option<f64> {
    let v = CONTACT_RATIO_SCALE * sum? / mean?;
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

/// Reduce `records` into one group per key.
///
/// Rows without a key are dropped. The sum skips missing values, so a group
/// whose values are all missing sums to 0. The mean only counts present
/// values and is `None` when there are none.
pub fn aggregate(records: &[SessionRecord], spec: &AggregationSpec) -> Vec<AggregatedGroup> {
    let mut groups: BTreeMap<GroupKey, Acc> = BTreeMap::new();
    for r in records {
        let Some(key) = key_of(r, spec.group_by) else {
            continue;
        };
        let acc = groups.entry(key).or_default();
        if let Some(v) = spec.sum_field.of(r) {
            acc.sum += v;
        }
        if let Some(v) = spec.mean_field.of(r) {
            acc.mean_total += v;
            acc.mean_count += 1;
        }
    }

    let rows = groups.into_iter().map(|(key, acc)| {
        let mean = (acc.mean_count > 0).then(|| acc.mean_total / acc.mean_count as f64);
        AggregatedGroup {
            key,
            sum: acc.sum,
            mean,
            contact_ratio: contact_ratio(Some(acc.sum), mean),
        }
    });
    match spec.order {
        SortOrder::Ascending => rows.collect(),
        SortOrder::Descending => rows.rev().collect(),
    }
}

/// Contact ratio per record, without grouping.
///
/// Used when each row already carries its own summed sessions and averaged
/// transactions. Rows are ordered by week, then date.
pub fn record_ratios(records: &[SessionRecord], order: SortOrder) -> Vec<RecordRatio> {
    let mut out: Vec<RecordRatio> = records
        .iter()
        .map(|r| RecordRatio {
            date: r.date,
            week: r.week,
            sessions: r.sessions,
            week_txns: r.week_txns,
            contact_ratio: contact_ratio(r.sessions, r.week_txns),
        })
        .collect();
    out.sort_by(|a, b| {
        let ord = a.week.cmp(&b.week).then_with(|| a.date.cmp(&b.date));
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
    out
}
