use crate::config::DashboardConfig;
use crate::types::{
    AggregatedGroup, DailyRow, GroupKey, RecordRatio, RecordRow, SessionRecord, SessionTable,
    SummaryStats, WeeklyRow,
};
use std::collections::BTreeSet;

pub fn weekly_report(groups: &[AggregatedGroup]) -> Vec<WeeklyRow> {
    groups
        .iter()
        .filter_map(|g| match g.key {
            GroupKey::Week(week) => Some(WeeklyRow {
                week,
                sum_session: g.sum,
                avg_week_txn: g.mean,
                contact_ratio: g.contact_ratio,
                week_str: week.to_string(),
            }),
            GroupKey::Date(_) => None,
        })
        .collect()
}

pub fn daily_report(groups: &[AggregatedGroup]) -> Vec<DailyRow> {
    groups
        .iter()
        .map(|g| DailyRow {
            date: g.key.to_string(),
            sum_session: g.sum,
            avg_week_txn: g.mean,
            contact_ratio: g.contact_ratio,
        })
        .collect()
}

pub fn record_report(ratios: &[RecordRatio]) -> Vec<RecordRow> {
    ratios
        .iter()
        .map(|r| RecordRow {
            date: r.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            week: r.week.map(|w| w.to_string()).unwrap_or_default(),
            sessions: r.sessions,
            week_txns: r.week_txns,
            contact_ratio: r.contact_ratio,
        })
        .collect()
}

/// Points for the line chart: x label and contact ratio.
pub fn chart_points(groups: &[AggregatedGroup]) -> Vec<(String, Option<f64>)> {
    groups.iter().map(|g| (g.key.to_string(), g.contact_ratio)).collect()
}

pub fn record_chart_points(ratios: &[RecordRatio]) -> Vec<(String, Option<f64>)> {
    ratios
        .iter()
        .map(|r| {
            let label = match (r.date, r.week) {
                (Some(d), _) => d.format("%Y-%m-%d").to_string(),
                (None, Some(w)) => w.to_string(),
                (None, None) => "?".to_string(),
            };
            (label, r.contact_ratio)
        })
        .collect()
}

pub fn generate_summary(
    cfg: &DashboardConfig,
    table: &SessionTable,
    selected: Option<(i64, i64)>,
    filtered: &[SessionRecord],
    weekly_groups: usize,
    daily_groups: usize,
) -> SummaryStats {
    let bounds = crate::range::selectable_range(&table.records);
    let months: BTreeSet<i64> = filtered.iter().filter_map(|r| r.month).collect();
    SummaryStats {
        variant: cfg.variant.name().to_string(),
        source: table.source.display().to_string(),
        data_min_week: bounds.map(|b| b.0),
        data_max_week: bounds.map(|b| b.1),
        selected_low: selected.map(|s| s.0),
        selected_high: selected.map(|s| s.1),
        filtered_rows: filtered.len(),
        months_covered: months.into_iter().collect(),
        weekly_groups,
        daily_groups,
        total_sessions: filtered.iter().filter_map(|r| r.sessions).sum(),
        missing_cells: table.report.missing_cells.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::types::LoadReport;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn group(key: GroupKey, sum: f64, mean: Option<f64>) -> AggregatedGroup {
        AggregatedGroup {
            key,
            sum,
            mean,
            contact_ratio: crate::aggregate::contact_ratio(Some(sum), mean),
        }
    }

    #[test]
    fn weekly_rows_use_integer_labels() {
        let rows = weekly_report(&[group(GroupKey::Week(12), 30.0, Some(1000.0))]);
        assert_eq!(rows[0].week_str, "12");
        assert_eq!(rows[0].contact_ratio, Some(30_000.0));
    }

    #[test]
    fn daily_rows_render_iso_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let rows = daily_report(&[group(GroupKey::Date(d), 1.0, None)]);
        assert_eq!(rows[0].date, "2024-07-04");
        assert_eq!(rows[0].contact_ratio, None);
    }

    #[test]
    fn summary_counts_selection() {
        let rec = |week, sessions| SessionRecord {
            date: None,
            month: Some(week / 4 + 1),
            week: Some(week),
            sessions,
            week_txns: Some(1.0),
        };
        let table = SessionTable {
            source: PathBuf::from("data.csv"),
            records: vec![rec(1, Some(2.0)), rec(4, Some(3.0)), rec(9, None)],
            report: LoadReport::default(),
        };
        let filtered = crate::range::filter(&table.records, 4, 9);
        let cfg = DashboardConfig::preset(Variant::WeeklyDaily);
        let s = generate_summary(&cfg, &table, Some((4, 9)), &filtered, 2, 0);
        assert_eq!(s.variant, "weekly-daily");
        assert_eq!(s.data_min_week, Some(1));
        assert_eq!(s.data_max_week, Some(9));
        assert_eq!(s.filtered_rows, 2);
        assert_eq!(s.total_sessions, 3.0);
        assert_eq!(s.months_covered, vec![2, 3]);
    }
}
