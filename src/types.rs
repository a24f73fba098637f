use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tabled::Tabled;

use crate::util::display_value;

/// One day of observed activity for a reporting unit, after coercion.
///
/// Any cell that could not be coerced is `None`. Week and month are kept
/// exactly as labeled in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub date: Option<NaiveDate>,
    pub month: Option<i64>,
    pub week: Option<i64>,
    pub sessions: Option<f64>,
    pub week_txns: Option<f64>,
}

/// Diagnostics gathered while loading a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub unreadable_rows: usize,
    /// Rows whose week parsed as a number but not a whole week.
    pub fractional_weeks: usize,
    pub missing_cells: BTreeMap<String, usize>,
    pub absent_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SessionTable {
    pub source: PathBuf,
    pub records: Vec<SessionRecord>,
    pub report: LoadReport,
}

/// Bucket identity for an aggregated group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Week(i64),
    Date(NaiveDate),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Week(w) => write!(f, "{}", w),
            GroupKey::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedGroup {
    pub key: GroupKey,
    pub sum: f64,
    pub mean: Option<f64>,
    pub contact_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordRatio {
    pub date: Option<NaiveDate>,
    pub week: Option<i64>,
    pub sessions: Option<f64>,
    pub week_txns: Option<f64>,
    pub contact_ratio: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeeklyRow {
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub week: i64,
    #[serde(rename = "SumSession")]
    #[tabled(rename = "SumSession")]
    pub sum_session: f64,
    #[serde(rename = "AvgWeekTxn")]
    #[tabled(rename = "AvgWeekTxn", display_with = "display_value")]
    pub avg_week_txn: Option<f64>,
    #[serde(rename = "ContactRatio")]
    #[tabled(rename = "ContactRatio", display_with = "display_value")]
    pub contact_ratio: Option<f64>,
    #[serde(rename = "WeekStr")]
    #[tabled(rename = "WeekStr")]
    pub week_str: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DailyRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "SumSession")]
    #[tabled(rename = "SumSession")]
    pub sum_session: f64,
    #[serde(rename = "AvgWeekTxn")]
    #[tabled(rename = "AvgWeekTxn", display_with = "display_value")]
    pub avg_week_txn: Option<f64>,
    #[serde(rename = "ContactRatio")]
    #[tabled(rename = "ContactRatio", display_with = "display_value")]
    pub contact_ratio: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RecordRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub week: String,
    #[serde(rename = "SumSessionCount")]
    #[tabled(rename = "SumSessionCount", display_with = "display_value")]
    pub sessions: Option<f64>,
    #[serde(rename = "AvgWeekTxnCounts")]
    #[tabled(rename = "AvgWeekTxnCounts", display_with = "display_value")]
    pub week_txns: Option<f64>,
    #[serde(rename = "ContactRatio")]
    #[tabled(rename = "ContactRatio", display_with = "display_value")]
    pub contact_ratio: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub variant: String,
    pub source: String,
    pub data_min_week: Option<i64>,
    pub data_max_week: Option<i64>,
    pub selected_low: Option<i64>,
    pub selected_high: Option<i64>,
    pub filtered_rows: usize,
    pub months_covered: Vec<i64>,
    pub weekly_groups: usize,
    pub daily_groups: usize,
    pub total_sessions: f64,
    pub missing_cells: BTreeMap<String, usize>,
}
