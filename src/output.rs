use serde::Serialize;
use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use crate::util::display_value;

const CHART_WIDTH: usize = 40;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!(path = %path.display(), "wrote json");
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows\n", rows.len() - max_rows);
    }
}

/// Render a horizontal text chart, one line per point in the given order.
///
/// Bars are scaled against the largest finite value. Infinite values get a
/// full bar marked `>`; missing values get no bar.
pub fn render_line_chart(title: &str, points: &[(String, Option<f64>)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    if points.is_empty() {
        let _ = writeln!(out, "(no data)");
        return out;
    }
    let label_width = points.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let max = points
        .iter()
        .filter_map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |m, v| m.max(v.abs()));

    for (label, value) in points {
        let bar = match value {
            Some(v) if v.is_infinite() => format!("{}>", "#".repeat(CHART_WIDTH)),
            Some(v) if max > 0.0 => {
                let len = ((v.abs() / max) * CHART_WIDTH as f64).round() as usize;
                "#".repeat(len)
            }
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{:>width$} | {:<bar_width$} {}",
            label,
            bar,
            display_value(value),
            width = label_width,
            bar_width = CHART_WIDTH + 1
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeeklyRow;

    #[test]
    fn chart_scales_against_largest_finite_value() {
        let chart = render_line_chart(
            "Weekly",
            &[
                ("1".to_string(), Some(10.0)),
                ("2".to_string(), Some(20.0)),
                ("3".to_string(), Some(f64::INFINITY)),
                ("4".to_string(), None),
            ],
        );
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Weekly");
        assert_eq!(lines[1].matches('#').count(), CHART_WIDTH / 2);
        assert_eq!(lines[2].matches('#').count(), CHART_WIDTH);
        assert!(lines[3].contains('>'));
        assert!(lines[3].ends_with("inf"));
        assert_eq!(lines[4].matches('#').count(), 0);
        assert!(lines[4].ends_with("NaN"));
    }

    #[test]
    fn empty_chart() {
        assert!(render_line_chart("Daily", &[]).contains("(no data)"));
    }

    #[test]
    fn csv_writes_missing_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekly.csv");
        let rows = vec![WeeklyRow {
            week: 3,
            sum_session: 12.0,
            avg_week_txn: None,
            contact_ratio: None,
            week_str: "3".to_string(),
        }];
        write_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Week,SumSession,AvgWeekTxn,ContactRatio,WeekStr"));
        assert_eq!(lines.next(), Some("3,12.0,,,3"));
    }
}
