// Entry point and interactive menu.
//
// - Option [1] loads the configured CSV (cached after the first read).
// - Option [2] narrows the week range shown in the reports.
// - Option [3] aggregates the selection, prints charts and tables and
//   exports CSV/JSON files.
// - Option [4] drops the cache and reloads the source.
mod aggregate;
mod config;
mod loader;
mod output;
mod range;
mod reports;
mod types;
mod util;

use aggregate::{AggregationSpec, GroupBy};
use config::{DashboardConfig, CONFIG_FILE};
use once_cell::sync::Lazy;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use types::SessionTable;

const PREVIEW_ROWS: usize = 10;

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        config: DashboardConfig::preset(config::Variant::default()),
        table: None,
        selection: None,
    })
});

struct AppState {
    config: DashboardConfig,
    table: Option<Arc<SessionTable>>,
    selection: Option<(i64, i64)>,
}

/// Print `prompt` and read one trimmed line.
///
/// Returns `None` once input is exhausted or unreadable.
fn read_line<R: BufRead>(input: &mut R, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_choice<R: BufRead>(input: &mut R) -> Option<String> {
    read_line(input, "Enter choice: ")
}

/// Ask for a week within `[min, max]`; empty input keeps `default`.
fn prompt_week<R: BufRead>(
    input: &mut R,
    label: &str,
    min: i64,
    max: i64,
    default: i64,
) -> Option<i64> {
    let prompt = format!("{} ({}..={}, default {}): ", label, min, max, default);
    loop {
        let resp = read_line(input, &prompt)?;
        if resp.is_empty() {
            return Some(default);
        }
        match resp.parse::<i64>() {
            Ok(w) if (min..=max).contains(&w) => return Some(w),
            _ => println!("Invalid week. Please enter a number between {} and {}.", min, max),
        }
    }
}

/// `true` to return to the menu. End of input counts as `N`.
fn prompt_back_to_menu<R: BufRead>(input: &mut R) -> bool {
    loop {
        let Some(resp) = read_line(input, "Back to Report Selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load() {
    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let cfg = state.config.clone();
    match loader::load(&cfg.data_path, &cfg.schema) {
        Ok(table) => {
            let report = &table.report;
            println!(
                "Processing dataset... ({} rows loaded from {})",
                util::format_int(table.records.len()),
                table.source.display()
            );
            if report.unreadable_rows > 0 {
                println!(
                    "Note: {} rows skipped as unreadable.",
                    util::format_int(report.unreadable_rows)
                );
            }
            for column in &report.absent_columns {
                println!("Warning: column {} not found; treated as missing.", column);
            }
            if report.fractional_weeks > 0 {
                println!(
                    "Note: {} rows have a non-integral week and were treated as missing.",
                    util::format_int(report.fractional_weeks)
                );
            }
            for (column, missing) in report.missing_cells.iter().filter(|(_, n)| **n > 0) {
                println!("Note: {} missing values in {}.", util::format_int(*missing), column);
            }
            match range::selectable_range(&table.records) {
                Some((lo, hi)) => println!("Weeks available: {} to {}\n", lo, hi),
                None => println!("Warning: no usable week values in {}.\n", cfg.schema.week),
            }
            state.selection = range::selectable_range(&table.records);
            state.table = Some(table);
        }
        Err(e) => {
            error!(error = %e, "load failed");
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn handle_select_range<R: BufRead>(input: &mut R) {
    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(table) = state.table.clone() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let Some((min, max)) = range::selectable_range(&table.records) else {
        println!("Error: The loaded data has no week values to select from.\n");
        return;
    };
    let (cur_lo, cur_hi) = state.selection.unwrap_or((min, max));
    let Some(low) = prompt_week(input, "Lowest week", min, max, cur_lo.clamp(min, max)) else {
        return;
    };
    let Some(high) = prompt_week(input, "Highest week", low, max, cur_hi.clamp(low, max))
    else {
        return;
    };
    state.selection = Some((low, high));
    println!("Selected weeks {} to {}.\n", low, high);
}

fn handle_reload() {
    loader::clear_cache();
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner).table = None;
    handle_load();
}

fn handle_generate_reports() {
    let (cfg, table, selection) = {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        (state.config.clone(), state.table.clone(), state.selection)
    };
    let Some(table) = table else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let Some((low, high)) = selection.or_else(|| range::selectable_range(&table.records)) else {
        println!("Error: The loaded data has no week values to select from.\n");
        return;
    };

    let filtered = range::filter(&table.records, low, high);
    println!(
        "Generating reports for weeks {} to {} ({} rows)...\n",
        low,
        high,
        util::format_int(filtered.len())
    );

    let out_dir = cfg.output_dir.as_path();
    let mut weekly_groups = 0;
    let mut daily_groups = 0;

    if let Some(order) = cfg.views.weekly {
        let spec = AggregationSpec::contact_ratio(GroupBy::Week, order);
        let groups = aggregate::aggregate(&filtered, &spec);
        weekly_groups = groups.len();
        let points = reports::chart_points(&groups);
        println!("{}", output::render_line_chart("Weekly Contact Ratio", &points));
        let rows = reports::weekly_report(&groups);
        println!("Weekly Aggregation\n");
        output::preview_table_rows(&rows, PREVIEW_ROWS);
        export_csv(out_dir, "weekly_contact_ratio.csv", &rows);
    }

    if let Some(order) = cfg.views.daily {
        let spec = AggregationSpec::contact_ratio(GroupBy::Date, order);
        let groups = aggregate::aggregate(&filtered, &spec);
        daily_groups = groups.len();
        let points = reports::chart_points(&groups);
        println!("{}", output::render_line_chart("Date-wise Contact Ratio", &points));
        let rows = reports::daily_report(&groups);
        println!("Daily Aggregation\n");
        output::preview_table_rows(&rows, PREVIEW_ROWS);
        export_csv(out_dir, "daily_contact_ratio.csv", &rows);
    }

    if let Some(order) = cfg.views.per_record {
        let ratios = aggregate::record_ratios(&filtered, order);
        let points = reports::record_chart_points(&ratios);
        println!("{}", output::render_line_chart("Contact Ratio per Record", &points));
        let rows = reports::record_report(&ratios);
        println!("Records\n");
        output::preview_table_rows(&rows, PREVIEW_ROWS);
        export_csv(out_dir, "record_contact_ratio.csv", &rows);
    }

    let summary = reports::generate_summary(
        &cfg,
        &table,
        Some((low, high)),
        &filtered,
        weekly_groups,
        daily_groups,
    );
    if let Err(e) = output::write_json(&out_dir.join("summary.json"), &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("(Outputs saved to {})\n", out_dir.display());
}

fn export_csv<T: serde::Serialize>(dir: &Path, name: &str, rows: &[T]) {
    let path = dir.join(name);
    if let Err(e) = output::write_csv(&path, rows) {
        eprintln!("Write error: {}", e);
        return;
    }
    println!("(Full table exported to {})\n", path.display());
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();

    match DashboardConfig::load_or_default(Path::new(CONFIG_FILE)) {
        Ok(cfg) => APP_STATE.lock().unwrap_or_else(PoisonError::into_inner).config = cfg,
        Err(e) => {
            warn!(error = %e, "falling back to default configuration");
            eprintln!("Config error: {} (using defaults)\n", e);
        }
    }

    {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        println!("Contact Ratio Dashboard [{}]\n", state.config.variant.name());
    }

    let mut input = io::stdin().lock();
    loop {
        println!("Select an option:");
        println!("[1] Load the file");
        println!("[2] Select week range");
        println!("[3] Generate Reports");
        println!("[4] Reload data\n");
        let Some(choice) = read_choice(&mut input) else {
            println!("\nEnd of input. Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(),
            "2" => handle_select_range(&mut input),
            "3" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu(&mut input) {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => handle_reload(),
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_line_reports_end_of_input() {
        let mut input = Cursor::new("  2 \n");
        assert_eq!(read_line(&mut input, ""), Some("2".to_string()));
        assert_eq!(read_line(&mut input, ""), None);
        assert_eq!(read_choice(&mut Cursor::new("")), None);
    }

    #[test]
    fn blank_line_is_not_end_of_input() {
        let mut input = Cursor::new("\n");
        assert_eq!(read_line(&mut input, ""), Some(String::new()));
    }

    #[test]
    fn back_to_menu_stops_when_input_runs_out() {
        assert!(!prompt_back_to_menu(&mut Cursor::new("")));
        assert!(!prompt_back_to_menu(&mut Cursor::new("maybe\n")));
        assert!(prompt_back_to_menu(&mut Cursor::new("x\ny\n")));
        assert!(!prompt_back_to_menu(&mut Cursor::new("n\n")));
    }

    #[test]
    fn week_prompt_retries_then_stops_at_end_of_input() {
        assert_eq!(prompt_week(&mut Cursor::new("99\nabc\n5\n"), "Week", 1, 10, 1), Some(5));
        assert_eq!(prompt_week(&mut Cursor::new("\n"), "Week", 1, 10, 3), Some(3));
        assert_eq!(prompt_week(&mut Cursor::new("99\n"), "Week", 1, 10, 3), None);
    }
}
