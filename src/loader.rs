use crate::config::SchemaConfig;
use crate::types::{LoadReport, SessionRecord, SessionTable};
use crate::util::{parse_date_safe, parse_f64_safe, parse_i64_safe};
use csv::{ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read CSV header: {0}")]
    Csv(#[from] csv::Error),
    #[error(
        "none of the configured columns ({}) found in {}",
        .columns.join(", "),
        .path.display()
    )]
    NoRequiredColumns { path: PathBuf, columns: Vec<String> },
}

type CacheKey = (PathBuf, SchemaConfig);

// Tables stay cached for the life of the process unless `clear_cache` is
// called; a cached table is never refreshed behind the caller's back.
static TABLE_CACHE: Lazy<Mutex<HashMap<CacheKey, Arc<SessionTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Load `path` with `schema`, reusing the cached table when one exists.
pub fn load(path: &Path, schema: &SchemaConfig) -> Result<Arc<SessionTable>, LoadError> {
    let key = (path.to_path_buf(), schema.clone());
    let mut cache = TABLE_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(table) = cache.get(&key) {
        debug!(path = %path.display(), "table cache hit");
        return Ok(Arc::clone(table));
    }

    info!(path = %path.display(), "loading session table");
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = Arc::new(load_from_reader(file, path, schema)?);
    info!(
        rows = table.records.len(),
        unreadable = table.report.unreadable_rows,
        "session table loaded"
    );
    cache.insert(key, Arc::clone(&table));
    Ok(table)
}

/// Drop every cached table so the next `load` re-reads its source.
pub fn clear_cache() {
    let mut cache = TABLE_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    debug!(entries = cache.len(), "clearing table cache");
    cache.clear();
}

struct Columns {
    date: Option<usize>,
    month: Option<usize>,
    week: Option<usize>,
    sessions: Option<usize>,
    week_txns: Option<usize>,
}

fn cell(rec: &StringRecord, pos: Option<usize>) -> Option<&str> {
    pos.and_then(|i| rec.get(i))
}

fn position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Parse CSV from any reader. Bad cells become missing; unreadable records
/// are skipped and counted.
pub fn load_from_reader<R: Read>(
    reader: R,
    source: &Path,
    schema: &SchemaConfig,
) -> Result<SessionTable, LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let cols = Columns {
        date: position(&headers, &schema.date),
        month: schema.month.as_deref().and_then(|m| position(&headers, m)),
        week: position(&headers, &schema.week),
        sessions: position(&headers, &schema.sessions),
        week_txns: position(&headers, &schema.week_txns),
    };

    let mut configured: Vec<(&str, Option<usize>)> = vec![
        (schema.date.as_str(), cols.date),
        (schema.week.as_str(), cols.week),
        (schema.sessions.as_str(), cols.sessions),
        (schema.week_txns.as_str(), cols.week_txns),
    ];
    if let Some(m) = schema.month.as_deref() {
        configured.push((m, cols.month));
    }
    if configured.iter().all(|(_, pos)| pos.is_none()) {
        return Err(LoadError::NoRequiredColumns {
            path: source.to_path_buf(),
            columns: configured.iter().map(|(n, _)| n.to_string()).collect(),
        });
    }

    let mut report = LoadReport::default();
    for (name, pos) in &configured {
        report.missing_cells.insert(name.to_string(), 0);
        if pos.is_none() {
            warn!(column = %name, "configured column absent, loading as missing");
            report.absent_columns.push(name.to_string());
        }
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let rec = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = report.total_rows, error = %e, "skipping unreadable record");
                report.unreadable_rows += 1;
                continue;
            }
        };

        let week_cell = cell(&rec, cols.week);
        let row = SessionRecord {
            date: parse_date_safe(cell(&rec, cols.date)),
            month: parse_i64_safe(cell(&rec, cols.month)),
            week: parse_i64_safe(week_cell),
            sessions: parse_f64_safe(cell(&rec, cols.sessions)),
            week_txns: parse_f64_safe(cell(&rec, cols.week_txns)),
        };

        if row.week.is_none() && parse_f64_safe(week_cell).is_some() {
            report.fractional_weeks += 1;
        }

        let mut note_missing = |name: &str, missing: bool| {
            if missing {
                if let Some(n) = report.missing_cells.get_mut(name) {
                    *n += 1;
                }
            }
        };
        note_missing(&schema.date, row.date.is_none());
        note_missing(&schema.week, row.week.is_none());
        note_missing(&schema.sessions, row.sessions.is_none());
        note_missing(&schema.week_txns, row.week_txns.is_none());
        if let Some(m) = schema.month.as_deref() {
            note_missing(m, row.month.is_none());
        }

        records.push(row);
    }

    if report.fractional_weeks > 0 {
        warn!(
            column = %schema.week,
            rows = report.fractional_weeks,
            "non-integral week values treated as missing"
        );
    }

    Ok(SessionTable {
        source: source.to_path_buf(),
        records,
        report,
    })
}
