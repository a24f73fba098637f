//! Dashboard configuration.
//!
//! A `Variant` picks one of the three dashboard layouts and its column
//! names. Individual pieces can be overridden from `dashboard.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Weekly,
    #[default]
    WeeklyDaily,
    PerRecord,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::Weekly => "weekly",
            Variant::WeeklyDaily => "weekly-daily",
            Variant::PerRecord => "per-record",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Source column names mapped onto `SessionRecord` fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub date: String,
    #[serde(default)]
    pub month: Option<String>,
    pub week: String,
    pub sessions: String,
    pub week_txns: String,
}

impl SchemaConfig {
    pub fn session_columns() -> Self {
        Self {
            date: "session_date".to_string(),
            month: Some("session_month".to_string()),
            week: "session_week".to_string(),
            sessions: "session_count".to_string(),
            week_txns: "week_txn_counts".to_string(),
        }
    }

    pub fn created_columns() -> Self {
        Self {
            date: "CreatedDate".to_string(),
            month: None,
            week: "CreatedWeek".to_string(),
            sessions: "Sum_session_count".to_string(),
            week_txns: "Avg_week_txn_counts".to_string(),
        }
    }
}

/// Which result views a variant renders, each with its own sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Views {
    pub weekly: Option<SortOrder>,
    pub daily: Option<SortOrder>,
    pub per_record: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub variant: Variant,
    pub data_path: PathBuf,
    pub schema: SchemaConfig,
    pub views: Views,
    pub output_dir: PathBuf,
}

impl DashboardConfig {
    pub fn preset(variant: Variant) -> Self {
        let (data_path, schema, views) = match variant {
            Variant::Weekly => (
                "data/summary_data.csv",
                SchemaConfig::session_columns(),
                Views {
                    weekly: Some(SortOrder::Ascending),
                    daily: None,
                    per_record: None,
                },
            ),
            Variant::WeeklyDaily => (
                "data/summary_data_1.csv",
                SchemaConfig::session_columns(),
                Views {
                    weekly: Some(SortOrder::Descending),
                    daily: Some(SortOrder::Descending),
                    per_record: None,
                },
            ),
            Variant::PerRecord => (
                "data/summary_data_2.csv",
                SchemaConfig::created_columns(),
                Views {
                    weekly: None,
                    daily: None,
                    per_record: Some(SortOrder::Ascending),
                },
            ),
        };
        Self {
            variant,
            data_path: PathBuf::from(data_path),
            schema,
            views,
            output_dir: PathBuf::from("."),
        }
    }

    /// Apply overrides from a config file on top of the variant preset.
    fn with_overrides(file: ConfigFile) -> Self {
        let mut cfg = Self::preset(file.variant.unwrap_or_default());
        if let Some(p) = file.data_path {
            cfg.data_path = p;
        }
        if let Some(s) = file.schema {
            cfg.schema = s;
        }
        if let Some(d) = file.output_dir {
            cfg.output_dir = d;
        }
        // Orders only retarget views the variant already renders.
        if let (Some(o), Some(_)) = (file.weekly_order, cfg.views.weekly) {
            cfg.views.weekly = Some(o);
        }
        if let (Some(o), Some(_)) = (file.daily_order, cfg.views.daily) {
            cfg.views.daily = Some(o);
        }
        if let (Some(o), Some(_)) = (file.record_order, cfg.views.per_record) {
            cfg.views.per_record = Some(o);
        }
        cfg
    }

    /// Load `path` if it exists, otherwise fall back to the default preset.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::preset(Variant::default()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let file: ConfigFile = serde_json::from_str(text)?;
        Ok(Self::with_overrides(file))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    variant: Option<Variant>,
    data_path: Option<PathBuf>,
    schema: Option<SchemaConfig>,
    output_dir: Option<PathBuf>,
    weekly_order: Option<SortOrder>,
    daily_order: Option<SortOrder>,
    record_order: Option<SortOrder>,
}
