use casegrid_formulas::FormulaError;
use casegrid_sheet::SheetError;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while extending a report.
///
/// Every variant except `NormalizationEmpty` aborts the refresh; the staged
/// workbook is discarded and the caller's copy stays untouched.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Label {label:?} normalizes to an empty key")]
    NormalizationEmpty { label: String },

    #[error("No fetched record matches {label:?} (key {key:?})")]
    UnresolvedEntity { label: String, key: String },

    #[error("Key {key:?} for {label:?} is claimed by several records: {}", .records.join(", "))]
    AmbiguousEntity {
        label: String,
        key: String,
        records: Vec<String>,
    },

    #[error("Metric {metric} of {entity} has {len} entries, offset {offset} is out of range")]
    MetricIndexOutOfRange {
        entity: String,
        metric: String,
        offset: i64,
        len: usize,
    },

    #[error("Record {entity} has no metric series {metric:?}")]
    UnknownMetric { entity: String, metric: String },

    #[error("Fetched data ends on {available}, before the report's last period {recorded}")]
    StalePeriodPrecondition {
        recorded: NaiveDate,
        available: NaiveDate,
    },

    #[error("Period axis of {sheet} at {cell} is not contiguous: {detail}")]
    ContiguityViolation {
        sheet: String,
        cell: String,
        detail: String,
    },

    #[error("No national summary for {date}")]
    MissingSummary { date: NaiveDate },

    #[error("Nothing published as {name:?} for {period}")]
    MissingContextValue { name: String, period: NaiveDate },

    #[error("{name:?} for {period} was already published")]
    ContextOverwrite { name: String, period: NaiveDate },

    #[error("Cannot repoint formula in {sheet}!{cell}: {source}")]
    UnsupportedFormulaShape {
        sheet: String,
        cell: String,
        #[source]
        source: FormulaError,
    },

    #[error("Formula error in {sheet}!{cell}: {source}")]
    Formula {
        sheet: String,
        cell: String,
        #[source]
        source: FormulaError,
    },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid layout: {0}")]
    Layout(String),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Wrap a formula failure at a located cell, keeping unsupported
    /// anchor shapes distinguishable from ordinary translation errors.
    pub(crate) fn formula_at(sheet: &str, cell: String, source: FormulaError) -> Self {
        match source {
            FormulaError::UnsupportedShape { .. } => ReportError::UnsupportedFormulaShape {
                sheet: sheet.to_string(),
                cell,
                source,
            },
            source => ReportError::Formula {
                sheet: sheet.to_string(),
                cell,
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
