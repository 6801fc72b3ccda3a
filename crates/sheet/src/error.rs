use casegrid_formulas::FormulaError;
use thiserror::Error;

/// Errors that can occur during sheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Row index out of bounds: {index} (sheet has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Column index out of bounds: {index} (sheet has {count} columns)")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Formula error in {sheet}!{cell}: {source}")]
    Formula {
        sheet: String,
        cell: String,
        #[source]
        source: FormulaError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XLSX error: {0}")]
    Xlsx(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
