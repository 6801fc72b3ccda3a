use thiserror::Error;

/// Errors raised while parsing or rewriting formulas
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Unterminated string literal in formula: {formula}")]
    UnterminatedString { formula: String },

    #[error("Reference {reference} leaves the sheet when moved by {rows} rows, {cols} columns")]
    ReferenceOutOfBounds {
        reference: String,
        rows: i64,
        cols: i64,
    },

    #[error("Unsupported formula shape for anchor repoint ({reason}): {formula}")]
    UnsupportedShape { formula: String, reason: String },
}

pub type Result<T> = std::result::Result<T, FormulaError>;
