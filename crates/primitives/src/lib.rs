//! # casegrid primitives
//!
//! Zero-based cell addresses and rectangular ranges shared by the formula,
//! sheet and report crates, plus A1 column-letter helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod address;

/// Largest row count of an xlsx worksheet.
pub const MAX_ROW_COUNT: u32 = 1_048_576;
/// Largest column count of an xlsx worksheet.
pub const MAX_COLUMN_COUNT: u32 = 16_384;

/// A cell address in a sheet. Both indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse from A1 notation (e.g., "A1", "$B$2"). Absolute markers are accepted and dropped.
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AddressError::InvalidRange("Empty A1 reference".to_string()));
        }

        let mut chars = trimmed.chars().peekable();

        if matches!(chars.peek(), Some('$')) {
            chars.next();
        }

        let mut col_letters = String::new();
        while let Some(ch) = chars.peek().copied() {
            if ch.is_ascii_alphabetic() {
                col_letters.push(ch);
                chars.next();
            } else {
                break;
            }
        }

        if col_letters.is_empty() {
            return Err(AddressError::InvalidColumn(trimmed.to_string()));
        }

        if matches!(chars.peek(), Some('$')) {
            chars.next();
        }

        let mut row_digits = String::new();
        while let Some(ch) = chars.peek().copied() {
            if ch.is_ascii_digit() {
                row_digits.push(ch);
                chars.next();
            } else {
                break;
            }
        }

        if row_digits.is_empty() || chars.peek().is_some() {
            return Err(AddressError::InvalidRow(trimmed.to_string()));
        }

        let row_num: u32 = row_digits
            .parse()
            .map_err(|_| AddressError::InvalidRow(row_digits.clone()))?;

        if row_num == 0 || row_num > MAX_ROW_COUNT {
            return Err(AddressError::InvalidRow(row_digits));
        }

        let col = address::column_letter_to_index(&col_letters)?;
        Ok(Self {
            row: row_num - 1,
            col,
        })
    }

    /// Convert to A1 notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", address::column_index_to_letter(self.col), self.row + 1)
    }

    /// Return this address moved by a signed offset, or `None` when it would leave the grid.
    pub fn offset(&self, rows: i64, cols: i64) -> Option<Self> {
        let row = i64::from(self.row) + rows;
        let col = i64::from(self.col) + cols;
        if row < 0 || col < 0 || row >= i64::from(MAX_ROW_COUNT) || col >= i64::from(MAX_COLUMN_COUNT)
        {
            return None;
        }
        Some(Self::new(row as u32, col as u32))
    }
}

/// A rectangular range of cells (e.g., C3:C87)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self { start, end }
    }

    /// Parse "A1:B2" (or a single "A1", taken as a one-cell range).
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        match s.split_once(':') {
            Some((start, end)) => Ok(Self::new(
                CellAddress::from_a1(start)?,
                CellAddress::from_a1(end)?,
            )
            .normalized()),
            None => {
                let cell = CellAddress::from_a1(s)?;
                Ok(Self::new(cell, cell))
            }
        }
    }

    /// Return a normalized range where start <= end
    pub fn normalized(&self) -> Self {
        let start_row = self.start.row.min(self.end.row);
        let end_row = self.start.row.max(self.end.row);
        let start_col = self.start.col.min(self.end.col);
        let end_col = self.start.col.max(self.end.col);
        Self {
            start: CellAddress::new(start_row, start_col),
            end: CellAddress::new(end_row, end_col),
        }
    }

    /// Number of rows in the range
    pub fn rows(&self) -> u32 {
        let range = self.normalized();
        range.end.row - range.start.row + 1
    }

    /// Number of columns in the range
    pub fn cols(&self) -> u32 {
        let range = self.normalized();
        range.end.col - range.start.col + 1
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        let range = self.normalized();
        addr.row >= range.start.row
            && addr.row <= range.end.row
            && addr.col >= range.start.col
            && addr.col <= range.end.col
    }

    /// Convert to A1 notation ("C3:C87")
    pub fn to_a1(&self) -> String {
        let range = self.normalized();
        format!("{}:{}", range.start.to_a1(), range.end.to_a1())
    }
}

/// Address parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid column: {0}")]
    InvalidColumn(String),
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}
