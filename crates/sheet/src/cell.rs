use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SheetError;

/// Represents a formula stored in a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaCell {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<Box<CellValue>>,
}

/// Represents a cell value in a sheet
///
/// Variant order matters for untagged deserialization: ISO date strings
/// become `Date` before falling back to `String`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    String(String),
    Formula(FormulaCell),
}

impl CellValue {
    /// Create a formula cell value.
    #[must_use]
    pub fn formula<S: Into<String>>(source: S) -> Self {
        CellValue::Formula(FormulaCell {
            source: source.into(),
            cached: None,
        })
    }

    /// Numeric value from a fetched metric; integral values are stored as `Int`.
    #[must_use]
    pub fn from_metric(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            CellValue::Int(value as i64)
        } else {
            CellValue::Float(value)
        }
    }

    /// Return the cached value for formulas, or self for non-formulas.
    #[must_use]
    pub fn cached_or_self(&self) -> &CellValue {
        match self {
            CellValue::Formula(formula) => formula.cached.as_deref().unwrap_or(self),
            _ => self,
        }
    }

    /// Check if the cell holds nothing at all
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Formula source, if this is a formula cell
    #[must_use]
    pub fn formula_source(&self) -> Option<&str> {
        match self {
            CellValue::Formula(formula) => Some(&formula.source),
            _ => None,
        }
    }

    /// Try to get the value as an integer
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self.cached_or_self() {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to get the value as a calendar date
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self.cached_or_self() {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cached_or_self() {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) => write!(f, "{fl}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Formula(formula) => write!(f, "{}", formula.source),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// 24-bit RGB colour, serialized as a six-digit hex string ("F1CCB1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(u32);

impl Rgb {
    pub fn new(value: u32) -> Self {
        Self(value & 0x00FF_FFFF)
    }

    /// Parse "F1CCB1", "#F1CCB1" or an ARGB "FFF1CCB1".
    pub fn from_hex(hex: &str) -> Result<Self, SheetError> {
        let digits = hex.trim().trim_start_matches('#');
        let digits = match digits.len() {
            6 => digits,
            8 => &digits[2..],
            _ => return Err(SheetError::InvalidColor(hex.to_string())),
        };
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| SheetError::InvalidColor(hex.to_string()))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn to_hex(self) -> String {
        format!("{:06X}", self.0)
    }
}

impl TryFrom<String> for Rgb {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb.to_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// Visual treatment of a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgb>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub border: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<HorizontalAlign>,
}

impl CellStyle {
    #[must_use]
    pub fn with_number_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = Some(format.into());
        self
    }
}

/// A cell: its value plus an optional style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            style: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: Option<CellStyle>) -> Self {
        self.style = style;
        self
    }
}
