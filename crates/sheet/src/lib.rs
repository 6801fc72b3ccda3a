//! In-memory workbook model for casegrid reports
//!
//! A [`Book`] is an ordered set of named [`Sheet`]s; a sheet is a dense grid
//! of [`Cell`]s, each holding a [`CellValue`] and an optional [`CellStyle`],
//! plus any [`ConditionalRule`]s registered over cell ranges.
//!
//! # Examples
//!
//! ## Growing a sheet
//!
//! ```
//! use casegrid_sheet::{CellValue, Sheet};
//!
//! let mut sheet = Sheet::from_values("Случаев", vec![
//!     vec![CellValue::from("Регион"), CellValue::from("03.01")],
//!     vec![CellValue::from("Москва"), CellValue::from(1520)],
//! ]);
//!
//! let next = sheet.first_empty_in_row(0);
//! sheet.set_value(0, next, "04.01");
//! assert_eq!(sheet.col_count(), 3);
//! ```
//!
//! ## Structural edits keep references consistent
//!
//! ```
//! use casegrid_sheet::{Book, CellValue, Sheet};
//!
//! let mut book = Book::new();
//! book.add_sheet("Прирост", Sheet::from_values("", vec![vec![1, 2]])).unwrap();
//! let mut weekly = Sheet::with_name("");
//! weekly.set_value(0, 0, CellValue::formula("=SUM(Прирост!$A1:$B1)"));
//! book.add_sheet("Прирост нед", weekly).unwrap();
//!
//! book.insert_columns("Прирост", 1, 1).unwrap();
//! let weekly = book.get_sheet("Прирост нед").unwrap();
//! assert_eq!(weekly.value(0, 0).formula_source(), Some("=SUM(Прирост!$A1:$C1)"));
//! ```
//!
//! # Persistence
//!
//! JSON is lossless. XLSX export writes values, dates, formulas, styles and
//! conditional rules; XLSX import reads values and formulas only.

mod book;
mod cell;
mod conditional;
mod error;
mod json;
mod sheet;
#[cfg(not(target_arch = "wasm32"))]
mod xlsx;

/// Re-export book type.
pub use book::Book;
/// Re-export cell types.
pub use cell::{Cell, CellStyle, CellValue, FormulaCell, HorizontalAlign, Rgb};
/// Re-export conditional formatting rule.
pub use conditional::ConditionalRule;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet type.
pub use sheet::Sheet;
