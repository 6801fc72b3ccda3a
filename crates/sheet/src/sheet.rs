use casegrid_formulas::{adjust_for_insertion, Axis, Formula, Insertion};
use casegrid_primitives::CellAddress;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellStyle, CellValue};
use crate::conditional::ConditionalRule;
use crate::error::{Result, SheetError};

static EMPTY_CELL: Cell = Cell {
    value: CellValue::Null,
    style: None,
};

/// A named, dense, row-major grid of styled cells.
///
/// Reads outside the populated extent see an empty cell; writes grow the
/// grid as needed. All indices are 0-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditional_formats: Vec<ConditionalRule>,
}

impl Sheet {
    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            rows: Vec::new(),
            conditional_formats: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_values<T: Into<CellValue>>(name: &str, data: Vec<Vec<T>>) -> Self {
        let mut sheet = Self::with_name(name);
        sheet.rows = data
            .into_iter()
            .map(|row| row.into_iter().map(Cell::new).collect())
            .collect();
        let (rows, cols) = (sheet.row_count(), sheet.col_count());
        sheet.ensure_extent(rows, cols);
        sheet
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the sheet is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|c| c.value.is_null()))
    }

    // ===== Cell Access =====

    /// The cell at `(row, col)`, or an empty cell outside the extent.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        &self.cell(row, col).value
    }

    /// Replace the whole cell, growing the grid if needed.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.ensure_extent(row + 1, col + 1);
        self.rows[row][col] = cell;
    }

    /// Replace the value, keeping whatever style the cell already has.
    pub fn set_value<T: Into<CellValue>>(&mut self, row: usize, col: usize, value: T) {
        self.ensure_extent(row + 1, col + 1);
        self.rows[row][col].value = value.into();
    }

    pub fn set_style(&mut self, row: usize, col: usize, style: Option<CellStyle>) {
        self.ensure_extent(row + 1, col + 1);
        self.rows[row][col].style = style;
    }

    /// Grow the grid to at least `rows` x `cols`, keeping it rectangular.
    pub fn ensure_extent(&mut self, rows: usize, cols: usize) {
        let width = self.col_count().max(cols);
        if self.rows.len() < rows {
            self.rows.resize_with(rows, Vec::new);
        }
        for row in &mut self.rows {
            if row.len() < width {
                row.resize_with(width, Cell::default);
            }
        }
    }

    // ===== Scans =====

    /// Index of the first empty cell in `row`, scanning from column 0.
    ///
    /// A fully populated row yields its width, i.e. the slot past the end.
    #[must_use]
    pub fn first_empty_in_row(&self, row: usize) -> usize {
        let cells = self.rows.get(row).map_or(&[][..], Vec::as_slice);
        cells
            .iter()
            .position(|cell| cell.value.is_null())
            .unwrap_or(cells.len())
    }

    /// Index of the last non-empty cell in `row`.
    #[must_use]
    pub fn last_filled_in_row(&self, row: usize) -> Option<usize> {
        self.rows
            .get(row)?
            .iter()
            .rposition(|cell| !cell.value.is_null())
    }

    /// Index of the last non-empty cell in `col`.
    #[must_use]
    pub fn last_filled_in_column(&self, col: usize) -> Option<usize> {
        (0..self.row_count())
            .rev()
            .find(|&row| !self.value(row, col).is_null())
    }

    /// Row after the last non-empty cell in `col` (0 for an empty column).
    #[must_use]
    pub fn first_empty_after_last_in_column(&self, col: usize) -> usize {
        self.last_filled_in_column(col).map_or(0, |row| row + 1)
    }

    // ===== Structure =====

    /// Insert `count` blank columns before `at`, rewriting this sheet's own
    /// formulas and conditional rules. References from other sheets are
    /// left alone; use [`crate::Book::insert_columns`] to keep a whole
    /// workbook consistent.
    pub fn insert_columns(&mut self, at: usize, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let shift = insertion(Axis::Column, at, count)?;
        let width = self.col_count().max(at);
        self.ensure_extent(self.row_count(), width);
        for row in &mut self.rows {
            row.splice(at..at, std::iter::repeat_with(Cell::default).take(count));
        }
        let name = self.name.clone();
        self.adjust_references(&name, shift)
    }

    /// Insert `count` blank rows before `at`; see [`Sheet::insert_columns`].
    pub fn insert_rows(&mut self, at: usize, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let shift = insertion(Axis::Row, at, count)?;
        let width = self.col_count();
        self.ensure_extent(at, width);
        self.rows.splice(
            at..at,
            std::iter::repeat_with(|| vec![Cell::default(); width]).take(count),
        );
        let name = self.name.clone();
        self.adjust_references(&name, shift)
    }

    /// Rewrite every formula and rule on this sheet that refers to `target`
    /// after an insertion there.
    pub(crate) fn adjust_references(&mut self, target: &str, insertion: Insertion) -> Result<()> {
        let home = self.name.clone();
        for (r, row) in self.rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                let CellValue::Formula(formula) = &mut cell.value else {
                    continue;
                };
                let located = |source| SheetError::Formula {
                    sheet: home.clone(),
                    cell: CellAddress::new(r as u32, c as u32).to_a1(),
                    source,
                };
                let parsed = Formula::parse(&formula.source).map_err(located)?;
                let adjusted = adjust_for_insertion(&parsed, insertion, |prefix| match prefix {
                    Some(prefix) => prefix.matches(target),
                    None => home.to_lowercase() == target.to_lowercase(),
                })
                .map_err(located)?;
                formula.source = adjusted.to_string();
            }
        }
        for rule in &mut self.conditional_formats {
            rule.adjust_for_insertion(&home, target, insertion)?;
        }
        Ok(())
    }

    // ===== Conditional formatting =====

    pub fn add_conditional_format(&mut self, rule: ConditionalRule) {
        self.conditional_formats.push(rule);
    }

    #[must_use]
    pub fn conditional_formats(&self) -> &[ConditionalRule] {
        &self.conditional_formats
    }

    /// Iterate over rows of cells.
    pub fn rows(&self) -> impl Iterator<Item = &Vec<Cell>> {
        self.rows.iter()
    }
}

pub(crate) fn insertion(axis: Axis, at: usize, count: usize) -> Result<Insertion> {
    let narrow = |value: usize| {
        u32::try_from(value).map_err(|_| match axis {
            Axis::Row => SheetError::RowIndexOutOfBounds {
                index: value,
                count: casegrid_primitives::MAX_ROW_COUNT as usize,
            },
            Axis::Column => SheetError::ColumnIndexOutOfBounds {
                index: value,
                count: casegrid_primitives::MAX_COLUMN_COUNT as usize,
            },
        })
    };
    Ok(Insertion {
        axis,
        at: narrow(at)?,
        count: narrow(count)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Rgb;
    use casegrid_primitives::CellRange;

    fn grid() -> Sheet {
        let mut sheet = Sheet::from_values(
            "Случаев",
            vec![
                vec![CellValue::from("Регион"), CellValue::from("01.01"), CellValue::from("02.01")],
                vec![CellValue::from("Москва"), CellValue::from(10), CellValue::from(12)],
                vec![CellValue::from("Итого"), CellValue::formula("=SUM(B2:B2)"), CellValue::formula("=SUM(C2:C2)")],
            ],
        );
        sheet.add_conditional_format(ConditionalRule::new(
            CellRange::from_a1("C2:C2").unwrap(),
            "C2>0",
            Rgb::from_hex("F1CCB1").unwrap(),
        ));
        sheet
    }

    #[test]
    fn test_reads_outside_extent_are_empty() {
        let sheet = grid();
        assert!(sheet.value(100, 100).is_null());
        assert!(sheet.cell(100, 0).style.is_none());
        assert_eq!(sheet.value(1, 1), &CellValue::Int(10));
    }

    #[test]
    fn test_writes_grow_rectangularly() {
        let mut sheet = grid();
        sheet.set_value(4, 5, 7);
        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.col_count(), 6);
        assert!(sheet.rows().all(|row| row.len() == 6));
    }

    #[test]
    fn test_set_value_keeps_style() {
        let mut sheet = grid();
        sheet.set_style(1, 1, Some(CellStyle::default().with_number_format("0")));
        sheet.set_value(1, 1, 11);
        assert_eq!(sheet.cell(1, 1).style.as_ref().unwrap().number_format.as_deref(), Some("0"));
    }

    #[test]
    fn test_scans() {
        let mut sheet = grid();
        assert_eq!(sheet.first_empty_in_row(0), 3);
        assert_eq!(sheet.last_filled_in_row(0), Some(2));
        sheet.set_value(0, 1, CellValue::Null);
        assert_eq!(sheet.first_empty_in_row(0), 1);
        assert_eq!(sheet.first_empty_after_last_in_column(0), 3);
        assert_eq!(sheet.first_empty_after_last_in_column(9), 0);
    }

    #[test]
    fn test_insert_columns_rewrites_own_references() {
        let mut sheet = grid();
        sheet.insert_columns(2, 1).unwrap();
        assert!(sheet.value(1, 2).is_null());
        assert_eq!(sheet.value(1, 3), &CellValue::Int(12));
        assert_eq!(sheet.value(2, 1).formula_source(), Some("=SUM(B2:B2)"));
        assert_eq!(sheet.value(2, 3).formula_source(), Some("=SUM(D2:D2)"));
        let rule = &sheet.conditional_formats()[0];
        assert_eq!(rule.range.to_a1(), "D2:D2");
        assert_eq!(rule.expression, "D2>0");
    }

    #[test]
    fn test_insert_rows_grows_spanning_ranges() {
        let mut sheet = grid();
        sheet.insert_rows(1, 2).unwrap();
        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.value(3, 0), &CellValue::from("Москва"));
        assert_eq!(sheet.value(4, 1).formula_source(), Some("=SUM(B4:B4)"));
    }

    #[test]
    fn test_json_shape() {
        let sheet = Sheet::from_values("s", vec![vec![1]]);
        let json = serde_json::to_string(&sheet).unwrap();
        assert_eq!(json, r#"{"name":"s","rows":[[{"value":1}]]}"#);
        let back: Sheet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sheet);
    }
}
