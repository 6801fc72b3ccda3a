use casegrid_primitives::CellAddress;
use casegrid_sheet::{CellValue, Sheet};
use chrono::{Days, NaiveDate};

use crate::error::{ReportError, Result};
use crate::layout::Placement;

/// A growth axis: a header row scanned across, or a column scanned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line {
    Row(usize),
    Column(usize),
}

impl Line {
    fn value(self, sheet: &Sheet, slot: usize) -> &CellValue {
        match self {
            Line::Row(row) => sheet.value(row, slot),
            Line::Column(col) => sheet.value(slot, col),
        }
    }

    fn address(self, slot: usize) -> CellAddress {
        match self {
            Line::Row(row) => CellAddress::new(row as u32, slot as u32),
            Line::Column(col) => CellAddress::new(slot as u32, col as u32),
        }
    }

    /// Slot for the next period.
    pub(crate) fn locate(self, sheet: &Sheet, placement: Placement) -> usize {
        match (self, placement) {
            (Line::Row(row), Placement::FirstEmpty) => sheet.first_empty_in_row(row),
            (Line::Row(row), Placement::AfterLast) => {
                sheet.last_filled_in_row(row).map_or(0, |col| col + 1)
            }
            (Line::Column(col), Placement::FirstEmpty) => (0..sheet.row_count())
                .find(|&row| sheet.value(row, col).is_null())
                .unwrap_or(sheet.row_count()),
            (Line::Column(col), Placement::AfterLast) => sheet.first_empty_after_last_in_column(col),
        }
    }

    fn violation(self, sheet: &Sheet, slot: usize, detail: String) -> ReportError {
        ReportError::ContiguityViolation {
            sheet: sheet.name().to_string(),
            cell: self.address(slot).to_a1(),
            detail,
        }
    }

    /// The marker just before `slot`, which must be present.
    fn previous(self, sheet: &Sheet, slot: usize) -> Result<&CellValue> {
        let prev = slot
            .checked_sub(1)
            .ok_or_else(|| self.violation(sheet, slot, "no previous period marker".to_string()))?;
        Ok(self.value(sheet, prev))
    }

    /// Check that `period` may be written at `slot`: the previous marker
    /// must be the day before it.
    pub(crate) fn expect_date_step(self, sheet: &Sheet, slot: usize, period: NaiveDate) -> Result<()> {
        let prev = self.previous(sheet, slot)?;
        let expected = period.checked_sub_days(Days::new(1));
        match prev.as_date() {
            Some(date) if Some(date) == expected => Ok(()),
            Some(date) => Err(self.violation(
                sheet,
                slot,
                format!("previous period is {date}, cannot append {period}"),
            )),
            None => Err(self.violation(
                sheet,
                slot,
                format!("previous marker {prev:?} is not a date"),
            )),
        }
    }

    /// Counter to write at `slot`: the previous counter plus one.
    pub(crate) fn next_counter(self, sheet: &Sheet, slot: usize) -> Result<i64> {
        let prev = self.previous(sheet, slot)?;
        match prev.cached_or_self() {
            CellValue::Int(n) => Ok(n + 1),
            CellValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64 + 1),
            _ => Err(self.violation(
                sheet,
                slot,
                format!("previous marker {prev:?} is not a counter"),
            )),
        }
    }
}
