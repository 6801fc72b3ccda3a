//! Sheet extension strategies.
//!
//! Each [`Strategy`] family grows one sheet for the periods of a refresh.
//! They all work the same way: find the slot for the next period on the
//! growth axis, check that the axis is contiguous up to it, write the
//! period marker and then fill the body from fetched values or from the
//! previous period's formulas.

mod axis;
mod daily;
mod rows;
mod weekly;

use casegrid_sheet::{Book, Cell, CellStyle, Sheet};
use chrono::NaiveDate;
use serde::Serialize;

use crate::context::RefreshContext;
use crate::error::Result;
use crate::layout::Strategy;

pub(crate) use axis::Line;

/// What a strategy did to its sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetOutcome {
    pub sheet: String,
    pub columns_added: usize,
    pub rows_added: usize,
}

impl SheetOutcome {
    fn new(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            ..Self::default()
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.columns_added == 0 && self.rows_added == 0
    }
}

/// Grows one sheet of a staged workbook.
pub trait ExtensionStrategy {
    fn extend(
        &self,
        sheet: &str,
        book: &mut Book,
        ctx: &mut RefreshContext<'_>,
    ) -> Result<SheetOutcome>;
}

impl Strategy {
    pub fn extension(&self) -> &dyn ExtensionStrategy {
        match self {
            Strategy::DailyValues(job) => job,
            Strategy::DailyFormulas(job) => job,
            Strategy::WeeklyFormulas(job) => job,
            Strategy::DailyRows(job) => job,
            Strategy::WeeklyRows(job) => job,
        }
    }
}

/// Write a period date at `to`, styled like `from`.
///
/// `forced` overrides the number format; otherwise the copied one is kept
/// and `fallback` is used only when the source has none.
pub(crate) fn write_period_date(
    sheet: &mut Sheet,
    from: (usize, usize),
    to: (usize, usize),
    period: NaiveDate,
    forced: Option<&str>,
    fallback: &str,
) {
    let mut style: CellStyle = sheet.cell(from.0, from.1).style.clone().unwrap_or_default();
    match forced {
        Some(format) => style.number_format = Some(format.to_string()),
        None if style.number_format.is_none() => style.number_format = Some(fallback.to_string()),
        None => {}
    }
    sheet.set_cell(to.0, to.1, Cell::new(period).with_style(Some(style)));
}
