use casegrid_formulas::TranslationMode;
use casegrid_primitives::{CellAddress, CellRange};
use casegrid_sheet::Book;
use tracing::debug;

use super::{write_period_date, ExtensionStrategy, Line, SheetOutcome};
use crate::context::RefreshContext;
use crate::error::Result;
use crate::highlight::apply_sign_highlighting;
use crate::layout::{indices, DailyFormulas, DailyValues, Placement};
use crate::propagate::{propagate_within, write_styled};

impl ExtensionStrategy for DailyValues {
    fn extend(
        &self,
        name: &str,
        book: &mut Book,
        ctx: &mut RefreshContext<'_>,
    ) -> Result<SheetOutcome> {
        let mut outcome = SheetOutcome::new(name);
        let horizon = ctx.horizon() as i64;
        if horizon == 0 {
            return Ok(outcome);
        }

        let header = self.header_row as usize - 1;
        let label_col = self.label_col as usize - 1;
        let sheet = book.get_sheet_mut(name)?;

        // Every row must resolve before any column is written.
        let records = indices(&self.rows)
            .map(|row| {
                let label = sheet.value(row, label_col).to_string();
                ctx.index.resolve(label.trim()).map(|record| (row, record))
            })
            .collect::<Result<Vec<_>>>()?;

        for (step, &period) in ctx.new_periods().iter().enumerate() {
            let line = Line::Row(header);
            let slot = line.locate(sheet, Placement::AfterLast);
            line.expect_date_step(sheet, slot, period)?;

            write_period_date(
                sheet,
                (header, slot - 1),
                (header, slot),
                period,
                None,
                &ctx.layout.date_format,
            );

            let offset = step as i64 - horizon;
            for &(row, record) in &records {
                let value = record.metric(&self.metric, offset)?;
                write_styled(sheet, (row, slot - 1), (row, slot), value);
            }
            for row in indices(&self.formula_rows) {
                propagate_within(sheet, (row, slot - 1), (row, slot), TranslationMode::Shift)?;
            }

            debug!(sheet = name, %period, col = slot, offset, "appended value column");
            outcome.columns_added += 1;
        }
        Ok(outcome)
    }
}

impl ExtensionStrategy for DailyFormulas {
    fn extend(
        &self,
        name: &str,
        book: &mut Book,
        ctx: &mut RefreshContext<'_>,
    ) -> Result<SheetOutcome> {
        let mut outcome = SheetOutcome::new(name);
        let header_rows: Vec<usize> = self.header_rows.iter().map(|&row| row as usize - 1).collect();
        let Some(&first) = header_rows.first() else {
            return Ok(outcome);
        };

        let periods = ctx.new_periods().to_vec();
        for period in periods {
            let slot = {
                let sheet = book.get_sheet(name)?;
                let slot = Line::Row(first).locate(sheet, self.placement);
                for &row in &header_rows {
                    Line::Row(row).expect_date_step(sheet, slot, period)?;
                }
                slot
            };
            if self.insert {
                book.insert_columns(name, slot, 1)?;
            }

            let sheet = book.get_sheet_mut(name)?;
            for &row in &header_rows {
                write_period_date(
                    sheet,
                    (row, slot - 1),
                    (row, slot),
                    period,
                    None,
                    &ctx.layout.date_format,
                );
            }
            if let Some(weekday_row) = self.weekday_row {
                let row = weekday_row as usize - 1;
                write_styled(sheet, (row, slot - 1), (row, slot), ctx.weekday_label(period));
            }
            for row in indices(&self.rows) {
                propagate_within(sheet, (row, slot - 1), (row, slot), TranslationMode::Shift)?;
            }
            if let Some(span) = self.highlight {
                let range = CellRange::new(
                    CellAddress::new(span.first - 1, slot as u32),
                    CellAddress::new(span.last - 1, slot as u32),
                );
                apply_sign_highlighting(sheet, range, ctx.layout.highlight);
            }
            if let Some(frontier) = &self.publish_frontier {
                ctx.publish_frontier(frontier, period, slot)?;
            }

            debug!(sheet = name, %period, col = slot, inserted = self.insert, "appended formula column");
            outcome.columns_added += 1;
        }
        Ok(outcome)
    }
}
