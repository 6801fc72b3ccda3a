use casegrid_formulas::TranslationMode;
use casegrid_sheet::{Book, CellValue};
use tracing::debug;

use super::{write_period_date, ExtensionStrategy, Line, SheetOutcome};
use crate::context::RefreshContext;
use crate::error::{ReportError, Result};
use crate::layout::{indices, DailyRows, Placement, WeeklyRows};
use crate::propagate::{address, propagate_within, write_styled};

impl ExtensionStrategy for DailyRows {
    fn extend(
        &self,
        name: &str,
        book: &mut Book,
        ctx: &mut RefreshContext<'_>,
    ) -> Result<SheetOutcome> {
        let mut outcome = SheetOutcome::new(name);
        let scan_col = self.scan_col as usize - 1;
        let date_col = self.date_col as usize - 1;
        let lookback = self.lookback as usize;
        let sheet = book.get_sheet_mut(name)?;

        for &period in ctx.new_periods() {
            let row = Line::Column(scan_col).locate(sheet, Placement::AfterLast);
            Line::Column(date_col).expect_date_step(sheet, row, period)?;
            let summary = ctx.dataset.summary_for(period)?;

            write_period_date(
                sheet,
                (row - 1, date_col),
                (row, date_col),
                period,
                self.date_format.as_deref(),
                &ctx.layout.date_format,
            );
            for (k, col) in self.summary_cols.indices().enumerate() {
                let value = summary
                    .get(k)
                    .copied()
                    .flatten()
                    .map_or(CellValue::Null, CellValue::from_metric);
                write_styled(sheet, (row - 1, col), (row, col), value);
            }
            for col in indices(&self.formula_cols) {
                propagate_within(sheet, (row - 1, col), (row, col), TranslationMode::Shift)?;
            }

            if ctx.is_trigger_day(period) {
                let source = row
                    .checked_sub(lookback)
                    .filter(|_| lookback > 0)
                    .ok_or_else(|| ReportError::ContiguityViolation {
                        sheet: name.to_string(),
                        cell: address((row, date_col)).to_a1(),
                        detail: format!("no row {lookback} periods back"),
                    })?;
                for col in indices(&self.lookback_cols) {
                    propagate_within(sheet, (source, col), (row, col), TranslationMode::Shift)?;
                }
                for col in indices(&self.lookback_next_cols) {
                    propagate_within(sheet, (source + 1, col), (row + 1, col), TranslationMode::Shift)?;
                }
                debug!(sheet = name, %period, row, source, "carried weekly block");
            }

            debug!(sheet = name, %period, row, "appended summary row");
            outcome.rows_added += 1;
        }
        Ok(outcome)
    }
}

impl ExtensionStrategy for WeeklyRows {
    fn extend(
        &self,
        name: &str,
        book: &mut Book,
        ctx: &mut RefreshContext<'_>,
    ) -> Result<SheetOutcome> {
        let mut outcome = SheetOutcome::new(name);
        let col = self.counter_col as usize - 1;
        let sheet = book.get_sheet_mut(name)?;

        for period in ctx.trigger_periods() {
            let line = Line::Column(col);
            let row = line.locate(sheet, Placement::AfterLast);
            let counter = line.next_counter(sheet, row)?;

            write_styled(sheet, (row - 1, col), (row, col), counter);
            for formula_col in indices(&self.formula_cols) {
                propagate_within(sheet, (row - 1, formula_col), (row, formula_col), TranslationMode::Shift)?;
            }
            debug!(sheet = name, %period, row, counter, "appended week row");
            outcome.rows_added += 1;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::layout::{ReportLayout, Span};
    use crate::normalize::KeyNormalizer;
    use crate::reconcile::EntityIndex;
    use casegrid_sheet::Sheet;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    /// Header row plus one dated row per day from Jan 1 to Jan `last`.
    fn base_sheet(last: u32) -> Sheet {
        let mut sheet = Sheet::with_name("База РФ");
        sheet.set_value(0, 0, "Дата");
        sheet.set_value(0, 1, "Случаи");
        for d in 1..=last {
            let row = d as usize;
            sheet.set_value(row, 0, day(d));
            sheet.set_value(row, 1, i64::from(d) * 100);
            sheet.set_value(row, 3, CellValue::formula(format!("=B{}-B{}", row + 1, row)));
            sheet.set_value(row, 4, CellValue::formula(format!("=SUM(B{}:B{})", row + 1, row + 1)));
        }
        sheet
    }

    fn job() -> DailyRows {
        DailyRows {
            scan_col: 2,
            date_col: 1,
            date_format: Some("DD.MM".to_string()),
            summary_cols: Span::new(2, 3),
            formula_cols: vec![Span::single(4)],
            lookback: 7,
            lookback_cols: vec![Span::single(5)],
            lookback_next_cols: vec![Span::single(5)],
        }
    }

    #[test]
    fn test_daily_rows_with_weekly_block() {
        let layout = ReportLayout::default();
        let dataset = Dataset::new(vec![day(8)], Vec::new())
            .unwrap()
            .with_summary(day(8), vec![Some(900.0), Some(3.5)]);
        let normalizer = KeyNormalizer::default();
        let index = EntityIndex::build(&dataset, &normalizer, &IndexMap::new());
        let mut ctx = RefreshContext::new(&layout, &dataset, index, day(7), vec![day(8)]);

        let mut book = Book::new();
        book.add_sheet("База РФ", base_sheet(7)).unwrap();
        let outcome = job().extend("База РФ", &mut book, &mut ctx).unwrap();
        assert_eq!(outcome.rows_added, 1);

        let sheet = book.get_sheet("База РФ").unwrap();
        assert_eq!(sheet.value(8, 0), &CellValue::Date(day(8)));
        assert_eq!(
            sheet.cell(8, 0).style.as_ref().unwrap().number_format.as_deref(),
            Some("DD.MM")
        );
        assert_eq!(sheet.value(8, 1), &CellValue::Int(900));
        assert_eq!(sheet.value(8, 2), &CellValue::Float(3.5));
        assert_eq!(sheet.value(8, 3).formula_source(), Some("=B9-B8"));
        // Jan 8 2021 is a Friday: column E comes from seven rows up
        assert_eq!(sheet.value(8, 4).formula_source(), Some("=SUM(B9:B9)"));
        assert_eq!(sheet.value(9, 4).formula_source(), Some("=SUM(B10:B10)"));
    }

    #[test]
    fn test_missing_summary_aborts() {
        let layout = ReportLayout::default();
        let dataset = Dataset::new(vec![day(4)], Vec::new()).unwrap();
        let normalizer = KeyNormalizer::default();
        let index = EntityIndex::build(&dataset, &normalizer, &IndexMap::new());
        let mut ctx = RefreshContext::new(&layout, &dataset, index, day(3), vec![day(4)]);

        let mut book = Book::new();
        book.add_sheet("База РФ", base_sheet(3)).unwrap();
        let err = job().extend("База РФ", &mut book, &mut ctx).unwrap_err();
        assert!(matches!(err, ReportError::MissingSummary { .. }));
    }

    #[test]
    fn test_weekly_rows_only_on_report_day() {
        let layout = ReportLayout::default();
        let dataset = Dataset::new(vec![day(9)], Vec::new()).unwrap();
        let normalizer = KeyNormalizer::default();
        let index = EntityIndex::build(&dataset, &normalizer, &IndexMap::new());
        let mut ctx = RefreshContext::new(&layout, &dataset, index, day(6), vec![day(7), day(8), day(9)]);

        let mut sheet = Sheet::with_name("Дата-неделя");
        sheet.set_value(0, 0, "Неделя");
        sheet.set_value(1, 0, 52);
        sheet.set_value(1, 1, CellValue::formula("=A2*7"));
        let mut book = Book::new();
        book.add_sheet("Дата-неделя", sheet).unwrap();

        let job = WeeklyRows {
            counter_col: 1,
            formula_cols: vec![Span::single(2)],
        };
        let outcome = job.extend("Дата-неделя", &mut book, &mut ctx).unwrap();
        assert_eq!(outcome.rows_added, 1);

        let sheet = book.get_sheet("Дата-неделя").unwrap();
        assert_eq!(sheet.value(2, 0), &CellValue::Int(53));
        assert_eq!(sheet.value(2, 1).formula_source(), Some("=A3*7"));
        assert!(sheet.value(3, 0).is_null());
    }
}
