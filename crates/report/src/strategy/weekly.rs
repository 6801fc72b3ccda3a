use casegrid_formulas::TranslationMode;
use casegrid_sheet::Book;
use tracing::{debug, info};

use super::{ExtensionStrategy, Line, SheetOutcome};
use crate::context::RefreshContext;
use crate::error::Result;
use crate::layout::{indices, WeeklyFormulas};
use crate::propagate::{propagate_within, write_styled};

impl WeeklyFormulas {
    /// Translation mode for the zero-based `row`, given the frontier column
    /// published for the current trigger day.
    fn mode_for(&self, row: usize, frontier: Option<usize>) -> TranslationMode {
        let anchored = self
            .anchored
            .as_ref()
            .is_some_and(|anchored| anchored.rows.iter().any(|span| span.contains(row as u32 + 1)));
        match frontier {
            Some(col) if anchored => TranslationMode::AnchorRepoint {
                frontier_col: col as u32,
            },
            _ => TranslationMode::Shift,
        }
    }
}

impl ExtensionStrategy for WeeklyFormulas {
    fn extend(
        &self,
        name: &str,
        book: &mut Book,
        ctx: &mut RefreshContext<'_>,
    ) -> Result<SheetOutcome> {
        let mut outcome = SheetOutcome::new(name);
        let counter_rows: Vec<usize> = self.counter_rows.iter().map(|&row| row as usize - 1).collect();
        let Some(&first) = counter_rows.first() else {
            return Ok(outcome);
        };

        let triggers = ctx.trigger_periods();
        if triggers.is_empty() {
            info!(sheet = name, "no report day in the new periods");
            return Ok(outcome);
        }

        for period in triggers {
            let frontier = self
                .anchored
                .as_ref()
                .map(|anchored| ctx.frontier(&anchored.frontier, period))
                .transpose()?;

            let (slot, counters) = {
                let sheet = book.get_sheet(name)?;
                let slot = Line::Row(first).locate(sheet, self.placement);
                let counters = counter_rows
                    .iter()
                    .map(|&row| Line::Row(row).next_counter(sheet, slot).map(|n| (row, n)))
                    .collect::<Result<Vec<_>>>()?;
                (slot, counters)
            };
            if self.insert {
                book.insert_columns(name, slot, 1)?;
            }

            let sheet = book.get_sheet_mut(name)?;
            for (row, counter) in counters {
                write_styled(sheet, (row, slot - 1), (row, slot), counter);
            }
            for row in indices(&self.rows) {
                let mode = self.mode_for(row, frontier);
                propagate_within(sheet, (row, slot - 1), (row, slot), mode)?;
            }

            debug!(sheet = name, %period, col = slot, ?frontier, "appended weekly column");
            outcome.columns_added += 1;
        }
        Ok(outcome)
    }
}
