use casegrid_sheet::Book;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::RefreshContext;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::horizon::{compute_horizon, new_periods, recorded_period};
use crate::layout::ReportLayout;
use crate::normalize::KeyNormalizer;
use crate::reconcile::EntityIndex;
use crate::strategy::SheetOutcome;

/// What a refresh would append, computed without touching the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HorizonPlan {
    pub anchor_sheet: String,
    pub last_recorded: NaiveDate,
    pub last_available: NaiveDate,
    pub horizon: u32,
    pub new_periods: Vec<NaiveDate>,
    /// New periods on which weekly strategies fire.
    pub trigger_periods: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub plan: HorizonPlan,
    pub sheets: Vec<SheetOutcome>,
}

impl RefreshSummary {
    pub fn columns_added(&self) -> usize {
        self.sheets.iter().map(|s| s.columns_added).sum()
    }

    pub fn rows_added(&self) -> usize {
        self.sheets.iter().map(|s| s.rows_added).sum()
    }

    /// True when the report was already up to date.
    pub fn is_noop(&self) -> bool {
        self.plan.horizon == 0
    }
}

/// Runs one refresh cycle over a workbook.
///
/// The horizon is read off the anchor sheet, the entity index is built
/// once, and then every job of the layout runs in order against a staged
/// copy of the workbook. The caller's workbook is only replaced when all
/// jobs succeed, so a failed refresh leaves it exactly as it was.
#[derive(Debug)]
pub struct Refresher {
    layout: ReportLayout,
    normalizer: KeyNormalizer,
}

impl Refresher {
    pub fn new(layout: ReportLayout) -> Result<Self> {
        layout.validate()?;
        let normalizer = KeyNormalizer::new(&layout.stop_words);
        Ok(Self { layout, normalizer })
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    pub fn normalizer(&self) -> &KeyNormalizer {
        &self.normalizer
    }

    /// Entity index over `dataset` using this refresher's normalizer and aliases.
    pub fn index<'a>(&'a self, dataset: &'a Dataset) -> EntityIndex<'a> {
        EntityIndex::build(dataset, &self.normalizer, &self.layout.aliases)
    }

    pub fn plan(&self, book: &Book, dataset: &Dataset) -> Result<HorizonPlan> {
        let anchor = &self.layout.anchor;
        let sheet = book.get_sheet(&anchor.sheet)?;
        let (_, last_recorded) = recorded_period(sheet, anchor.header_row as usize - 1)?;
        let last_available = dataset.last_date();
        let horizon = compute_horizon(last_recorded, last_available)?;
        let new_periods = new_periods(last_recorded, horizon);
        let trigger_periods = new_periods
            .iter()
            .copied()
            .filter(|period| period.weekday().number_from_monday() == self.layout.report_day)
            .collect();

        Ok(HorizonPlan {
            anchor_sheet: anchor.sheet.clone(),
            last_recorded,
            last_available,
            horizon,
            new_periods,
            trigger_periods,
        })
    }

    pub fn run(&self, book: &mut Book, dataset: &Dataset) -> Result<RefreshSummary> {
        let plan = self.plan(book, dataset)?;
        if plan.horizon == 0 {
            info!(last = %plan.last_recorded, "report is up to date");
            return Ok(RefreshSummary {
                plan,
                sheets: Vec::new(),
            });
        }
        info!(
            from = %plan.last_recorded,
            to = %plan.last_available,
            horizon = plan.horizon,
            "refreshing report"
        );

        let mut ctx = RefreshContext::new(
            &self.layout,
            dataset,
            self.index(dataset),
            plan.last_recorded,
            plan.new_periods.clone(),
        );
        let mut staged = book.clone();
        let mut sheets = Vec::with_capacity(self.layout.sheets.len());
        for job in &self.layout.sheets {
            let outcome = job
                .strategy
                .extension()
                .extend(&job.sheet, &mut staged, &mut ctx)
                .inspect_err(|err| warn!(sheet = %job.sheet, %err, "refresh aborted"))?;
            info!(
                sheet = %job.sheet,
                columns = outcome.columns_added,
                rows = outcome.rows_added,
                "extended sheet"
            );
            sheets.push(outcome);
        }

        *book = staged;
        Ok(RefreshSummary { plan, sheets })
    }
}
