use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::dataset::Dataset;
use crate::error::{ReportError, Result};
use crate::layout::ReportLayout;
use crate::reconcile::EntityIndex;

/// State shared by the strategies of one refresh.
///
/// Everything is fixed when the context is built except the frontier table,
/// which is append-only: each `(name, period)` has exactly one writer, and
/// a consumer asking before the producer ran gets an error instead of a
/// stale value.
#[derive(Debug)]
pub struct RefreshContext<'a> {
    pub layout: &'a ReportLayout,
    pub dataset: &'a Dataset,
    pub index: EntityIndex<'a>,
    last_recorded: NaiveDate,
    new_periods: Vec<NaiveDate>,
    frontiers: BTreeMap<(String, NaiveDate), usize>,
}

impl<'a> RefreshContext<'a> {
    pub fn new(
        layout: &'a ReportLayout,
        dataset: &'a Dataset,
        index: EntityIndex<'a>,
        last_recorded: NaiveDate,
        new_periods: Vec<NaiveDate>,
    ) -> Self {
        Self {
            layout,
            dataset,
            index,
            last_recorded,
            new_periods,
            frontiers: BTreeMap::new(),
        }
    }

    pub fn last_recorded(&self) -> NaiveDate {
        self.last_recorded
    }

    /// Periods to append, oldest first.
    pub fn new_periods(&self) -> &[NaiveDate] {
        &self.new_periods
    }

    pub fn horizon(&self) -> usize {
        self.new_periods.len()
    }

    /// Whether a weekly strategy fires for `period`.
    pub fn is_trigger_day(&self, period: NaiveDate) -> bool {
        period.weekday().number_from_monday() == self.layout.report_day
    }

    /// New periods on which weekly strategies fire.
    pub fn trigger_periods(&self) -> Vec<NaiveDate> {
        self.new_periods
            .iter()
            .copied()
            .filter(|&period| self.is_trigger_day(period))
            .collect()
    }

    /// Short weekday label for `period` ("ПН" ... "ВС" by default).
    pub fn weekday_label(&self, period: NaiveDate) -> &str {
        let index = period.weekday().num_days_from_monday() as usize;
        self.layout
            .weekday_labels
            .get(index)
            .map_or("", String::as_str)
    }

    /// Record the zero-based column a sheet reached for `period`.
    pub fn publish_frontier(&mut self, name: &str, period: NaiveDate, col: usize) -> Result<()> {
        let key = (name.to_string(), period);
        if self.frontiers.contains_key(&key) {
            return Err(ReportError::ContextOverwrite {
                name: name.to_string(),
                period,
            });
        }
        tracing::debug!(frontier = name, %period, col, "published frontier");
        self.frontiers.insert(key, col);
        Ok(())
    }

    pub fn frontier(&self, name: &str, period: NaiveDate) -> Result<usize> {
        self.frontiers
            .get(&(name.to_string(), period))
            .copied()
            .ok_or_else(|| ReportError::MissingContextValue {
                name: name.to_string(),
                period,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::KeyNormalizer;
    use indexmap::IndexMap;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    #[test]
    fn test_frontiers_are_single_writer() {
        let layout = ReportLayout::default();
        let dataset = Dataset::new(vec![day(8)], Vec::new()).unwrap();
        let normalizer = KeyNormalizer::default();
        let index = EntityIndex::build(&dataset, &normalizer, &IndexMap::new());
        let mut ctx = RefreshContext::new(&layout, &dataset, index, day(6), vec![day(7), day(8)]);

        assert!(matches!(
            ctx.frontier("gain", day(8)),
            Err(ReportError::MissingContextValue { .. })
        ));
        ctx.publish_frontier("gain", day(8), 30).unwrap();
        assert_eq!(ctx.frontier("gain", day(8)).unwrap(), 30);
        assert!(matches!(
            ctx.publish_frontier("gain", day(8), 31),
            Err(ReportError::ContextOverwrite { .. })
        ));
        assert_eq!(ctx.frontier("gain", day(8)).unwrap(), 30);
    }

    #[test]
    fn test_trigger_days_and_labels() {
        let layout = ReportLayout::default();
        let dataset = Dataset::new(vec![day(10)], Vec::new()).unwrap();
        let normalizer = KeyNormalizer::default();
        let index = EntityIndex::build(&dataset, &normalizer, &IndexMap::new());
        let periods = (4..=10).map(day).collect();
        let ctx = RefreshContext::new(&layout, &dataset, index, day(3), periods);

        // 2021-01-08 is a Friday, ISO weekday 5
        assert_eq!(ctx.trigger_periods(), vec![day(8)]);
        assert_eq!(ctx.weekday_label(day(4)), "ПН");
        assert_eq!(ctx.weekday_label(day(10)), "ВС");
        assert_eq!(ctx.horizon(), 7);
    }
}
