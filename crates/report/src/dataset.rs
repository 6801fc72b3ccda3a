//! Fetched statistics, as handed over by the retrieval collaborator.
//!
//! The feed is the upstream JSON document:
//!
//! ```json
//! { "russia_stat_struct": {
//!     "dates": ["2021-01-01", "2021-01-02"],
//!     "data": { "77": { "info": { "name": "Москва", "short_name": "Москва" },
//!                       "cases": [[1500], [1520]] } } } }
//! ```
//!
//! Every field of an entity that is an array of numeric tuples is a metric
//! series; anything else is auxiliary and kept verbatim.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use casegrid_sheet::CellValue;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ReportError, Result};

/// One day of a metric: a tuple whose first element is the reported value.
pub type MetricTuple = Vec<Option<f64>>;

/// Per-entity payload of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub metrics: IndexMap<String, Vec<MetricTuple>>,
    pub auxiliary: Map<String, Value>,
}

impl Record {
    /// Series for `metric`, oldest first.
    pub fn series(&self, metric: &str) -> Result<&[MetricTuple]> {
        self.metrics
            .get(metric)
            .map(Vec::as_slice)
            .ok_or_else(|| ReportError::UnknownMetric {
                entity: self.id.clone(),
                metric: metric.to_string(),
            })
    }

    /// Value of `metric` at `offset`; negative offsets count from the most
    /// recent day (`-1` is the last entry).
    pub fn metric(&self, metric: &str, offset: i64) -> Result<CellValue> {
        let series = self.series(metric)?;
        let len = series.len();
        let index = if offset < 0 {
            len.checked_sub(offset.unsigned_abs() as usize)
        } else {
            Some(offset as usize).filter(|&i| i < len)
        };
        let tuple = index
            .and_then(|i| series.get(i))
            .ok_or_else(|| ReportError::MetricIndexOutOfRange {
                entity: self.id.clone(),
                metric: metric.to_string(),
                offset,
                len,
            })?;
        Ok(tuple
            .first()
            .copied()
            .flatten()
            .map_or(CellValue::Null, CellValue::from_metric))
    }
}

/// A whole fetch: ordered dates, entity records and the optional
/// national summary per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    records: Vec<Record>,
    summary: BTreeMap<NaiveDate, MetricTuple>,
}

#[derive(Deserialize)]
struct Feed {
    russia_stat_struct: StatStruct,
}

#[derive(Deserialize)]
struct StatStruct {
    dates: Vec<String>,
    data: IndexMap<String, RawEntity>,
}

#[derive(Deserialize)]
struct RawEntity {
    info: RawInfo,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawInfo {
    name: String,
    short_name: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| ReportError::InvalidDataset(format!("bad date {text:?}: {e}")))
}

/// A numeric tuple array, e.g. `[[1520, 12], [1530, null]]`.
fn as_series(value: &Value) -> Option<Vec<MetricTuple>> {
    value
        .as_array()?
        .iter()
        .map(|day| {
            day.as_array()?
                .iter()
                .map(|item| match item {
                    Value::Null => Some(None),
                    other => other.as_f64().map(Some),
                })
                .collect::<Option<MetricTuple>>()
        })
        .collect()
}

impl Dataset {
    pub fn new(dates: Vec<NaiveDate>, records: Vec<Record>) -> Result<Self> {
        if dates.is_empty() {
            return Err(ReportError::InvalidDataset("no dates".to_string()));
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ReportError::InvalidDataset(format!(
                "dates not strictly ascending at {} -> {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self {
            dates,
            records,
            summary: BTreeMap::new(),
        })
    }

    /// Parse the upstream feed document.
    pub fn from_feed_json(content: &str) -> Result<Self> {
        let feed: Feed = serde_json::from_str(content)?;
        let stat = feed.russia_stat_struct;
        let dates = stat
            .dates
            .iter()
            .map(|d| parse_date(d))
            .collect::<Result<Vec<_>>>()?;

        let records = stat
            .data
            .into_iter()
            .map(|(id, entity)| {
                let mut auxiliary = entity.info.extra;
                let mut metrics = IndexMap::new();
                for (field, value) in entity.fields {
                    match as_series(&value) {
                        Some(series) => {
                            metrics.insert(field, series);
                        }
                        None => {
                            auxiliary.insert(field, value);
                        }
                    }
                }
                Record {
                    id,
                    name: entity.info.name,
                    short_name: entity.info.short_name,
                    metrics,
                    auxiliary,
                }
            })
            .collect();

        let dataset = Self::new(dates, records)?;
        tracing::debug!(
            dates = dataset.dates.len(),
            records = dataset.records.len(),
            "parsed feed"
        );
        Ok(dataset)
    }

    pub fn from_feed_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_feed_json(&fs::read_to_string(path)?)
    }

    /// Attach national summary tuples from `{ "YYYY-MM-DD": [v, ...], ... }`.
    pub fn with_summary_json(mut self, content: &str) -> Result<Self> {
        let raw: BTreeMap<String, MetricTuple> = serde_json::from_str(content)?;
        for (date, tuple) in raw {
            self.summary.insert(parse_date(&date)?, tuple);
        }
        Ok(self)
    }

    pub fn with_summary(mut self, date: NaiveDate, tuple: MetricTuple) -> Self {
        self.summary.insert(date, tuple);
        self
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Most recent fetched date.
    pub fn last_date(&self) -> NaiveDate {
        self.dates.last().copied().unwrap_or_default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn summary_for(&self, date: NaiveDate) -> Result<&MetricTuple> {
        self.summary
            .get(&date)
            .ok_or(ReportError::MissingSummary { date })
    }
}
