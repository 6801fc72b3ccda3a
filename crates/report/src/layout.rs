//! Report geometry and refresh settings.
//!
//! A [`ReportLayout`] is plain data, usually loaded from YAML. Row and
//! column numbers in it are 1-based as a spreadsheet user reads them; spans
//! are inclusive (`"2-86"`). The default layout describes the regional case
//! report workbook.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use casegrid_sheet::Rgb;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::normalize::DEFAULT_STOP_WORDS;

/// Inclusive 1-based span of rows or columns, written `"2-86"` or `88`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SpanRepr", into = "String")]
pub struct Span {
    pub first: u32,
    pub last: u32,
}

impl Span {
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    pub const fn single(at: u32) -> Self {
        Self { first: at, last: at }
    }

    /// Zero-based indices covered by the span.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (self.first as usize..=self.last as usize).map(|n| n - 1)
    }

    pub fn contains(self, one_based: u32) -> bool {
        (self.first..=self.last).contains(&one_based)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpanRepr {
    Single(u32),
    Text(String),
}

impl TryFrom<SpanRepr> for Span {
    type Error = ReportError;

    fn try_from(repr: SpanRepr) -> Result<Self> {
        match repr {
            SpanRepr::Single(at) => Span::try_from(at.to_string()),
            SpanRepr::Text(text) => Span::try_from(text),
        }
    }
}

impl TryFrom<String> for Span {
    type Error = ReportError;

    fn try_from(text: String) -> Result<Self> {
        let bad = || ReportError::Layout(format!("invalid span {text:?}"));
        let parse = |part: &str| part.trim().parse::<u32>().map_err(|_| bad());
        let span = match text.split_once('-') {
            Some((first, last)) => Span::new(parse(first)?, parse(last)?),
            None => Span::single(parse(&text)?),
        };
        if span.first == 0 || span.first > span.last {
            return Err(bad());
        }
        Ok(span)
    }
}

impl From<Span> for String {
    fn from(span: Span) -> Self {
        span.to_string()
    }
}

/// Zero-based indices of every span, in order.
pub(crate) fn indices(spans: &[Span]) -> impl Iterator<Item = usize> + '_ {
    spans.iter().flat_map(|span| span.indices())
}

/// Where the next period goes on a sheet's growth axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// First empty cell of the header, scanning from the start.
    FirstEmpty,
    /// Right after the last filled cell of the header.
    AfterLast,
}

/// Sheet and header row whose last date is the report's recorded period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonAnchor {
    pub sheet: String,
    pub header_row: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightFills {
    pub positive: Rgb,
    pub negative: Rgb,
}

impl Default for HighlightFills {
    fn default() -> Self {
        Self {
            positive: Rgb::new(0x00F1_CCB1),
            negative: Rgb::new(0x00E4_EFDC),
        }
    }
}

/// Entity grid filled straight from a fetched metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyValues {
    pub header_row: u32,
    pub label_col: u32,
    pub rows: Vec<Span>,
    pub metric: String,
    #[serde(default)]
    pub formula_rows: Vec<Span>,
}

/// Date-headed grid whose new columns are formulas carried from the left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFormulas {
    pub header_rows: Vec<u32>,
    pub placement: Placement,
    #[serde(default)]
    pub insert: bool,
    #[serde(default)]
    pub weekday_row: Option<u32>,
    pub rows: Vec<Span>,
    #[serde(default)]
    pub publish_frontier: Option<String>,
    #[serde(default)]
    pub highlight: Option<Span>,
}

/// Rows whose range end is repointed to a frontier published by another sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredRows {
    pub rows: Vec<Span>,
    pub frontier: String,
}

/// Week-numbered grid that grows one column per trigger day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyFormulas {
    pub counter_rows: Vec<u32>,
    pub placement: Placement,
    #[serde(default)]
    pub insert: bool,
    pub rows: Vec<Span>,
    #[serde(default)]
    pub anchored: Option<AnchoredRows>,
}

/// Date-per-row summary grid growing downwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRows {
    pub scan_col: u32,
    pub date_col: u32,
    #[serde(default)]
    pub date_format: Option<String>,
    pub summary_cols: Span,
    pub formula_cols: Vec<Span>,
    pub lookback: u32,
    #[serde(default)]
    pub lookback_cols: Vec<Span>,
    #[serde(default)]
    pub lookback_next_cols: Vec<Span>,
}

/// Week-numbered rows growing downwards on trigger days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRows {
    pub counter_col: u32,
    pub formula_cols: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    DailyValues(DailyValues),
    DailyFormulas(DailyFormulas),
    WeeklyFormulas(WeeklyFormulas),
    DailyRows(DailyRows),
    WeeklyRows(WeeklyRows),
}

impl Strategy {
    /// Name of the frontier this strategy publishes, if any.
    pub fn publishes(&self) -> Option<&str> {
        match self {
            Strategy::DailyFormulas(job) => job.publish_frontier.as_deref(),
            _ => None,
        }
    }

    /// Name of the frontier this strategy consumes, if any.
    pub fn consumes(&self) -> Option<&str> {
        match self {
            Strategy::WeeklyFormulas(job) => job.anchored.as_ref().map(|a| a.frontier.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetJob {
    pub sheet: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLayout {
    pub anchor: HorizonAnchor,
    pub stop_words: Vec<String>,
    /// Report label -> feed label, for names the normalizer cannot fold.
    pub aliases: IndexMap<String, String>,
    /// ISO weekday (Monday = 1) on which weekly strategies fire.
    pub report_day: u32,
    pub weekday_labels: Vec<String>,
    pub date_format: String,
    pub highlight: HighlightFills,
    /// Jobs run strictly in this order.
    pub sheets: Vec<SheetJob>,
}

impl ReportLayout {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let layout: Self = serde_yaml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn job(&self, sheet: &str) -> Option<&SheetJob> {
        self.sheets.iter().find(|job| job.sheet == sheet)
    }

    /// Check settings and the static producer/consumer order of frontiers.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ReportError::Layout(msg));

        if !(1..=7).contains(&self.report_day) {
            return fail(format!("report_day {} is not an ISO weekday", self.report_day));
        }
        if self.weekday_labels.len() != 7 {
            return fail(format!(
                "expected 7 weekday labels, got {}",
                self.weekday_labels.len()
            ));
        }
        if self.anchor.header_row == 0 {
            return fail("anchor header_row is 1-based".to_string());
        }

        let mut seen = HashSet::new();
        let mut published = HashSet::new();
        for job in &self.sheets {
            if !seen.insert(job.sheet.as_str()) {
                return fail(format!("sheet {:?} listed twice", job.sheet));
            }
            if let Some(name) = job.strategy.consumes() {
                if !published.contains(name) {
                    return fail(format!(
                        "{:?} consumes frontier {name:?} before any sheet publishes it",
                        job.sheet
                    ));
                }
            }
            if let Some(name) = job.strategy.publishes() {
                if !published.insert(name) {
                    return fail(format!("frontier {name:?} published by two sheets"));
                }
            }
            if let Some(zero) = job.strategy.one_based_fields().find(|&n| n == 0) {
                return fail(format!("{:?}: row/column {zero} is not 1-based", job.sheet));
            }
            if let Some(span) = job.strategy.spans().find(|s| s.first == 0 || s.first > s.last) {
                return fail(format!(
                    "{:?}: span {}-{} is not a 1-based inclusive range",
                    job.sheet, span.first, span.last
                ));
            }
        }
        Ok(())
    }
}

impl Strategy {
    fn one_based_fields(&self) -> impl Iterator<Item = u32> + '_ {
        let singles: Vec<u32> = match self {
            Strategy::DailyValues(job) => vec![job.header_row, job.label_col],
            Strategy::DailyFormulas(job) => {
                let mut rows = job.header_rows.clone();
                rows.extend(job.weekday_row);
                rows
            }
            Strategy::WeeklyFormulas(job) => job.counter_rows.clone(),
            Strategy::DailyRows(job) => vec![job.scan_col, job.date_col],
            Strategy::WeeklyRows(job) => vec![job.counter_col],
        };
        singles.into_iter()
    }

    /// Every row or column span the strategy reads or writes.
    fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        let spans: Vec<Span> = match self {
            Strategy::DailyValues(job) => [&job.rows[..], &job.formula_rows[..]].concat(),
            Strategy::DailyFormulas(job) => {
                let mut spans = job.rows.clone();
                spans.extend(job.highlight);
                spans
            }
            Strategy::WeeklyFormulas(job) => {
                let mut spans = job.rows.clone();
                if let Some(anchored) = &job.anchored {
                    spans.extend_from_slice(&anchored.rows);
                }
                spans
            }
            Strategy::DailyRows(job) => [
                &[job.summary_cols][..],
                &job.formula_cols[..],
                &job.lookback_cols[..],
                &job.lookback_next_cols[..],
            ]
            .concat(),
            Strategy::WeeklyRows(job) => job.formula_cols.clone(),
        };
        spans.into_iter()
    }
}

fn spans(list: &[(u32, u32)]) -> Vec<Span> {
    list.iter().map(|&(first, last)| Span::new(first, last)).collect()
}

fn daily(
    header_rows: &[u32],
    placement: Placement,
    insert: bool,
    weekday_row: Option<u32>,
    rows: &[(u32, u32)],
) -> DailyFormulas {
    DailyFormulas {
        header_rows: header_rows.to_vec(),
        placement,
        insert,
        weekday_row,
        rows: spans(rows),
        publish_frontier: None,
        highlight: None,
    }
}

fn weekly(counter_rows: &[u32], placement: Placement, insert: bool, rows: &[(u32, u32)]) -> WeeklyFormulas {
    WeeklyFormulas {
        counter_rows: counter_rows.to_vec(),
        placement,
        insert,
        rows: spans(rows),
        anchored: None,
    }
}

fn job(sheet: &str, strategy: Strategy) -> SheetJob {
    SheetJob {
        sheet: sheet.to_string(),
        strategy,
    }
}

/// Frontier published by the daily gain sheet.
pub const GAIN_FRONTIER: &str = "gain";

impl Default for ReportLayout {
    fn default() -> Self {
        use Placement::{AfterLast, FirstEmpty};

        let gain = DailyFormulas {
            publish_frontier: Some(GAIN_FRONTIER.to_string()),
            ..daily(&[1], FirstEmpty, false, None, &[(2, 95)])
        };
        let delta = DailyFormulas {
            highlight: Some(Span::new(3, 87)),
            ..daily(&[1], AfterLast, false, Some(2), &[(3, 97)])
        };
        let weekly_gain = WeeklyFormulas {
            anchored: Some(AnchoredRows {
                rows: spans(&[(2, 86)]),
                frontier: GAIN_FRONTIER.to_string(),
            }),
            ..weekly(&[1], FirstEmpty, true, &[(2, 93)])
        };

        Self {
            anchor: HorizonAnchor {
                sheet: "Случаев".to_string(),
                header_row: 1,
            },
            stop_words: DEFAULT_STOP_WORDS.iter().map(ToString::to_string).collect(),
            aliases: IndexMap::new(),
            report_day: 5,
            weekday_labels: ["ПН", "ВТ", "СР", "ЧТ", "ПТ", "СБ", "ВС"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            date_format: "DD.MM.YYYY".to_string(),
            highlight: HighlightFills::default(),
            sheets: vec![
                job(
                    "Случаев",
                    Strategy::DailyValues(DailyValues {
                        header_row: 1,
                        label_col: 2,
                        rows: spans(&[(2, 86)]),
                        metric: "cases".to_string(),
                        formula_rows: vec![Span::single(88)],
                    }),
                ),
                job("Прирост", Strategy::DailyFormulas(gain)),
                job(
                    "МСК и СП",
                    Strategy::DailyFormulas(daily(&[1], AfterLast, false, Some(2), &[(3, 97)])),
                ),
                job(
                    "Rt",
                    Strategy::DailyFormulas(daily(&[2], FirstEmpty, true, None, &[(3, 88)])),
                ),
                job(
                    "прирост 7дн",
                    Strategy::DailyFormulas(daily(&[1], FirstEmpty, true, None, &[(2, 93)])),
                ),
                job("дельта за сутки", Strategy::DailyFormulas(delta)),
                job(
                    "По рег прис (сут)",
                    Strategy::DailyFormulas(daily(
                        &[1, 20, 35],
                        AfterLast,
                        false,
                        None,
                        &[(2, 18), (21, 33), (36, 48)],
                    )),
                ),
                job("Прирост нед", Strategy::WeeklyFormulas(weekly_gain)),
                job(
                    "Тпр нед прироста",
                    Strategy::WeeklyFormulas(weekly(&[1], FirstEmpty, true, &[(2, 87)])),
                ),
                job(
                    "По рег прис (нед)",
                    Strategy::WeeklyFormulas(weekly(&[1, 20], AfterLast, false, &[(2, 16), (21, 33)])),
                ),
                job(
                    "Дата-неделя",
                    Strategy::WeeklyRows(WeeklyRows {
                        counter_col: 1,
                        formula_cols: spans(&[(2, 3)]),
                    }),
                ),
                job(
                    "База РФ",
                    Strategy::DailyRows(DailyRows {
                        scan_col: 2,
                        date_col: 1,
                        date_format: Some("DD.MM".to_string()),
                        summary_cols: Span::new(2, 4),
                        formula_cols: spans(&[(5, 19), (26, 26), (28, 35)]),
                        lookback: 7,
                        lookback_cols: spans(&[(20, 24), (27, 27)]),
                        lookback_next_cols: spans(&[(20, 22)]),
                    }),
                ),
            ],
        }
    }
}
