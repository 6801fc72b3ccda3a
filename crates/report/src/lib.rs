//! Incremental extension engine for multi-sheet daily case reports
//!
//! A report workbook tracks a daily time series across many sheets: raw
//! per-region counts, derived gains, deltas, weekly aggregates and a national
//! summary. Each refresh appends the days between the report's last recorded
//! date and the freshest fetched date, filling new cells either from the
//! fetched records or by carrying the previous period's formulas forward.
//!
//! # Examples
//!
//! ```
//! use casegrid_report::KeyNormalizer;
//!
//! let normalizer = KeyNormalizer::default();
//! assert_eq!(
//!     normalizer.normalize("Белгородская обл."),
//!     normalizer.normalize("Белгородская область"),
//! );
//! assert_eq!(normalizer.normalize("  г. "), "");
//! ```
//!
//! ```
//! use casegrid_report::{compute_horizon, ReportError};
//! use chrono::NaiveDate;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2021, 1, d).unwrap();
//! assert_eq!(compute_horizon(day(3), day(5)).unwrap(), 2);
//! assert!(matches!(
//!     compute_horizon(day(5), day(3)),
//!     Err(ReportError::StalePeriodPrecondition { .. })
//! ));
//! ```
//!
//! # Refreshing
//!
//! [`Refresher`] drives a whole cycle from a [`ReportLayout`]: it computes the
//! [`HorizonPlan`], builds the [`EntityIndex`] once, and runs every sheet job
//! in layout order on a staged copy of the [`casegrid_sheet::Book`]. Any
//! error leaves the caller's workbook untouched.

mod context;
mod dataset;
mod error;
mod highlight;
mod horizon;
mod layout;
mod normalize;
mod propagate;
mod reconcile;
mod refresh;
mod strategy;

pub use context::RefreshContext;
pub use dataset::{Dataset, MetricTuple, Record};
pub use error::{ReportError, Result};
pub use highlight::{apply_sign_highlighting, sign_rules};
pub use horizon::{compute_horizon, new_periods, recorded_period};
pub use layout::{
    AnchoredRows, DailyFormulas, DailyRows, DailyValues, HighlightFills, HorizonAnchor, Placement,
    ReportLayout, SheetJob, Span, Strategy, WeeklyFormulas, WeeklyRows, GAIN_FRONTIER,
};
pub use normalize::{CanonicalKey, KeyNormalizer, DEFAULT_STOP_WORDS};
pub use propagate::{copy_style, propagate};
pub use reconcile::EntityIndex;
pub use refresh::{HorizonPlan, RefreshSummary, Refresher};
pub use strategy::{ExtensionStrategy, SheetOutcome};
