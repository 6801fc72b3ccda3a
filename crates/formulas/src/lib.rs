//! Formula reference handling for casegrid.
//!
//! A formula source such as `=SUM(Прирост!$C5:$AB5)/$B$2` is parsed into
//! [`Segment`]s: opaque text and structured A1 [`Reference`]s. Rewrites are
//! then addressed by a reference's role (range start, range end, column or
//! row component) rather than by its position in a token list.
//!
//! Two translation modes exist:
//!
//! - [`TranslationMode::Shift`] moves every relative component by the offset
//!   and leaves `$`-pinned components alone (spreadsheet fill semantics).
//! - [`TranslationMode::AnchorRepoint`] does the same for everything except
//!   the pinned column of each range end, which is rewritten to a frontier
//!   column supplied by the caller.
//!
//! ```
//! use casegrid_formulas::{translate_formula, Offset, TranslationMode};
//!
//! let moved = translate_formula("=B2-A2", Offset::new(0, 1), TranslationMode::Shift).unwrap();
//! assert_eq!(moved, "=C2-B2");
//!
//! let repointed = translate_formula(
//!     "=SUM(Прирост!$C5:$AB5)",
//!     Offset::new(0, 1),
//!     TranslationMode::AnchorRepoint { frontier_col: 28 },
//! )
//! .unwrap();
//! assert_eq!(repointed, "=SUM(Прирост!$C5:$AC5)");
//! ```

mod error;
pub mod refs;
mod translate;

pub use error::{FormulaError, Result};
pub use refs::{Coord, Endpoint, Formula, Reference, Segment, SheetPrefix};
pub use translate::{
    adjust_for_insertion, translate, translate_formula, Axis, Insertion, Offset, TranslationMode,
};
