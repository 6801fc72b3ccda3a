use casegrid_primitives::CellRange;
use casegrid_sheet::{ConditionalRule, Sheet};

use crate::layout::HighlightFills;

/// Sign rules for `range`: positive cells get one fill, negative the other.
///
/// Expressions are relative to the range's top-left cell, so each cell of
/// the range tests itself.
pub fn sign_rules(range: CellRange, fills: HighlightFills) -> [ConditionalRule; 2] {
    let range = range.normalized();
    let anchor = range.start.to_a1();
    [
        ConditionalRule::new(range, format!("{anchor}>0"), fills.positive),
        ConditionalRule::new(range, format!("{anchor}<0"), fills.negative),
    ]
}

/// Register sign highlighting over exactly `range`.
pub fn apply_sign_highlighting(sheet: &mut Sheet, range: CellRange, fills: HighlightFills) {
    for rule in sign_rules(range, fills) {
        sheet.add_conditional_format(rule);
    }
    tracing::debug!(sheet = sheet.name(), range = %range, "added sign highlighting");
}
