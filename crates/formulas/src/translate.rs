use casegrid_primitives::{CellAddress, MAX_COLUMN_COUNT, MAX_ROW_COUNT};

use crate::error::{FormulaError, Result};
use crate::refs::{Coord, Endpoint, Formula, Reference, SheetPrefix};

/// Signed distance between a source cell and its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub rows: i64,
    pub cols: i64,
}

impl Offset {
    pub fn new(rows: i64, cols: i64) -> Self {
        Self { rows, cols }
    }

    /// Offset that carries `from` onto `to`.
    pub fn between(from: CellAddress, to: CellAddress) -> Self {
        Self {
            rows: i64::from(to.row) - i64::from(from.row),
            cols: i64::from(to.col) - i64::from(from.col),
        }
    }

    pub fn inverse(self) -> Self {
        Self {
            rows: -self.rows,
            cols: -self.cols,
        }
    }
}

/// How references are rewritten when a formula is copied to another cell.
///
/// The mode is chosen by the caller per formula family; it cannot be
/// recovered from the formula text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    /// Relative components move by the offset, `$`-pinned components stay.
    Shift,
    /// As `Shift`, except the pinned column of every range end is set to
    /// `frontier_col` (zero-based). Every reference must be a range whose
    /// end column is pinned.
    AnchorRepoint { frontier_col: u32 },
}

/// Translate a parsed formula.
pub fn translate(formula: &Formula, offset: Offset, mode: TranslationMode) -> Result<Formula> {
    if let TranslationMode::AnchorRepoint { .. } = mode {
        check_anchor_shape(formula)?;
    }

    formula.try_map_references(|reference| {
        let start = shift_endpoint(reference, reference.start, offset)?;
        let end = match reference.end {
            None => None,
            Some(end) => Some(match mode {
                TranslationMode::Shift => shift_endpoint(reference, end, offset)?,
                TranslationMode::AnchorRepoint { frontier_col } => {
                    let frontier = Coord::absolute(frontier_col);
                    end.try_map(|_| Ok(frontier), |row| shift(reference, row, offset.rows, offset, MAX_ROW_COUNT))?
                }
            }),
        };
        Ok(Reference {
            sheet: reference.sheet.clone(),
            start,
            end,
        })
    })
}

/// Parse, translate and render a formula source in one step.
pub fn translate_formula(source: &str, offset: Offset, mode: TranslationMode) -> Result<String> {
    if offset == Offset::default() && mode == TranslationMode::Shift {
        return Ok(source.to_string());
    }
    let formula = Formula::parse(source)?;
    Ok(translate(&formula, offset, mode)?.to_string())
}

fn check_anchor_shape(formula: &Formula) -> Result<()> {
    let unsupported = |reason: String| FormulaError::UnsupportedShape {
        formula: formula.to_string(),
        reason,
    };

    let mut count = 0usize;
    for reference in formula.references() {
        count += 1;
        let anchored = reference
            .end
            .and_then(|end| end.column())
            .is_some_and(|col| col.absolute);
        if !anchored {
            return Err(unsupported(format!(
                "{reference} is not a range with a pinned end column"
            )));
        }
    }
    if count == 0 {
        return Err(unsupported("no references".to_string()));
    }
    Ok(())
}

fn shift_endpoint(reference: &Reference, endpoint: Endpoint, offset: Offset) -> Result<Endpoint> {
    endpoint.try_map(
        |col| shift(reference, col, offset.cols, offset, MAX_COLUMN_COUNT),
        |row| shift(reference, row, offset.rows, offset, MAX_ROW_COUNT),
    )
}

fn shift(reference: &Reference, coord: Coord, delta: i64, offset: Offset, limit: u32) -> Result<Coord> {
    if coord.absolute || delta == 0 {
        return Ok(coord);
    }
    let moved = i64::from(coord.index) + delta;
    if moved < 0 || moved >= i64::from(limit) {
        return Err(FormulaError::ReferenceOutOfBounds {
            reference: reference.to_string(),
            rows: offset.rows,
            cols: offset.cols,
        });
    }
    Ok(Coord {
        index: moved as u32,
        absolute: false,
    })
}

/// Grid axis along which rows or columns are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

/// `count` blank rows or columns inserted before zero-based index `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub axis: Axis,
    pub at: u32,
    pub count: u32,
}

/// Rewrite references after an insertion, Excel style.
///
/// Components at or past `at` move by `count` whether pinned or not, so a
/// range that straddles the insertion point grows. Only references for which
/// `targets` returns true (given their sheet qualifier) are touched.
pub fn adjust_for_insertion<F>(formula: &Formula, insertion: Insertion, targets: F) -> Result<Formula>
where
    F: Fn(Option<&SheetPrefix>) -> bool,
{
    let (limit, offset) = match insertion.axis {
        Axis::Row => (MAX_ROW_COUNT, Offset::new(i64::from(insertion.count), 0)),
        Axis::Column => (MAX_COLUMN_COUNT, Offset::new(0, i64::from(insertion.count))),
    };

    formula.try_map_references(|reference| {
        if !targets(reference.sheet.as_ref()) {
            return Ok(reference.clone());
        }
        let push = |coord: Coord| -> Result<Coord> {
            if coord.index < insertion.at {
                return Ok(coord);
            }
            let moved = u64::from(coord.index) + u64::from(insertion.count);
            if moved >= u64::from(limit) {
                return Err(FormulaError::ReferenceOutOfBounds {
                    reference: reference.to_string(),
                    rows: offset.rows,
                    cols: offset.cols,
                });
            }
            Ok(Coord {
                index: moved as u32,
                ..coord
            })
        };
        let keep = |coord: Coord| -> Result<Coord> { Ok(coord) };
        let adjust = |endpoint: Endpoint| -> Result<Endpoint> {
            match insertion.axis {
                Axis::Column => endpoint.try_map(push, keep),
                Axis::Row => endpoint.try_map(keep, push),
            }
        };
        Ok(Reference {
            sheet: reference.sheet.clone(),
            start: adjust(reference.start)?,
            end: reference.end.map(adjust).transpose()?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift_by(source: &str, rows: i64, cols: i64) -> String {
        translate_formula(source, Offset::new(rows, cols), TranslationMode::Shift).unwrap()
    }

    #[test]
    fn test_shift_cells() {
        assert_eq!(shift_by("=A1+B1", 1, 1), "=B2+C2");
        assert_eq!(shift_by("=SUM(C2:C86)", 0, 1), "=SUM(D2:D86)");
    }

    #[test]
    fn test_shift_keeps_pinned_components() {
        assert_eq!(shift_by("=$A$1+A1", 2, 0), "=$A$1+A3");
        assert_eq!(shift_by("=$B5*C$1", 3, 2), "=$B8*E$1");
    }

    #[test]
    fn test_shift_whole_columns_and_rows() {
        assert_eq!(shift_by("=SUM(B:B)", 5, 1), "=SUM(C:C)");
        assert_eq!(shift_by("=SUM(2:3)", 7, 4), "=SUM(9:10)");
    }

    #[test]
    fn test_shift_off_grid_is_an_error() {
        let err = translate_formula("=A1", Offset::new(0, -1), TranslationMode::Shift).unwrap_err();
        assert!(matches!(err, FormulaError::ReferenceOutOfBounds { .. }));
    }

    #[test]
    fn test_repoint_rewrites_only_pinned_end_column() {
        let out = translate_formula(
            "=SUM(Прирост!$C5:$AB5)/SUM(Прирост!$C$88:$AB$88)",
            Offset::new(1, 1),
            TranslationMode::AnchorRepoint { frontier_col: 30 },
        )
        .unwrap();
        assert_eq!(out, "=SUM(Прирост!$C6:$AE6)/SUM(Прирост!$C$88:$AE$88)");
    }

    #[test]
    fn test_repoint_rejects_unanchored_shapes() {
        for source in ["=SUM(C5:AB5)", "=A1+SUM($C5:$AB5)", "=42"] {
            let err = translate_formula(
                source,
                Offset::new(0, 1),
                TranslationMode::AnchorRepoint { frontier_col: 3 },
            )
            .unwrap_err();
            assert!(matches!(err, FormulaError::UnsupportedShape { .. }), "{source}");
        }
    }

    #[test]
    fn test_insertion_moves_pinned_and_relative() {
        let formula = Formula::parse("=SUM($B2:$D2)+E2+A2").unwrap();
        let insertion = Insertion {
            axis: Axis::Column,
            at: 2,
            count: 1,
        };
        let out = adjust_for_insertion(&formula, insertion, |_| true).unwrap();
        assert_eq!(out.to_string(), "=SUM($B2:$E2)+F2+A2");
    }

    #[test]
    fn test_insertion_respects_target_filter() {
        let formula = Formula::parse("=Rt!C3+C3").unwrap();
        let insertion = Insertion {
            axis: Axis::Row,
            at: 0,
            count: 2,
        };
        let out = adjust_for_insertion(&formula, insertion, |sheet| {
            sheet.is_some_and(|prefix| prefix.matches("Rt"))
        })
        .unwrap();
        assert_eq!(out.to_string(), "=Rt!C5+C3");
    }
}
