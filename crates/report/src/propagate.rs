use casegrid_formulas::{translate_formula, FormulaError, Offset, TranslationMode};
use casegrid_primitives::CellAddress;
use casegrid_sheet::{Cell, CellValue, Sheet};

use crate::error::{ReportError, Result};

/// Destination payload for a cell copied by `offset`.
///
/// Formulas are translated in `mode` and lose their cached result; any other
/// value is copied as is. The style always comes along.
pub fn propagate(source: &Cell, offset: Offset, mode: TranslationMode) -> std::result::Result<Cell, FormulaError> {
    let value = match &source.value {
        CellValue::Formula(formula) => {
            CellValue::formula(translate_formula(&formula.source, offset, mode)?)
        }
        other => other.clone(),
    };
    Ok(copy_style(source, Cell::new(value)))
}

/// `destination` with the style of `source`.
pub fn copy_style(source: &Cell, destination: Cell) -> Cell {
    destination.with_style(source.style.clone())
}

/// Propagate the sheet cell at `from` onto `to` and write it.
pub(crate) fn propagate_within(
    sheet: &mut Sheet,
    from: (usize, usize),
    to: (usize, usize),
    mode: TranslationMode,
) -> Result<()> {
    let offset = Offset::between(address(from), address(to));
    let cell = propagate(sheet.cell(from.0, from.1), offset, mode)
        .map_err(|source| ReportError::formula_at(sheet.name(), address(to).to_a1(), source))?;
    sheet.set_cell(to.0, to.1, cell);
    Ok(())
}

/// Write `value` at `to`, styled like the cell at `style_from`.
pub(crate) fn write_styled(
    sheet: &mut Sheet,
    style_from: (usize, usize),
    to: (usize, usize),
    value: impl Into<CellValue>,
) {
    let cell = copy_style(sheet.cell(style_from.0, style_from.1), Cell::new(value));
    sheet.set_cell(to.0, to.1, cell);
}

pub(crate) fn address((row, col): (usize, usize)) -> CellAddress {
    CellAddress::new(row as u32, col as u32)
}
