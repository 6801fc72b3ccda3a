use crate::book::Book;
use crate::cell::{Cell, CellStyle, CellValue, FormulaCell, HorizontalAlign};
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{
    Color, ConditionalFormatFormula, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Number format applied to dates that carry no explicit style.
const DEFAULT_DATE_FORMAT: &str = "DD.MM.YYYY";

fn xlsx_error<E: Display>(e: E) -> SheetError {
    SheetError::Xlsx(e.to_string())
}

/// Day zero of the Excel 1900 date system (with the leap-year bug folded in).
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

fn date_to_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if serial.fract() != 0.0 || serial < 1.0 {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::days(serial as i64))
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::from_metric(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            serial_to_date(serial).map_or(CellValue::Float(serial), CellValue::Date)
        }
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map_or_else(|| CellValue::String(s.clone()), CellValue::Date),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

fn style_to_format(style: Option<&CellStyle>, value: &CellValue) -> Option<Format> {
    let is_date = matches!(value.cached_or_self(), CellValue::Date(_));
    if style.is_none() && !is_date {
        return None;
    }
    let mut format = Format::new();
    let style = style.cloned().unwrap_or_default();
    match style.number_format.as_deref() {
        Some(num_format) => format = format.set_num_format(num_format),
        None if is_date => format = format.set_num_format(DEFAULT_DATE_FORMAT),
        None => {}
    }
    if style.bold {
        format = format.set_bold();
    }
    if style.italic {
        format = format.set_italic();
    }
    if let Some(color) = style.font_color {
        format = format.set_font_color(Color::RGB(color.value()));
    }
    if let Some(fill) = style.fill {
        format = format.set_background_color(Color::RGB(fill.value()));
    }
    if style.border {
        format = format.set_border(FormatBorder::Thin);
    }
    if let Some(align) = style.align {
        format = format.set_align(match align {
            HorizontalAlign::Left => FormatAlign::Left,
            HorizontalAlign::Center => FormatAlign::Center,
            HorizontalAlign::Right => FormatAlign::Right,
        });
    }
    Some(format)
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    let format = style_to_format(cell.style.as_ref(), &cell.value).unwrap_or_else(Format::new);
    match &cell.value {
        CellValue::Null => {
            if cell.style.is_some() {
                worksheet.write_blank(row, col, &format).map_err(xlsx_error)?;
            }
        }
        CellValue::Bool(b) => {
            worksheet
                .write_boolean_with_format(row, col, *b, &format)
                .map_err(xlsx_error)?;
        }
        CellValue::Int(i) => {
            // Note: Excel stores all numbers as f64, so integers > 2^53 may lose precision
            worksheet
                .write_number_with_format(row, col, *i as f64, &format)
                .map_err(xlsx_error)?;
        }
        CellValue::Float(f) => {
            worksheet
                .write_number_with_format(row, col, *f, &format)
                .map_err(xlsx_error)?;
        }
        CellValue::Date(d) => {
            worksheet
                .write_number_with_format(row, col, date_to_serial(*d), &format)
                .map_err(xlsx_error)?;
        }
        CellValue::String(s) => {
            worksheet
                .write_string_with_format(row, col, s, &format)
                .map_err(xlsx_error)?;
        }
        CellValue::Formula(formula) => {
            worksheet
                .write_formula_with_format(row, col, formula.source.as_str(), &format)
                .map_err(xlsx_error)?;
        }
    }
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    worksheet.set_name(sheet.name()).map_err(xlsx_error)?;

    for (row_idx, row) in sheet.rows().enumerate() {
        let row_num = u32::try_from(row_idx).map_err(|_| xlsx_error("Row index overflow"))?;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = u16::try_from(col_idx).map_err(|_| xlsx_error("Column index overflow"))?;
            write_cell(worksheet, row_num, col_num, cell)?;
        }
    }

    for rule in sheet.conditional_formats() {
        let fill = Format::new().set_background_color(Color::RGB(rule.fill.value()));
        let conditional = ConditionalFormatFormula::new()
            .set_rule(format!("={}", rule.expression).as_str())
            .set_format(fill);
        let range = rule.range;
        let first_col = u16::try_from(range.start.col).map_err(|_| xlsx_error("Column index overflow"))?;
        let last_col = u16::try_from(range.end.col).map_err(|_| xlsx_error("Column index overflow"))?;
        worksheet
            .add_conditional_format(range.start.row, first_col, range.end.row, last_col, &conditional)
            .map_err(xlsx_error)?;
    }
    Ok(())
}

fn read_sheet(workbook: &mut Xlsx<BufReader<File>>, sheet_name: &str) -> Result<Sheet> {
    let mut sheet = Sheet::with_name(sheet_name);

    let values = workbook
        .worksheet_range(sheet_name)
        .map_err(|e: XlsxError| xlsx_error(e))?;
    if let Some((start_row, start_col)) = values.start() {
        for (row, col, data) in values.used_cells() {
            sheet.set_value(
                start_row as usize + row,
                start_col as usize + col,
                data_to_cell_value(data),
            );
        }
    }

    let formulas = workbook
        .worksheet_formula(sheet_name)
        .map_err(|e: XlsxError| xlsx_error(e))?;
    if let Some((start_row, start_col)) = formulas.start() {
        for (row, col, source) in formulas.used_cells() {
            if source.is_empty() {
                continue;
            }
            let (row, col) = (start_row as usize + row, start_col as usize + col);
            let cached = sheet.value(row, col).clone();
            let source = if source.starts_with('=') {
                source.clone()
            } else {
                format!("={source}")
            };
            sheet.set_value(
                row,
                col,
                CellValue::Formula(FormulaCell {
                    source,
                    cached: (!cached.is_null()).then(|| Box::new(cached)),
                }),
            );
        }
    }

    Ok(sheet)
}

impl Book {
    /// Load a book from an Excel file (all sheets)
    ///
    /// Import is lossy: values, dates and formulas (with their cached
    /// results) are read, styles and conditional rules are not.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook: Xlsx<BufReader<File>> =
            open_workbook(path.as_ref()).map_err(|e: XlsxError| xlsx_error(e))?;

        let sheet_names: Vec<String> = workbook.sheet_names().iter().map(|s| s.to_string()).collect();
        let mut book = Book::new();

        for sheet_name in sheet_names {
            let sheet = read_sheet(&mut workbook, &sheet_name)?;
            book.add_sheet(&sheet_name, sheet)?;
        }

        tracing::debug!(path = %path.as_ref().display(), sheets = book.sheet_count(), "imported xlsx");
        Ok(book)
    }

    /// Save the book to an Excel file, styles and conditional rules included
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = Workbook::new();

        for (_, sheet) in self.sheets() {
            let worksheet = workbook.add_worksheet();
            write_sheet(worksheet, sheet)?;
        }

        workbook.save(path.as_ref()).map_err(xlsx_error)?;
        Ok(())
    }
}
