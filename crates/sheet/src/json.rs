//! JSON persistence for [`Book`]
//!
//! The JSON form is the lossless workbook format: values, formulas, styles
//! and conditional rules all survive a round trip.

use crate::book::Book;
use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

impl Book {
    /// Load a book from a JSON file
    ///
    /// # Example
    /// ```no_run
    /// use casegrid_sheet::Book;
    ///
    /// let book = Book::from_json_file("report.json").unwrap();
    /// println!("{:?}", book.sheet_names());
    /// ```
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Load a book from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize the book as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the book to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellStyle, CellValue, Rgb};
    use crate::conditional::ConditionalRule;
    use crate::sheet::Sheet;
    use casegrid_primitives::CellRange;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample() -> Book {
        let mut sheet = Sheet::with_name("дельта за сутки");
        sheet.set_value(0, 1, NaiveDate::from_ymd_opt(2021, 1, 3).unwrap());
        sheet.set_style(0, 1, Some(CellStyle::default().with_number_format("DD.MM")));
        sheet.set_value(2, 1, CellValue::formula("=Прирост!C3-Прирост!B3"));
        sheet.add_conditional_format(ConditionalRule::new(
            CellRange::from_a1("B3:B87").unwrap(),
            "B3<0",
            Rgb::from_hex("E4EFDC").unwrap(),
        ));
        let mut book = Book::new();
        book.add_sheet("дельта за сутки", sheet).unwrap();
        book
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let book = sample();
        book.save_json(&path).unwrap();
        let loaded = Book::from_json_file(&path).unwrap();
        assert_eq!(loaded, book);
    }

    #[test]
    fn test_rejects_duplicate_sheet_names() {
        let json = r#"{"sheets":[{"name":"a"},{"name":"a"}]}"#;
        assert!(Book::from_json_str(json).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = Book::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, crate::error::SheetError::Io(_)));
    }
}
