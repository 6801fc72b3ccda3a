use crate::error::{Result, SheetError};
use crate::sheet::{insertion, Sheet};
use casegrid_formulas::Axis;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A book containing multiple sheets (preserves insertion order)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BookRepr", into = "BookRepr")]
pub struct Book {
    sheets: IndexMap<String, Sheet>,
}

/// On-disk shape: sheets as an ordered list, each carrying its own name.
#[derive(Serialize, Deserialize)]
struct BookRepr {
    sheets: Vec<Sheet>,
}

impl TryFrom<BookRepr> for Book {
    type Error = SheetError;

    fn try_from(repr: BookRepr) -> Result<Self> {
        let mut book = Book::new();
        for sheet in repr.sheets {
            let name = sheet.name().to_string();
            book.add_sheet(&name, sheet)?;
        }
        Ok(book)
    }
}

impl From<Book> for BookRepr {
    fn from(book: Book) -> Self {
        BookRepr {
            sheets: book.sheets.into_values().collect(),
        }
    }
}

impl Book {
    /// Create a new empty book
    #[must_use]
    pub fn new() -> Self {
        Book {
            sheets: IndexMap::new(),
        }
    }

    /// Get the number of sheets
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get all sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Check if a sheet exists
    #[must_use]
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    // ===== Sheet Access =====

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .get(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Get a mutable sheet by name
    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Iterate over sheets in order
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(name, sheet)| (name.as_str(), sheet))
    }

    // ===== Sheet Management =====

    /// Add a sheet to the book
    pub fn add_sheet(&mut self, name: &str, sheet: Sheet) -> Result<()> {
        if self.sheets.contains_key(name) {
            return Err(SheetError::SheetAlreadyExists {
                name: name.to_string(),
            });
        }

        let mut sheet = sheet;
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    // ===== Structure =====

    /// Insert blank columns into `sheet` and rewrite every reference in the
    /// book that points at or past the insertion point on that sheet.
    pub fn insert_columns(&mut self, sheet: &str, at: usize, count: usize) -> Result<()> {
        self.insert(sheet, Axis::Column, at, count)
    }

    /// Row counterpart of [`Book::insert_columns`].
    pub fn insert_rows(&mut self, sheet: &str, at: usize, count: usize) -> Result<()> {
        self.insert(sheet, Axis::Row, at, count)
    }

    fn insert(&mut self, target: &str, axis: Axis, at: usize, count: usize) -> Result<()> {
        let shift = insertion(axis, at, count)?;
        let owner = self.get_sheet_mut(target)?;
        match axis {
            Axis::Column => owner.insert_columns(at, count)?,
            Axis::Row => owner.insert_rows(at, count)?,
        }
        for (name, sheet) in &mut self.sheets {
            if name != target {
                sheet.adjust_references(target, shift)?;
            }
        }
        tracing::debug!(sheet = target, ?axis, at, count, "inserted blank cells");
        Ok(())
    }
}
