use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use casegrid_primitives::address::{column_index_to_letter, column_letter_to_index, desanitize_sheet_name};
use casegrid_primitives::MAX_ROW_COUNT;

use crate::error::{FormulaError, Result};

/// One component of an A1 reference. `index` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub index: u32,
    pub absolute: bool,
}

impl Coord {
    pub fn relative(index: u32) -> Self {
        Self {
            index,
            absolute: false,
        }
    }

    pub fn absolute(index: u32) -> Self {
        Self {
            index,
            absolute: true,
        }
    }
}

/// One side of a reference: a cell, a whole column (`$C`) or a whole row (`5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Cell { col: Coord, row: Coord },
    Column(Coord),
    Row(Coord),
}

impl Endpoint {
    pub fn column(&self) -> Option<Coord> {
        match self {
            Endpoint::Cell { col, .. } | Endpoint::Column(col) => Some(*col),
            Endpoint::Row(_) => None,
        }
    }

    pub fn row(&self) -> Option<Coord> {
        match self {
            Endpoint::Cell { row, .. } | Endpoint::Row(row) => Some(*row),
            Endpoint::Column(_) => None,
        }
    }

    /// Rebuild the endpoint with its column and row components mapped.
    pub(crate) fn try_map<C, R>(self, mut on_col: C, mut on_row: R) -> Result<Self>
    where
        C: FnMut(Coord) -> Result<Coord>,
        R: FnMut(Coord) -> Result<Coord>,
    {
        Ok(match self {
            Endpoint::Cell { col, row } => Endpoint::Cell {
                col: on_col(col)?,
                row: on_row(row)?,
            },
            Endpoint::Column(col) => Endpoint::Column(on_col(col)?),
            Endpoint::Row(row) => Endpoint::Row(on_row(row)?),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollar = |abs: bool| if abs { "$" } else { "" };
        match self {
            Endpoint::Cell { col, row } => write!(
                f,
                "{}{}{}{}",
                dollar(col.absolute),
                column_index_to_letter(col.index),
                dollar(row.absolute),
                row.index + 1
            ),
            Endpoint::Column(col) => {
                write!(f, "{}{}", dollar(col.absolute), column_index_to_letter(col.index))
            }
            Endpoint::Row(row) => write!(f, "{}{}", dollar(row.absolute), row.index + 1),
        }
    }
}

/// Sheet qualifier of a reference, kept exactly as written (quotes included).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetPrefix {
    raw: String,
}

impl SheetPrefix {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Unquoted sheet name.
    pub fn name(&self) -> String {
        desanitize_sheet_name(&self.raw)
    }

    /// Sheet names compare case-insensitively, as in Excel.
    pub fn matches(&self, sheet: &str) -> bool {
        self.name().to_lowercase() == sheet.to_lowercase()
    }
}

/// A cell or range reference inside a formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub sheet: Option<SheetPrefix>,
    pub start: Endpoint,
    pub end: Option<Endpoint>,
}

impl Reference {
    pub fn is_range(&self) -> bool {
        self.end.is_some()
    }

    /// Whether this reference addresses `target`, given the formula lives on `home`.
    pub fn points_at(&self, home: &str, target: &str) -> bool {
        match &self.sheet {
            Some(prefix) => prefix.matches(target),
            None => home.to_lowercase() == target.to_lowercase(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", sheet.raw)?;
        }
        write!(f, "{}", self.start)?;
        if let Some(end) = &self.end {
            write!(f, ":{end}")?;
        }
        Ok(())
    }
}

/// A piece of formula source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Reference(Reference),
}

/// A formula split into text and reference segments.
///
/// Concatenating the segments reproduces the source, except that column
/// letters are upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    segments: Vec<Segment>,
}

impl Formula {
    /// Parse a formula source (with or without the leading `=`).
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut pos = 0;

        while let Some(ch) = source[pos..].chars().next() {
            let rest = &source[pos..];

            if ch == '"' {
                let len = string_literal_len(rest).ok_or_else(|| {
                    FormulaError::UnterminatedString {
                        formula: source.to_string(),
                    }
                })?;
                text.push_str(&rest[..len]);
                pos += len;
                continue;
            }

            if is_word_char(ch) || ch == '\'' {
                if let Some((reference, len)) = scan_reference(rest) {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Reference(reference));
                    pos += len;
                    continue;
                }
                // Consume the whole word so the next attempt starts on a boundary.
                let len = if ch == '\'' {
                    ch.len_utf8()
                } else {
                    word_len(rest)
                };
                text.push_str(&rest[..len]);
                pos += len;
                continue;
            }

            text.push(ch);
            pos += ch.len_utf8();
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Reference(reference) => Some(reference),
            Segment::Text(_) => None,
        })
    }

    /// Rebuild the formula with every reference passed through `f`.
    pub(crate) fn try_map_references<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&Reference) -> Result<Reference>,
    {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => Ok(Segment::Text(text.clone())),
                Segment::Reference(reference) => f(reference).map(Segment::Reference),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::Reference(reference) => write!(f, "{reference}")?,
            }
        }
        Ok(())
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '.' | '$')
}

fn word_len(rest: &str) -> usize {
    rest.char_indices()
        .find(|(_, ch)| !is_word_char(*ch))
        .map_or(rest.len(), |(idx, _)| idx)
}

/// Length of a `"..."` literal at the start of `rest`, honouring `""` escapes.
fn string_literal_len(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1).peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '"' {
            if matches!(chars.peek(), Some((_, '"'))) {
                chars.next();
                continue;
            }
            return Some(idx + 1);
        }
    }
    None
}

fn scan_reference(rest: &str) -> Option<(Reference, usize)> {
    let (sheet, prefix_len) = match sheet_prefix_regex().captures(rest) {
        Some(caps) => (
            Some(SheetPrefix::new(caps.get(1)?.as_str())),
            caps.get(0)?.end(),
        ),
        None => (None, 0),
    };

    let (start, end, body_len) = scan_body(&rest[prefix_len..])?;
    let len = prefix_len + body_len;

    if let Some(next) = rest[len..].chars().next() {
        if is_word_char(next) || matches!(next, '(' | '!') {
            return None;
        }
    }

    Some((Reference { sheet, start, end }, len))
}

fn scan_body(body: &str) -> Option<(Endpoint, Option<Endpoint>, usize)> {
    if let Some(caps) = cell_range_regex().captures(body) {
        let start = cell_endpoint(&caps, 1)?;
        let end = match caps.get(5) {
            Some(_) => Some(cell_endpoint(&caps, 5)?),
            None => None,
        };
        return Some((start, end, caps.get(0)?.end()));
    }

    if let Some(caps) = column_range_regex().captures(body) {
        let start = Endpoint::Column(column_coord(&caps, 1)?);
        let end = Endpoint::Column(column_coord(&caps, 3)?);
        return Some((start, Some(end), caps.get(0)?.end()));
    }

    if let Some(caps) = row_range_regex().captures(body) {
        let start = Endpoint::Row(row_coord(&caps, 1)?);
        let end = Endpoint::Row(row_coord(&caps, 3)?);
        return Some((start, Some(end), caps.get(0)?.end()));
    }

    None
}

fn cell_endpoint(caps: &Captures<'_>, first: usize) -> Option<Endpoint> {
    let col = column_coord(caps, first)?;
    let row = row_coord(caps, first + 2)?;
    Some(Endpoint::Cell { col, row })
}

fn column_coord(caps: &Captures<'_>, first: usize) -> Option<Coord> {
    let absolute = caps.get(first).is_some_and(|m| m.as_str() == "$");
    let index = column_letter_to_index(caps.get(first + 1)?.as_str()).ok()?;
    Some(Coord { index, absolute })
}

fn row_coord(caps: &Captures<'_>, first: usize) -> Option<Coord> {
    let absolute = caps.get(first).is_some_and(|m| m.as_str() == "$");
    let number = caps.get(first + 1)?.as_str().parse::<u32>().ok()?;
    if number == 0 || number > MAX_ROW_COUNT {
        return None;
    }
    Some(Coord {
        index: number - 1,
        absolute,
    })
}

fn sheet_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^('(?:[^']|'')+'|[\p{L}\p{N}_.]+)!").expect("valid regex")
    })
}

fn cell_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\$?)([A-Za-z]{1,3})(\$?)([0-9]{1,7})(?::(\$?)([A-Za-z]{1,3})(\$?)([0-9]{1,7}))?")
            .expect("valid regex")
    })
}

fn column_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\$?)([A-Za-z]{1,3}):(\$?)([A-Za-z]{1,3})").expect("valid regex")
    })
}

fn row_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\$?)([0-9]{1,7}):(\$?)([0-9]{1,7})").expect("valid regex"))
}
