//! A1 column-letter and sheet-name helpers.

use crate::{AddressError, MAX_COLUMN_COUNT};

/// Convert column index to letters (0 -> A, 25 -> Z, 26 -> AA, etc.).
pub fn column_index_to_letter(index: u32) -> String {
    let mut letters = Vec::new();
    let mut index = index + 1;
    while index > 0 {
        let rem = ((index - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Convert column letters to index (A -> 0, Z -> 25, AA -> 26, etc.). Case-insensitive.
pub fn column_letter_to_index(letters: &str) -> Result<u32, AddressError> {
    if letters.is_empty() {
        return Err(AddressError::InvalidColumn(letters.to_string()));
    }
    let mut result: u32 = 0;
    for ch in letters.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return Err(AddressError::InvalidColumn(letters.to_string()));
        }
        let value = u32::from(upper as u8 - b'A' + 1);
        result = result
            .checked_mul(26)
            .and_then(|v| v.checked_add(value))
            .ok_or_else(|| AddressError::InvalidColumn(letters.to_string()))?;
    }
    if result > MAX_COLUMN_COUNT {
        return Err(AddressError::InvalidColumn(letters.to_string()));
    }
    Ok(result - 1)
}

/// Remove surrounding single quotes from a sheet name and unescape doubled quotes.
pub fn desanitize_sheet_name(name: &str) -> String {
    let trimmed = name.strip_prefix('\'').unwrap_or(name);
    let trimmed = trimmed.strip_suffix('\'').unwrap_or(trimmed);
    trimmed.replace("''", "'")
}
