//! Column-letter arithmetic and sheet-qualified range formatting.

use crate::{AddressError, CellRange};

/// Rows in a worksheet (Excel and Google Sheets share this limit).
pub const MAX_ROW_COUNT: u32 = 1_048_576;
/// Columns in a worksheet, `A` through `XFD`.
pub const MAX_COLUMN_COUNT: u32 = 16_384;

/// Convert a 1-based column number to letters (`1 -> A`, `26 -> Z`, `27 -> AA`).
///
/// Column `0` has no letter form and yields an empty string.
pub fn column_letter(number: u32) -> String {
    let mut n = number;
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

/// Convert column letters to a 1-based column number (`A -> 1`, `aa -> 27`).
pub fn column_number(letters: &str) -> Result<u32, AddressError> {
    let letters = letters.trim();
    if letters.is_empty() {
        return Err(AddressError::InvalidColumn("Empty column".to_string()));
    }
    let mut result: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(AddressError::InvalidColumn(letters.to_string()));
        }
        let value = u32::from(ch.to_ascii_uppercase() as u8 - b'A' + 1);
        result = result
            .checked_mul(26)
            .and_then(|r| r.checked_add(value))
            .ok_or_else(|| AddressError::InvalidColumn(letters.to_string()))?;
    }
    Ok(result)
}

/// Quote a sheet name when it contains anything but ASCII alphanumerics.
pub fn sanitize_sheet_name(name: &str) -> String {
    if name.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return format!("'{}'", name.replace('\'', "''"));
    }
    name.to_string()
}

/// Format a range with its sheet prefix, e.g. `'Sales Data'!A1:B2`.
pub fn qualified_range(sheet_name: &str, range: &CellRange) -> String {
    format!("{}!{}", sanitize_sheet_name(sheet_name), range.to_a1())
}
