//! # tablesync-primitives
//!
//! Spreadsheet addressing primitives shared by the reconciliation engine
//! and its backends: cell addresses, rectangular ranges, and 1-based
//! column-letter arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod address;

pub use address::{
    column_letter, column_number, qualified_range, sanitize_sheet_name, MAX_COLUMN_COUNT,
    MAX_ROW_COUNT,
};

/// Errors raised while parsing A1-style references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid column reference: {0}")]
    InvalidColumn(String),

    #[error("Invalid row reference: {0}")]
    InvalidRow(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

/// A cell address, stored 0-based (`A1` is row 0, col 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// The top-left cell.
    pub const A1: Self = Self { row: 0, col: 0 };

    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Address from 1-based row and column numbers, as spreadsheets count them.
    ///
    /// Zero is clamped to the first row/column. Numbers past the sheet limits
    /// are rejected.
    pub fn from_numbers(row_number: u32, column_number: u32) -> Result<Self, AddressError> {
        if row_number > MAX_ROW_COUNT {
            return Err(AddressError::InvalidRow(format!(
                "row {row_number} exceeds the sheet limit of {MAX_ROW_COUNT}"
            )));
        }
        if column_number > MAX_COLUMN_COUNT {
            return Err(AddressError::InvalidColumn(format!(
                "column {column_number} exceeds the sheet limit of {MAX_COLUMN_COUNT}"
            )));
        }
        Ok(Self {
            row: row_number.saturating_sub(1),
            col: column_number.saturating_sub(1),
        })
    }

    /// Parse from A1 notation (`A1`, `b12`, `$C$3`).
    ///
    /// Column letters are case-insensitive. Row `0` and trailing garbage are
    /// rejected.
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AddressError::InvalidRange("Empty A1 reference".to_string()));
        }

        let mut chars = trimmed.chars().peekable();

        if matches!(chars.peek(), Some('$')) {
            chars.next();
        }

        let mut col_letters = String::new();
        while let Some(ch) = chars.peek().copied() {
            if ch.is_ascii_alphabetic() {
                col_letters.push(ch);
                chars.next();
            } else {
                break;
            }
        }

        if col_letters.is_empty() {
            return Err(AddressError::InvalidColumn(trimmed.to_string()));
        }

        if matches!(chars.peek(), Some('$')) {
            chars.next();
        }

        let mut row_digits = String::new();
        while let Some(ch) = chars.peek().copied() {
            if ch.is_ascii_digit() {
                row_digits.push(ch);
                chars.next();
            } else {
                break;
            }
        }

        if row_digits.is_empty() || chars.peek().is_some() {
            return Err(AddressError::InvalidRow(trimmed.to_string()));
        }

        let row_num: u32 = row_digits
            .parse()
            .map_err(|_| AddressError::InvalidRow(row_digits.clone()))?;
        if row_num == 0 {
            return Err(AddressError::InvalidRow(row_digits));
        }

        let col_num = column_number(&col_letters)?;
        Self::from_numbers(row_num, col_num)
    }

    /// 1-based row number.
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }

    /// 1-based column number.
    pub fn column_number(&self) -> u32 {
        self.col + 1
    }

    /// Convert to A1 notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letter(self.column_number()), self.row_number())
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// A rectangular range of cells (e.g. `A2:D2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self { start, end }
    }

    /// Range anchored at `start` that spans `rows` x `cols` cells.
    ///
    /// Zero dimensions collapse to a single row or column. A range that would
    /// run past the last row or column of a sheet is rejected.
    pub fn with_size(start: CellAddress, rows: usize, cols: usize) -> Result<Self, AddressError> {
        let overflow = || {
            AddressError::InvalidRange(format!(
                "{rows}x{cols} cells starting at {start} exceed the sheet limits"
            ))
        };
        let end_row = u32::try_from(rows.max(1))
            .ok()
            .and_then(|n| start.row_number().checked_add(n - 1))
            .ok_or_else(overflow)?;
        let end_col = u32::try_from(cols.max(1))
            .ok()
            .and_then(|n| start.column_number().checked_add(n - 1))
            .ok_or_else(overflow)?;
        let end = CellAddress::from_numbers(end_row, end_col).map_err(|_| overflow())?;
        Ok(Self { start, end })
    }

    /// One full row `A{row}:{last_col}{row}`, with 1-based numbers.
    pub fn row_span(row_number: u32, width: usize) -> Result<Self, AddressError> {
        Self::with_size(CellAddress::from_numbers(row_number, 1)?, 1, width)
    }

    /// Parse `A1:C3` or a single cell `B2`.
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        match s.split_once(':') {
            Some((start, end)) => Ok(Self::new(
                CellAddress::from_a1(start)?,
                CellAddress::from_a1(end)?,
            )
            .normalized()),
            None => {
                let cell = CellAddress::from_a1(s)?;
                Ok(Self::new(cell, cell))
            }
        }
    }

    /// Return a normalized range where start <= end
    pub fn normalized(&self) -> Self {
        Self {
            start: CellAddress::new(
                self.start.row.min(self.end.row),
                self.start.col.min(self.end.col),
            ),
            end: CellAddress::new(
                self.start.row.max(self.end.row),
                self.start.col.max(self.end.col),
            ),
        }
    }

    /// Convert to `A1:B2` notation.
    pub fn to_a1(&self) -> String {
        let range = self.normalized();
        format!("{}:{}", range.start.to_a1(), range.end.to_a1())
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_a1_basic() {
        let addr = CellAddress::from_a1("A1").unwrap();
        assert_eq!(addr, CellAddress::new(0, 0));

        let addr = CellAddress::from_a1("AB12").unwrap();
        assert_eq!(addr.row_number(), 12);
        assert_eq!(addr.column_number(), 28);
    }

    #[test]
    fn test_from_a1_case_insensitive() {
        assert_eq!(
            CellAddress::from_a1("c5").unwrap(),
            CellAddress::from_a1("C5").unwrap()
        );
    }

    #[test]
    fn test_from_a1_absolute_markers() {
        assert_eq!(
            CellAddress::from_a1("$B$2").unwrap(),
            CellAddress::new(1, 1)
        );
    }

    #[test]
    fn test_from_a1_rejects_garbage() {
        assert!(matches!(
            CellAddress::from_a1(""),
            Err(AddressError::InvalidRange(_))
        ));
        assert!(matches!(
            CellAddress::from_a1("12"),
            Err(AddressError::InvalidColumn(_))
        ));
        assert!(matches!(
            CellAddress::from_a1("A"),
            Err(AddressError::InvalidRow(_))
        ));
        assert!(matches!(
            CellAddress::from_a1("A0"),
            Err(AddressError::InvalidRow(_))
        ));
        assert!(CellAddress::from_a1("A1B").is_err());
        assert!(CellAddress::from_a1("not a cell").is_err());
    }

    #[test]
    fn test_to_a1() {
        assert_eq!(CellAddress::new(4, 27).to_a1(), "AB5");
        assert_eq!(CellAddress::from_numbers(1, 1).unwrap().to_string(), "A1");
        assert_eq!(CellAddress::A1.to_a1(), "A1");
    }

    #[test]
    fn test_range_with_size() {
        let range = CellRange::with_size(CellAddress::from_a1("B3").unwrap(), 2, 3).unwrap();
        assert_eq!(range.to_a1(), "B3:D4");
        assert_eq!(range.end, CellAddress::new(3, 3));
    }

    #[test]
    fn test_row_span() {
        assert_eq!(CellRange::row_span(7, 4).unwrap().to_a1(), "A7:D7");
        assert_eq!(CellRange::row_span(2, 0).unwrap().to_a1(), "A2:A2");
    }

    #[test]
    fn test_from_a1_sheet_limits() {
        let last = CellAddress::from_a1("XFD1048576").unwrap();
        assert_eq!(last.row_number(), MAX_ROW_COUNT);
        assert_eq!(last.column_number(), MAX_COLUMN_COUNT);

        assert!(matches!(
            CellAddress::from_a1("A1048577"),
            Err(AddressError::InvalidRow(_))
        ));
        assert!(matches!(
            CellAddress::from_a1("A4294967295"),
            Err(AddressError::InvalidRow(_))
        ));
        assert!(matches!(
            CellAddress::from_a1("XFE1"),
            Err(AddressError::InvalidColumn(_))
        ));
        assert!(matches!(
            CellAddress::from_a1("FXSHRXW1"),
            Err(AddressError::InvalidColumn(_))
        ));
        assert!(CellAddress::from_numbers(MAX_ROW_COUNT + 1, 1).is_err());
        assert!(CellAddress::from_numbers(1, MAX_COLUMN_COUNT + 1).is_err());
    }

    #[test]
    fn test_range_with_size_sheet_limits() {
        let bottom = CellAddress::from_a1("A1048576").unwrap();
        assert_eq!(
            CellRange::with_size(bottom, 1, 1).unwrap().to_a1(),
            "A1048576:A1048576"
        );
        assert!(matches!(
            CellRange::with_size(bottom, 2, 1),
            Err(AddressError::InvalidRange(_))
        ));

        let right = CellAddress::from_a1("XFD1").unwrap();
        assert!(CellRange::with_size(right, 1, 2).is_err());
        assert!(CellRange::with_size(CellAddress::A1, usize::MAX, 1).is_err());
        assert!(CellRange::row_span(MAX_ROW_COUNT + 1, 3).is_err());
    }

    #[test]
    fn test_range_from_a1_normalizes() {
        let range = CellRange::from_a1("C3:A1").unwrap();
        assert_eq!(range.to_a1(), "A1:C3");

        let single = CellRange::from_a1("B2").unwrap();
        assert_eq!(single.start, single.end);
        assert_eq!(single.to_a1(), "B2:B2");
    }
}
