//! The parsed incoming record set.

use std::collections::HashMap;

/// Headers plus rows parsed from one input payload.
///
/// Immutable once built. Rows may be shorter or longer than the header
/// row; name-based lookups treat missing cells as empty strings, and with
/// duplicate header names the last column wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    positions: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            headers,
            rows,
            positions,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column position of `name`, if it is a header.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Cell of row `row` under header `name`, or `""` when absent.
    pub fn value(&self, row: usize, name: &str) -> &str {
        self.position(name)
            .and_then(|col| self.rows.get(row).and_then(|r| r.get(col)))
            .map_or("", String::as_str)
    }

    /// Identity tuple of row `row` over `fields`.
    pub fn identity<'a, I>(&self, row: usize, fields: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        fields
            .into_iter()
            .map(|field| self.value(row, field).to_string())
            .collect()
    }

    /// Row `row` laid out in `target` column order, `""` for columns the
    /// input lacks.
    pub fn project(&self, row: usize, target: &[String]) -> Vec<String> {
        target
            .iter()
            .map(|h| self.value(row, h).to_string())
            .collect()
    }
}
