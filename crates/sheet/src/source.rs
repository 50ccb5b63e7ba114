//! The table backend seam.
//!
//! The engine drives a [`TableSource`] strictly sequentially: one call is
//! awaited before the next is issued, and every call of one write happens
//! inside a single `open_session`/`close_session` bracket.

use async_trait::async_trait;
use tablesync_core::SyncResult;
use tablesync_primitives::CellRange;

/// One rectangular write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeUpdate {
    pub range: CellRange,
    pub values: Vec<Vec<String>>,
}

impl RangeUpdate {
    pub fn new(range: CellRange, values: Vec<Vec<String>>) -> Self {
        Self { range, values }
    }
}

/// A remote (or local) table the engine reads from and writes to.
///
/// Row 1 holds headers. Values are plain strings; `""` is an empty cell.
#[async_trait]
pub trait TableSource: Send {
    /// Short human-readable name for log lines.
    fn describe(&self) -> String;

    /// Start a backend session. Sessionless backends keep the default.
    async fn open_session(&mut self) -> SyncResult<()> {
        Ok(())
    }

    /// End the session opened by [`TableSource::open_session`].
    async fn close_session(&mut self) -> SyncResult<()> {
        Ok(())
    }

    /// Current contents, header row first.
    ///
    /// Implementations pass their raw result through
    /// [`normalize_used_range`] so a visually empty sheet is `[]`.
    async fn used_range(&mut self) -> SyncResult<Vec<Vec<String>>>;

    /// Write `values` as new rows starting at `range`.
    async fn append(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()>;

    /// Overwrite the cells of `range` with `values`.
    async fn patch(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()>;

    /// Apply several patches, reporting each range's result in order.
    ///
    /// An outer `Err` means the whole batch was rejected.
    async fn patch_batch(&mut self, updates: Vec<RangeUpdate>) -> SyncResult<Vec<SyncResult<()>>> {
        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            results.push(self.patch(&update.range, update.values).await);
        }
        Ok(results)
    }

    /// Empty every cell of the sheet.
    async fn clear(&mut self) -> SyncResult<()>;

    /// Write `headers` into row 1 starting at 1-based column `start_col`.
    async fn add_columns(&mut self, start_col: u32, headers: Vec<String>) -> SyncResult<()>;

    /// Style the top-left `rows` x `cols` block as a table with a header row.
    async fn format_as_table(&mut self, _rows: usize, _cols: usize) -> SyncResult<()> {
        Ok(())
    }
}

/// Collapse the single all-blank row some backends report for an empty
/// sheet into no rows at all.
pub fn normalize_used_range(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    if rows.len() == 1 && rows[0].iter().all(String::is_empty) {
        return Vec::new();
    }
    rows
}

/// Pad every row with `""` to the widest row (at least `min_width`).
pub fn rectangular(mut rows: Vec<Vec<String>>, min_width: usize) -> (Vec<Vec<String>>, usize) {
    let width = rows
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(min_width)
        .max(1);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    (rows, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_blank_single_row() {
        assert!(normalize_used_range(vec![vec![String::new(), String::new()]]).is_empty());
        assert!(normalize_used_range(vec![vec![]]).is_empty());
        assert!(normalize_used_range(Vec::new()).is_empty());
    }

    #[test]
    fn test_normalize_keeps_real_rows() {
        let rows = vec![vec!["id".to_string()]];
        assert_eq!(normalize_used_range(rows.clone()), rows);

        let blank_pair = vec![vec![String::new()], vec![String::new()]];
        assert_eq!(normalize_used_range(blank_pair.clone()), blank_pair);
    }

    #[test]
    fn test_rectangular_pads_short_rows() {
        let (rows, width) = rectangular(
            vec![vec!["a".into(), "b".into(), "c".into()], vec!["1".into()]],
            2,
        );
        assert_eq!(width, 3);
        assert_eq!(rows[1], vec!["1".to_string(), String::new(), String::new()]);
    }
}
