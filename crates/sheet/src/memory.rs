//! In-memory table backend.

use std::collections::HashSet;

use async_trait::async_trait;
use tablesync_core::{SyncError, SyncResult};
use tablesync_primitives::{CellAddress, CellRange};

use crate::source::{normalize_used_range, RangeUpdate, TableSource};

/// A call received by a [`MemoryTable`], with ranges in A1 notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    OpenSession,
    CloseSession,
    UsedRange,
    Append(String),
    Patch(String),
    PatchBatch(Vec<String>),
    Clear,
    AddColumns { start_col: u32, headers: Vec<String> },
    FormatAsTable { rows: usize, cols: usize },
}

/// A grid of strings implementing [`TableSource`].
///
/// Records every call for assertions and can simulate backend quirks:
/// the blank row reported for an empty sheet, rejected row patches and
/// failing table formatting.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    name: String,
    grid: Vec<Vec<String>>,
    calls: Vec<SourceCall>,
    phantom_blank_row: bool,
    failing_rows: HashSet<u32>,
    fail_table_format: bool,
    sessions_opened: usize,
    sessions_closed: usize,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_rows(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            grid: rows,
            ..Self::new(name)
        }
    }

    /// Report one all-blank row while the grid is empty.
    #[must_use]
    pub fn with_phantom_blank_row(mut self) -> Self {
        self.phantom_blank_row = true;
        self
    }

    /// Reject patches whose range starts on 1-based `row_number`.
    #[must_use]
    pub fn fail_patches_on_row(mut self, row_number: u32) -> Self {
        self.failing_rows.insert(row_number);
        self
    }

    #[must_use]
    pub fn fail_table_format(mut self) -> Self {
        self.fail_table_format = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current contents with trailing blank rows removed, without logging a call.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        let mut rows = self.grid.clone();
        while rows
            .last()
            .is_some_and(|row| row.iter().all(String::is_empty))
        {
            rows.pop();
        }
        rows
    }

    pub fn calls(&self) -> &[SourceCall] {
        &self.calls
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed
    }

    pub(crate) fn replace_grid(&mut self, rows: Vec<Vec<String>>) {
        self.grid = rows;
    }

    fn write_cells(&mut self, range: &CellRange, values: &[Vec<String>]) {
        let start_row = range.start.row as usize;
        let start_col = range.start.col as usize;
        for (offset, row_values) in values.iter().enumerate() {
            let row_idx = start_row + offset;
            if self.grid.len() <= row_idx {
                self.grid.resize(row_idx + 1, Vec::new());
            }
            let row = &mut self.grid[row_idx];
            if row.len() < start_col + row_values.len() {
                row.resize(start_col + row_values.len(), String::new());
            }
            for (col_offset, value) in row_values.iter().enumerate() {
                row[start_col + col_offset].clone_from(value);
            }
        }
    }

    fn check_row(&self, range: &CellRange) -> SyncResult<()> {
        let row_number = range.start.row_number();
        if self.failing_rows.contains(&row_number) {
            return Err(SyncError::backend_status(
                "patch",
                500,
                format!("simulated failure on row {row_number}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TableSource for MemoryTable {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    async fn open_session(&mut self) -> SyncResult<()> {
        self.calls.push(SourceCall::OpenSession);
        self.sessions_opened += 1;
        Ok(())
    }

    async fn close_session(&mut self) -> SyncResult<()> {
        self.calls.push(SourceCall::CloseSession);
        self.sessions_closed += 1;
        Ok(())
    }

    async fn used_range(&mut self) -> SyncResult<Vec<Vec<String>>> {
        self.calls.push(SourceCall::UsedRange);
        let rows = self.snapshot();
        if rows.is_empty() && self.phantom_blank_row {
            return Ok(normalize_used_range(vec![vec![String::new()]]));
        }
        Ok(normalize_used_range(rows))
    }

    async fn append(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        self.calls.push(SourceCall::Append(range.to_a1()));
        self.write_cells(range, &values);
        Ok(())
    }

    async fn patch(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        self.calls.push(SourceCall::Patch(range.to_a1()));
        self.check_row(range)?;
        self.write_cells(range, &values);
        Ok(())
    }

    async fn patch_batch(&mut self, updates: Vec<RangeUpdate>) -> SyncResult<Vec<SyncResult<()>>> {
        self.calls.push(SourceCall::PatchBatch(
            updates.iter().map(|u| u.range.to_a1()).collect(),
        ));
        Ok(updates
            .into_iter()
            .map(|update| {
                self.check_row(&update.range)?;
                self.write_cells(&update.range, &update.values);
                Ok(())
            })
            .collect())
    }

    async fn clear(&mut self) -> SyncResult<()> {
        self.calls.push(SourceCall::Clear);
        self.grid.clear();
        Ok(())
    }

    async fn add_columns(&mut self, start_col: u32, headers: Vec<String>) -> SyncResult<()> {
        self.calls.push(SourceCall::AddColumns {
            start_col,
            headers: headers.clone(),
        });
        let range = CellRange::with_size(CellAddress::from_numbers(1, start_col)?, 1, headers.len())?;
        self.write_cells(&range, &[headers]);
        Ok(())
    }

    async fn format_as_table(&mut self, rows: usize, cols: usize) -> SyncResult<()> {
        self.calls.push(SourceCall::FormatAsTable { rows, cols });
        if self.fail_table_format {
            return Err(SyncError::backend("format_as_table", "simulated failure"));
        }
        Ok(())
    }
}
