//! CSV-file table backend.
//!
//! The file is read when the session opens and written back when it
//! closes, so one engine write is one read plus one save.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tablesync_core::{SyncError, SyncResult};
use tablesync_primitives::CellRange;

use crate::memory::MemoryTable;
use crate::source::{RangeUpdate, TableSource};

/// A local CSV file treated as a single sheet.
#[derive(Debug, Clone)]
pub struct CsvFileTable {
    path: PathBuf,
    table: MemoryTable,
    loaded: bool,
}

impl CsvFileTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            table: MemoryTable::new(name),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file into memory. A missing file is an empty sheet.
    pub async fn load(&mut self) -> SyncResult<()> {
        let rows = match tokio::fs::read(&self.path).await {
            Ok(bytes) => read_rows(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        self.table.replace_grid(rows);
        self.loaded = true;
        Ok(())
    }

    /// Write the in-memory contents back to the file.
    pub async fn save(&self) -> SyncResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = write_rows(&self.table.snapshot())?;
        tokio::fs::write(&self.path, bytes).await?;
        tracing::debug!("Saved {}", self.path.display());
        Ok(())
    }

    async fn ensure_loaded(&mut self) -> SyncResult<()> {
        if !self.loaded {
            self.load().await?;
        }
        Ok(())
    }
}

fn read_rows(bytes: &[u8]) -> SyncResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(ToString::to_string).collect())
                .map_err(|e| SyncError::parse(format!("Invalid CSV table file: {e}")))
        })
        .collect()
}

fn write_rows(rows: &[Vec<String>]) -> SyncResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| SyncError::backend("save", e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| SyncError::backend("save", e.to_string()))
}

#[async_trait]
impl TableSource for CsvFileTable {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn open_session(&mut self) -> SyncResult<()> {
        self.load().await
    }

    async fn close_session(&mut self) -> SyncResult<()> {
        if self.loaded {
            self.save().await?;
        }
        Ok(())
    }

    async fn used_range(&mut self) -> SyncResult<Vec<Vec<String>>> {
        self.ensure_loaded().await?;
        self.table.used_range().await
    }

    async fn append(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        self.ensure_loaded().await?;
        self.table.append(range, values).await
    }

    async fn patch(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        self.ensure_loaded().await?;
        self.table.patch(range, values).await
    }

    async fn patch_batch(&mut self, updates: Vec<RangeUpdate>) -> SyncResult<Vec<SyncResult<()>>> {
        self.ensure_loaded().await?;
        self.table.patch_batch(updates).await
    }

    async fn clear(&mut self) -> SyncResult<()> {
        self.ensure_loaded().await?;
        self.table.clear().await
    }

    async fn add_columns(&mut self, start_col: u32, headers: Vec<String>) -> SyncResult<()> {
        self.ensure_loaded().await?;
        self.table.add_columns(start_col, headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_empty_sheet() {
        let dir = tempdir().unwrap();
        let mut table = CsvFileTable::new(dir.path().join("nested/out.csv"));
        assert!(table.used_range().await.unwrap().is_empty());

        table.close_session().await.unwrap();
        assert!(dir.path().join("nested/out.csv").exists());
    }

    #[tokio::test]
    async fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "id,name\n1,\"Ann, Jr\"\n").unwrap();

        let mut table = CsvFileTable::new(&path);
        table.open_session().await.unwrap();
        let rows = table.used_range().await.unwrap();
        assert_eq!(rows[1], vec!["1".to_string(), "Ann, Jr".to_string()]);

        table
            .append(&CellRange::row_span(3, 2).unwrap(), vec![vec!["2".into(), "Ben".into()]])
            .await
            .unwrap();
        table.close_session().await.unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, "id,name\n1,\"Ann, Jr\"\n2,Ben\n");
    }
}
