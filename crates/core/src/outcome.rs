use serde::Serialize;

use crate::config::WriteMode;

/// Result of one successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub sheet_name: String,
    /// Mode from the configuration.
    pub mode_requested: WriteMode,
    /// Mode that actually ran, after empty-destination fallbacks.
    pub mode_used: WriteMode,
    /// Data rows written. Header rows are never counted.
    pub rows_written: usize,
    pub rows_updated: usize,
    pub rows_appended: usize,
    pub rows_dropped: usize,
    /// Rows whose patch the backend rejected.
    pub rows_failed: usize,
    pub columns_added: Vec<String>,
}

impl WriteOutcome {
    /// Outcome with every counter at zero.
    pub fn new(sheet_name: impl Into<String>, mode: WriteMode) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            mode_requested: mode,
            mode_used: mode,
            rows_written: 0,
            rows_updated: 0,
            rows_appended: 0,
            rows_dropped: 0,
            rows_failed: 0,
            columns_added: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mode_used(mut self, mode: WriteMode) -> Self {
        self.mode_used = mode;
        self
    }
}
