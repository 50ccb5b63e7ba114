//! Error types for tablesync.

use thiserror::Error;

use crate::config::WriteMode;

/// Result type for tablesync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while parsing input or writing to a table.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed input payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Incoming columns absent from the destination under the `fail` strategy.
    #[error("{}", schema_mismatch_message(.unrecognized, .recognized, .existing))]
    SchemaMismatch {
        unrecognized: Vec<String>,
        recognized: Vec<String>,
        existing: Vec<String>,
    },

    /// A configured identifier column is not a destination header.
    #[error("Identifier field '{field}' not found in sheet headers")]
    IdentifierFieldNotFound { field: String },

    /// UPDATE against a destination with no rows.
    #[error("Cannot {mode}: Sheet is empty. Use APPEND or UPSERT mode instead.")]
    EmptyDestination { mode: WriteMode },

    /// Malformed A1 reference.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// The destination sheet or worksheet does not exist.
    #[error("Sheet '{sheet}' not found. Available sheets: {}", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    /// Failure reported by a table backend.
    #[error("Backend error during {operation}{}: {body}", status_suffix(.status))]
    Backend {
        operation: String,
        status: Option<u16>,
        body: String,
    },

    /// Invalid write configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a backend error without an HTTP status.
    pub fn backend(operation: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            status: None,
            body: body.into(),
        }
    }

    /// Create a backend error carrying the response status and body.
    pub fn backend_status(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            status: Some(status),
            body: body.into(),
        }
    }

    /// HTTP status attached to a backend error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<tablesync_primitives::AddressError> for SyncError {
    fn from(err: tablesync_primitives::AddressError) -> Self {
        Self::InvalidRange(err.to_string())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn schema_mismatch_message(
    unrecognized: &[String],
    recognized: &[String],
    existing: &[String],
) -> String {
    format!(
        "Header mismatch detected!\n\
         Unrecognized fields (not in sheet): {}\n\
         Recognized fields (in sheet): {}\n\
         Existing sheet headers: {}\n\
         To fix: remove the unrecognized fields from the input, add them to the sheet, \
         or set header_mismatch_strategy to ignore_fields or add_columns.",
        unrecognized.join(", "),
        recognized.join(", "),
        existing.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_lists_both_sides() {
        let err = SyncError::SchemaMismatch {
            unrecognized: vec!["bonus".into(), "email".into()],
            recognized: vec!["id".into()],
            existing: vec!["id".into(), "name".into()],
        };
        let message = err.to_string();
        assert!(message.contains("Unrecognized fields (not in sheet): bonus, email"));
        assert!(message.contains("Recognized fields (in sheet): id"));
        assert!(message.contains("Existing sheet headers: id, name"));
    }

    #[test]
    fn test_backend_error_display() {
        let err = SyncError::backend_status("append", 403, "forbidden");
        assert_eq!(err.to_string(), "Backend error during append (HTTP 403): forbidden");
        assert_eq!(err.status(), Some(403));

        let err = SyncError::backend("clear", "connection reset");
        assert_eq!(err.to_string(), "Backend error during clear: connection reset");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_empty_destination_names_mode() {
        let err = SyncError::EmptyDestination {
            mode: WriteMode::Update,
        };
        assert_eq!(
            err.to_string(),
            "Cannot UPDATE: Sheet is empty. Use APPEND or UPSERT mode instead."
        );
    }

    #[test]
    fn test_sheet_not_found_lists_available() {
        let err = SyncError::SheetNotFound {
            sheet: "Data".into(),
            available: vec!["Sheet1".into(), "Archive".into()],
        };
        assert_eq!(
            err.to_string(),
            "Sheet 'Data' not found. Available sheets: Sheet1, Archive"
        );
    }

    #[test]
    fn test_address_error_maps_to_invalid_range() {
        let err: SyncError = tablesync_primitives::CellAddress::from_a1("A0")
            .unwrap_err()
            .into();
        assert!(matches!(err, SyncError::InvalidRange(_)));
    }
}
