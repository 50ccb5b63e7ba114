//! Write configuration.
//!
//! One [`WriteMode`] plus an [`OnUnmatched`] policy cover both lineages of
//! the sheet posting processors:
//!
//! | mode     | on_unmatched | unmatched rows | empty destination |
//! |----------|--------------|----------------|-------------------|
//! | `update` | `drop`       | dropped        | error             |
//! | `upsert` | `drop`       | appended       | degrades to REPLACE |
//! | `update` | `append`     | appended       | degrades to APPEND |
//!
//! `upsert` combined with `on_unmatched: append` is rejected, since the
//! collapsed lineage has no separate UPSERT.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tablesync_primitives::CellAddress;

use crate::error::{SyncError, SyncResult};

/// Top-level write strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Clear the sheet and write the input at the start cell.
    Replace,
    /// Append after the last existing row.
    #[default]
    Append,
    /// Patch rows matched by identifier.
    Update,
    /// Patch matched rows and append the rest.
    Upsert,
}

impl WriteMode {
    /// Whether the mode matches rows by identifier fields.
    pub fn matches_rows(self) -> bool {
        matches!(self, Self::Update | Self::Upsert)
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Replace => "REPLACE",
            Self::Append => "APPEND",
            Self::Update => "UPDATE",
            Self::Upsert => "UPSERT",
        };
        f.write_str(name)
    }
}

impl FromStr for WriteMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "update" => Ok(Self::Update),
            "upsert" => Ok(Self::Upsert),
            _ => Err(SyncError::config(format!(
                "Unknown write mode '{s}'. Expected one of: replace, append, update, upsert"
            ))),
        }
    }
}

/// Policy for incoming columns that the destination header row lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMismatchStrategy {
    #[default]
    Fail,
    IgnoreFields,
    AddColumns,
}

impl fmt::Display for HeaderMismatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fail => "FAIL",
            Self::IgnoreFields => "IGNORE_FIELDS",
            Self::AddColumns => "ADD_COLUMNS",
        };
        f.write_str(name)
    }
}

impl FromStr for HeaderMismatchStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "fail" => Ok(Self::Fail),
            "ignore_fields" => Ok(Self::IgnoreFields),
            "add_columns" => Ok(Self::AddColumns),
            _ => Err(SyncError::config(format!(
                "Unknown header mismatch strategy '{s}'. Expected one of: fail, ignore_fields, add_columns"
            ))),
        }
    }
}

/// What UPDATE does with incoming rows that match no destination row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnUnmatched {
    #[default]
    Drop,
    Append,
}

impl fmt::Display for OnUnmatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop => f.write_str("drop"),
            Self::Append => f.write_str("append"),
        }
    }
}

impl FromStr for OnUnmatched {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "drop" => Ok(Self::Drop),
            "append" => Ok(Self::Append),
            _ => Err(SyncError::config(format!(
                "Unknown unmatched-row policy '{s}'. Expected drop or append"
            ))),
        }
    }
}

/// Format of the incoming payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    #[default]
    Csv,
    Json,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("CSV"),
            Self::Json => f.write_str("JSON"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(SyncError::config(format!(
                "Unknown input format '{s}'. Expected csv or json"
            ))),
        }
    }
}

/// What the engine does when a matching mode finds the destination empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyDestinationPolicy {
    /// Fail with `EmptyDestination`.
    Reject,
    /// Run REPLACE at `A1`.
    Replace,
    /// Run APPEND, including the header decision.
    Append,
}

/// Configuration for one write invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Sheet or worksheet name.
    pub sheet_name: String,
    pub mode: WriteMode,
    /// A1 cell where REPLACE starts writing.
    pub start_cell: String,
    /// Columns forming row identity, in order.
    pub identifier_fields: Vec<String>,
    pub include_header_row: bool,
    pub header_mismatch_strategy: HeaderMismatchStrategy,
    pub on_unmatched: OnUnmatched,
    /// Ask the backend to style the written block as a table.
    pub format_as_table: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            mode: WriteMode::Append,
            start_cell: "A1".to_string(),
            identifier_fields: Vec::new(),
            include_header_row: true,
            header_mismatch_strategy: HeaderMismatchStrategy::Fail,
            on_unmatched: OnUnmatched::Drop,
            format_as_table: false,
        }
    }
}

impl WriteConfig {
    /// Config for `mode` with every other field at its default.
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set identifier fields, trimming names and discarding blanks.
    #[must_use]
    pub fn with_identifier_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.identifier_fields = fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        self
    }

    /// Check the configuration before any backend call is made.
    pub fn validate(&self) -> SyncResult<()> {
        if self.sheet_name.trim().is_empty() {
            return Err(SyncError::config("Sheet name must not be empty"));
        }
        self.start_address()?;

        if self.mode.matches_rows() && self.identifier_fields().next().is_none() {
            return Err(SyncError::config(format!(
                "Identifier fields are required for {} mode",
                self.mode
            )));
        }

        if self.mode == WriteMode::Upsert && self.on_unmatched == OnUnmatched::Append {
            return Err(SyncError::config(
                "on_unmatched: append turns UPDATE into an upsert; use UPDATE instead of UPSERT",
            ));
        }

        Ok(())
    }

    /// Parsed start cell.
    pub fn start_address(&self) -> SyncResult<CellAddress> {
        CellAddress::from_a1(&self.start_cell).map_err(|_| {
            SyncError::InvalidRange(format!(
                "Invalid start cell '{}'. Expected a cell like A1",
                self.start_cell
            ))
        })
    }

    /// Identifier field names with surrounding whitespace removed.
    pub fn identifier_fields(&self) -> impl Iterator<Item = &str> {
        self.identifier_fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
    }

    /// Whether unmatched rows are appended rather than dropped.
    pub fn appends_unmatched(&self) -> bool {
        match self.mode {
            WriteMode::Upsert => true,
            WriteMode::Update => self.on_unmatched == OnUnmatched::Append,
            WriteMode::Replace | WriteMode::Append => false,
        }
    }

    /// Behavior of a matching mode against an empty destination.
    pub fn empty_destination_policy(&self) -> EmptyDestinationPolicy {
        match (self.mode, self.on_unmatched) {
            (WriteMode::Upsert, _) => EmptyDestinationPolicy::Replace,
            (WriteMode::Update, OnUnmatched::Append) => EmptyDestinationPolicy::Append,
            _ => EmptyDestinationPolicy::Reject,
        }
    }
}

/// Split a comma-separated identifier list (`"FirstName, LastName"`).
pub fn parse_identifier_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn normalize_token(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}
