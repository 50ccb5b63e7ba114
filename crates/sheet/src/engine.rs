//! Write strategies over a [`TableSource`].
//!
//! - REPLACE clears the sheet and writes `[headers?] + rows` at the start cell.
//! - APPEND writes after the last existing row, with headers only into an
//!   empty sheet.
//! - UPDATE patches rows matched by identifier fields. Unmatched rows are
//!   dropped, or appended when `on_unmatched` is `append`.
//! - UPSERT patches matched rows and appends the rest.
//!
//! Per-row patch failures are best-effort: each is logged and counted in
//! `rows_failed`, and the remaining rows are still written.

use tablesync_core::{
    EmptyDestinationPolicy, InputFormat, RecordSet, SyncError, SyncResult, WriteConfig,
    WriteMode, WriteOutcome,
};
use tablesync_primitives::{AddressError, CellAddress, CellRange};

use crate::matcher::{classify, RowIndex};
use crate::parse::parse_input;
use crate::schema::reconcile;
use crate::source::{rectangular, RangeUpdate, TableSource};

/// Applies one [`WriteConfig`] to table sources.
#[derive(Debug, Clone)]
pub struct WriteEngine {
    config: WriteConfig,
}

impl WriteEngine {
    /// Create an engine, rejecting invalid configuration up front.
    pub fn new(config: WriteConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WriteConfig {
        &self.config
    }

    /// Parse `content` and write it.
    pub async fn write_payload<S>(
        &self,
        source: &mut S,
        content: &[u8],
        format: InputFormat,
    ) -> SyncResult<WriteOutcome>
    where
        S: TableSource + ?Sized,
    {
        match parse_input(content, format)? {
            Some(records) => self.write(source, &records).await,
            None => {
                tracing::info!("No data to write to {}", source.describe());
                Ok(self.outcome())
            }
        }
    }

    /// Write `records` to `source` inside one session bracket.
    ///
    /// The session is closed on success and on failure. A failing close is
    /// logged and never replaces the write's own result.
    pub async fn write<S>(&self, source: &mut S, records: &RecordSet) -> SyncResult<WriteOutcome>
    where
        S: TableSource + ?Sized,
    {
        if records.is_empty() {
            tracing::info!("No data to write to {}", source.describe());
            return Ok(self.outcome());
        }

        source.open_session().await?;
        let result = self.dispatch(source, records).await;
        if let Err(e) = source.close_session().await {
            tracing::warn!("Failed to close session on {}: {}", source.describe(), e);
        }

        if let Ok(outcome) = &result {
            tracing::info!(
                "Wrote {} row(s) to {} using {} mode",
                outcome.rows_written,
                source.describe(),
                outcome.mode_used
            );
        }
        result
    }

    async fn dispatch<S>(&self, source: &mut S, records: &RecordSet) -> SyncResult<WriteOutcome>
    where
        S: TableSource + ?Sized,
    {
        match self.config.mode {
            WriteMode::Replace => {
                let start = self.config.start_address()?;
                self.replace(source, records, start, self.config.format_as_table)
                    .await
            }
            WriteMode::Append => {
                let existing = source.used_range().await?;
                self.append(source, records, existing.len()).await
            }
            WriteMode::Update | WriteMode::Upsert => self.write_matched(source, records).await,
        }
    }

    async fn replace<S>(
        &self,
        source: &mut S,
        records: &RecordSet,
        start: CellAddress,
        format_as_table: bool,
    ) -> SyncResult<WriteOutcome>
    where
        S: TableSource + ?Sized,
    {
        let include_header = self.config.include_header_row;
        let mut values = Vec::with_capacity(records.len() + 1);
        if include_header {
            values.push(records.headers().to_vec());
        }
        values.extend(records.rows().iter().cloned());
        let (values, width) = rectangular(values, records.headers().len());
        let height = values.len();
        let range = CellRange::with_size(start, height, width)?;

        source.clear().await?;
        tracing::debug!("Writing {} row(s) to {}", height, range);
        source.patch(&range, values).await?;

        if format_as_table && include_header {
            self.format_table(source, height, width).await;
        }

        let mut outcome = self.outcome().with_mode_used(WriteMode::Replace);
        outcome.rows_written = records.len();
        Ok(outcome)
    }

    async fn append<S>(
        &self,
        source: &mut S,
        records: &RecordSet,
        existing_len: usize,
    ) -> SyncResult<WriteOutcome>
    where
        S: TableSource + ?Sized,
    {
        let with_header = existing_len == 0 && self.config.include_header_row;
        let mut values = Vec::with_capacity(records.len() + 1);
        if with_header {
            values.push(records.headers().to_vec());
        }
        values.extend(records.rows().iter().cloned());
        let (values, width) = rectangular(values, records.headers().len());
        let height = values.len();

        self.append_values(source, existing_len, values, width)
            .await?;

        if with_header && self.config.format_as_table {
            self.format_table(source, height, width).await;
        }

        let mut outcome = self.outcome().with_mode_used(WriteMode::Append);
        outcome.rows_written = records.len();
        outcome.rows_appended = records.len();
        Ok(outcome)
    }

    async fn write_matched<S>(&self, source: &mut S, records: &RecordSet) -> SyncResult<WriteOutcome>
    where
        S: TableSource + ?Sized,
    {
        let existing = source.used_range().await?;
        if existing.is_empty() {
            return match self.config.empty_destination_policy() {
                EmptyDestinationPolicy::Reject => Err(SyncError::EmptyDestination {
                    mode: self.config.mode,
                }),
                EmptyDestinationPolicy::Replace => {
                    tracing::info!(
                        "{} is empty, falling back to REPLACE",
                        source.describe()
                    );
                    // Configured start cell and table styling apply to REPLACE mode only.
                    self.replace(source, records, CellAddress::A1, false)
                        .await
                }
                EmptyDestinationPolicy::Append => {
                    tracing::info!("{} is empty, falling back to APPEND", source.describe());
                    self.append(source, records, 0).await
                }
            };
        }

        let reconciled = reconcile(
            source,
            records.headers(),
            existing,
            self.config.header_mismatch_strategy,
        )
        .await?;

        let (dest_headers, dest_rows) = reconciled
            .existing
            .split_first()
            .map(|(h, rows)| (h.as_slice(), rows))
            .unwrap_or_default();
        let fields: Vec<String> = self
            .config
            .identifier_fields()
            .map(ToString::to_string)
            .collect();

        let index = RowIndex::build(dest_headers, dest_rows, &fields)?;
        let classes = classify(records, &fields, &index);
        let width = dest_headers.len();

        let mut outcome = self.outcome();
        outcome.columns_added = reconciled.columns_added.clone();

        if !classes.matched.is_empty() {
            let updates = classes
                .matched
                .iter()
                .map(|&(row_number, row)| -> SyncResult<RangeUpdate> {
                    Ok(RangeUpdate::new(
                        CellRange::row_span(row_number, width)?,
                        vec![records.project(row, dest_headers)],
                    ))
                })
                .collect::<SyncResult<Vec<_>>>()?;

            let results = source.patch_batch(updates).await?;
            for (result, &(row_number, _)) in results.iter().zip(&classes.matched) {
                match result {
                    Ok(()) => outcome.rows_updated += 1,
                    Err(e) => {
                        tracing::warn!("Failed to update row {}: {}", row_number, e);
                        outcome.rows_failed += 1;
                    }
                }
            }
        }

        if self.config.appends_unmatched() {
            if !classes.unmatched.is_empty() {
                let values: Vec<Vec<String>> = classes
                    .unmatched
                    .iter()
                    .map(|&row| records.project(row, dest_headers))
                    .collect();
                self.append_values(source, reconciled.existing.len(), values, width)
                    .await?;
                outcome.rows_appended = classes.unmatched.len();
            }
        } else {
            for &row in &classes.unmatched {
                tracing::warn!(
                    "No matching row found for {:?}, skipping",
                    records.identity(row, fields.iter().map(String::as_str))
                );
            }
            outcome.rows_dropped = classes.unmatched.len();
        }

        outcome.rows_written = outcome.rows_updated + outcome.rows_appended;
        tracing::info!(
            "{} complete on {}: {} updated, {} inserted, {} dropped, {} failed",
            self.config.mode,
            source.describe(),
            outcome.rows_updated,
            outcome.rows_appended,
            outcome.rows_dropped,
            outcome.rows_failed
        );
        Ok(outcome)
    }

    async fn append_values<S>(
        &self,
        source: &mut S,
        existing_len: usize,
        values: Vec<Vec<String>>,
        width: usize,
    ) -> SyncResult<()>
    where
        S: TableSource + ?Sized,
    {
        let next_row = u32::try_from(existing_len)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| AddressError::InvalidRow(format!("row after {existing_len}")))?;
        let start = CellAddress::from_numbers(next_row, 1)?;
        let range = CellRange::with_size(start, values.len(), width)?;
        tracing::debug!("Appending {} row(s) at {}", values.len(), range);
        source.append(&range, values).await
    }

    async fn format_table<S>(&self, source: &mut S, rows: usize, cols: usize)
    where
        S: TableSource + ?Sized,
    {
        if let Err(e) = source.format_as_table(rows, cols).await {
            tracing::warn!("Could not format {} as a table: {}", source.describe(), e);
        }
    }

    fn outcome(&self) -> WriteOutcome {
        WriteOutcome::new(self.config.sheet_name.clone(), self.config.mode)
    }
}

/// Parse `content` and write it with `config` in one call.
pub async fn post<S>(
    source: &mut S,
    content: &[u8],
    format: InputFormat,
    config: WriteConfig,
) -> SyncResult<WriteOutcome>
where
    S: TableSource + ?Sized,
{
    WriteEngine::new(config)?
        .write_payload(source, content, format)
        .await
}
