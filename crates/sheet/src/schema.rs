//! Header reconciliation between incoming records and the destination.

use std::collections::BTreeSet;

use tablesync_core::{HeaderMismatchStrategy, SyncError, SyncResult};

use crate::source::TableSource;

/// Set comparison of incoming headers against destination headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlan {
    /// Incoming headers missing from the destination, sorted.
    pub unrecognized: Vec<String>,
    /// Incoming headers present in the destination, sorted.
    pub recognized: Vec<String>,
}

impl SchemaPlan {
    pub fn new(incoming: &[String], existing: &[String]) -> Self {
        let existing: BTreeSet<&str> = existing.iter().map(String::as_str).collect();
        let incoming: BTreeSet<&str> = incoming.iter().map(String::as_str).collect();
        let (recognized, unrecognized): (Vec<&str>, Vec<&str>) =
            incoming.into_iter().partition(|h| existing.contains(h));
        Self {
            unrecognized: unrecognized.into_iter().map(String::from).collect(),
            recognized: recognized.into_iter().map(String::from).collect(),
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.unrecognized.is_empty()
    }
}

/// Destination state after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Destination contents, re-read when columns were added.
    pub existing: Vec<Vec<String>>,
    /// Headers appended to the destination.
    pub columns_added: Vec<String>,
}

/// Apply `strategy` to the headers of `incoming` versus `existing`.
///
/// `existing` is the full used range with the header row first. With
/// `AddColumns` the new headers are written after the last destination
/// column and the destination is read again, since backends may place
/// them differently than predicted.
pub async fn reconcile<S>(
    source: &mut S,
    incoming: &[String],
    existing: Vec<Vec<String>>,
    strategy: HeaderMismatchStrategy,
) -> SyncResult<Reconciled>
where
    S: TableSource + ?Sized,
{
    let existing_headers = existing.first().cloned().unwrap_or_default();
    let plan = SchemaPlan::new(incoming, &existing_headers);

    if plan.is_aligned() {
        return Ok(Reconciled {
            existing,
            columns_added: Vec::new(),
        });
    }

    match strategy {
        HeaderMismatchStrategy::Fail => Err(SyncError::SchemaMismatch {
            unrecognized: plan.unrecognized,
            recognized: plan.recognized,
            existing: existing_headers,
        }),
        HeaderMismatchStrategy::IgnoreFields => {
            tracing::warn!(
                "Ignoring fields not present in sheet {}: {}",
                source.describe(),
                plan.unrecognized.join(", ")
            );
            Ok(Reconciled {
                existing,
                columns_added: Vec::new(),
            })
        }
        HeaderMismatchStrategy::AddColumns => {
            let start_col = existing_headers.len() as u32 + 1;
            tracing::info!(
                "Adding {} new column(s) to {}: {}",
                plan.unrecognized.len(),
                source.describe(),
                plan.unrecognized.join(", ")
            );
            source
                .add_columns(start_col, plan.unrecognized.clone())
                .await?;
            let existing = source.used_range().await?;
            Ok(Reconciled {
                existing,
                columns_added: plan.unrecognized,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryTable, SourceCall};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_plan_sorted_and_deduplicated() {
        let plan = SchemaPlan::new(
            &strings(&["zip", "id", "email", "zip"]),
            &strings(&["name", "id"]),
        );
        assert_eq!(plan.unrecognized, strings(&["email", "zip"]));
        assert_eq!(plan.recognized, strings(&["id"]));
        assert!(!plan.is_aligned());
    }

    #[test]
    fn test_plan_subset_is_aligned() {
        let plan = SchemaPlan::new(&strings(&["id"]), &strings(&["id", "name"]));
        assert!(plan.is_aligned());
    }

    #[tokio::test]
    async fn test_fail_strategy_reports_both_lists() {
        let mut table = MemoryTable::with_rows("Sheet1", vec![strings(&["id", "name"])]);
        let existing = table.snapshot();
        let err = reconcile(
            &mut table,
            &strings(&["id", "email"]),
            existing,
            HeaderMismatchStrategy::Fail,
        )
        .await
        .unwrap_err();

        match err {
            SyncError::SchemaMismatch {
                unrecognized,
                recognized,
                existing,
            } => {
                assert_eq!(unrecognized, strings(&["email"]));
                assert_eq!(recognized, strings(&["id"]));
                assert_eq!(existing, strings(&["id", "name"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_ignore_strategy_drops_fields() {
        let mut table = MemoryTable::with_rows("Sheet1", vec![strings(&["id", "name"])]);
        let existing = table.snapshot();
        let reconciled = reconcile(
            &mut table,
            &strings(&["id", "email", "name"]),
            existing,
            HeaderMismatchStrategy::IgnoreFields,
        )
        .await
        .unwrap();
        assert!(reconciled.columns_added.is_empty());
        assert_eq!(reconciled.existing, vec![strings(&["id", "name"])]);
        assert!(table.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_columns_appends_sorted_and_refetches() {
        let mut table = MemoryTable::with_rows(
            "Sheet1",
            vec![strings(&["id", "name"]), strings(&["1", "Ann"])],
        );
        let existing = table.snapshot();
        let reconciled = reconcile(
            &mut table,
            &strings(&["id", "zip", "email"]),
            existing,
            HeaderMismatchStrategy::AddColumns,
        )
        .await
        .unwrap();

        assert_eq!(reconciled.columns_added, strings(&["email", "zip"]));
        assert_eq!(
            reconciled.existing[0],
            strings(&["id", "name", "email", "zip"])
        );
        assert_eq!(
            table.calls(),
            &[
                SourceCall::AddColumns {
                    start_col: 3,
                    headers: strings(&["email", "zip"]),
                },
                SourceCall::UsedRange,
            ]
        );
    }
}
