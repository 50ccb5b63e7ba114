//! # tablesync-core
//!
//! Core types shared by the tablesync reconciliation engine, its
//! backends and the CLI.
//!
//! This crate provides:
//! - The error taxonomy and result alias
//! - Write configuration (modes, header mismatch policy, unmatched-row policy)
//! - The immutable incoming record set
//! - The write outcome reported back to callers

/// Write configuration and policy enums.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Write outcome reporting.
pub mod outcome;
/// Parsed incoming records.
pub mod record;

pub use config::{
    parse_identifier_list, EmptyDestinationPolicy, HeaderMismatchStrategy, InputFormat,
    OnUnmatched, WriteConfig, WriteMode,
};
pub use error::{SyncError, SyncResult};
pub use outcome::WriteOutcome;
pub use record::RecordSet;
