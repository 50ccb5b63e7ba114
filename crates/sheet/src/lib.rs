//! Tabular write-reconciliation engine for tablesync.
//!
//! Parses an incoming payload, compares it with the destination table's
//! current contents and applies one of four write strategies through the
//! [`TableSource`] seam. The same sequence of range operations is issued
//! whatever the backend is.
//!
//! # Example
//!
//! ```
//! use tablesync_core::{InputFormat, WriteConfig, WriteMode};
//! use tablesync_sheet::{MemoryTable, TableSource, WriteEngine};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let mut table = MemoryTable::with_rows(
//!     "Contacts",
//!     vec![
//!         vec!["id".to_string(), "name".to_string()],
//!         vec!["1".to_string(), "Ann".to_string()],
//!     ],
//! );
//!
//! let config = WriteConfig::new(WriteMode::Upsert).with_identifier_fields(["id"]);
//! let engine = WriteEngine::new(config).unwrap();
//! let outcome = engine
//!     .write_payload(&mut table, b"id,name\n1,Alice\n2,Bob", InputFormat::Csv)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(outcome.rows_updated, 1);
//! assert_eq!(outcome.rows_appended, 1);
//! assert_eq!(table.used_range().await.unwrap().len(), 3);
//! # });
//! # }
//! ```

pub mod engine;
pub mod file;
pub mod matcher;
pub mod memory;
pub mod parse;
pub mod schema;
pub mod source;

pub use engine::{post, WriteEngine};
pub use file::CsvFileTable;
pub use matcher::{classify, Classification, RowIndex};
pub use memory::{MemoryTable, SourceCall};
pub use parse::{cell_text, parse_csv, parse_input, parse_json};
pub use schema::{reconcile, Reconciled, SchemaPlan};
pub use source::{normalize_used_range, RangeUpdate, TableSource};
