//! # tablesync-http
//!
//! Remote spreadsheet backends for the write engine.
//!
//! Both backends implement [`tablesync_sheet::TableSource`] over an
//! authenticated JSON client:
//!
//! - [`GoogleSheetsSource`] talks to the Google Sheets v4 values API.
//! - [`ExcelWorkbookSource`] talks to the Microsoft Graph workbook API and
//!   wraps each write in a persistent workbook session.
//!
//! Non-success responses surface as `SyncError::Backend` carrying the
//! HTTP status and response body.

pub mod client;
pub mod excel;
pub mod google;

pub use client::ApiClient;
pub use excel::{ExcelWorkbookSource, WorkbookLocation, GRAPH_API, SESSION_HEADER};
pub use google::{GoogleSheetsSource, ValueInputOption, GOOGLE_SHEETS_API};
