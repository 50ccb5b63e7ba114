//! Microsoft Graph Excel workbook backend.
//!
//! Every range call of one write runs inside a persistent workbook
//! session when Graph grants one; otherwise calls run sessionless.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tablesync_core::{SyncError, SyncResult};
use tablesync_primitives::{CellAddress, CellRange};
use tablesync_sheet::{normalize_used_range, TableSource};

use crate::client::{endpoint, ensure_success, parse_base_url, read_json, send, value_rows, ApiClient};

pub const GRAPH_API: &str = "https://graph.microsoft.com/v1.0";

/// Header carrying the workbook session id.
pub const SESSION_HEADER: &str = "workbook-session-id";

/// Range cleared by a whole-sheet clear.
const WHOLE_SHEET: &str = "A1:ZZ100000";

/// Where the workbook lives in the user's drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkbookLocation {
    /// Path from the drive root, e.g. `/Documents/report.xlsx`.
    FilePath(String),
    DriveItem { drive_id: String, item_id: String },
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
    id: String,
}

/// One worksheet of an Excel workbook.
#[derive(Debug, Clone)]
pub struct ExcelWorkbookSource {
    client: ApiClient,
    base_url: Url,
    location: WorkbookLocation,
    worksheet: String,
    session_id: Option<String>,
}

impl ExcelWorkbookSource {
    pub fn new(
        client: ApiClient,
        location: WorkbookLocation,
        worksheet: impl Into<String>,
    ) -> SyncResult<Self> {
        if let WorkbookLocation::FilePath(path) = &location {
            if path.trim_matches('/').is_empty() {
                return Err(SyncError::config("Workbook file path must not be empty"));
            }
        }
        Ok(Self {
            client,
            base_url: parse_base_url(GRAPH_API)?,
            location,
            worksheet: worksheet.into(),
            session_id: None,
        })
    }

    /// Point at a different API root, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> SyncResult<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn workbook_url(&self, tail: &[&str]) -> SyncResult<Url> {
        let mut segments: Vec<String> = Vec::new();
        match &self.location {
            WorkbookLocation::FilePath(path) => {
                // me/drive/root:/Documents/report.xlsx:/workbook
                let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
                segments.extend(["me".to_string(), "drive".to_string(), "root:".to_string()]);
                for (idx, part) in parts.iter().enumerate() {
                    if idx + 1 == parts.len() {
                        segments.push(format!("{part}:"));
                    } else {
                        segments.push((*part).to_string());
                    }
                }
            }
            WorkbookLocation::DriveItem { drive_id, item_id } => {
                segments.extend([
                    "drives".to_string(),
                    drive_id.clone(),
                    "items".to_string(),
                    item_id.clone(),
                ]);
            }
        }
        segments.push("workbook".to_string());
        segments.extend(tail.iter().map(|s| (*s).to_string()));
        endpoint(&self.base_url, segments)
    }

    fn range_url(&self, address: &str, tail: Option<&str>) -> SyncResult<Url> {
        let range = format!("range(address='{address}')");
        let mut segments = vec!["worksheets", self.worksheet.as_str(), range.as_str()];
        segments.extend(tail);
        self.workbook_url(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.session_id {
            Some(id) => request.header(SESSION_HEADER, id),
            None => request,
        }
    }

    async fn write_range(
        &self,
        operation: &str,
        address: &str,
        values: Vec<Vec<String>>,
    ) -> SyncResult<()> {
        let url = self.range_url(address, None)?;
        let request = self
            .request(Method::PATCH, url)
            .json(&json!({ "values": values }));
        let response = send(operation, request).await?;
        ensure_success(operation, response).await?;
        Ok(())
    }
}

#[async_trait]
impl TableSource for ExcelWorkbookSource {
    fn describe(&self) -> String {
        let workbook = match &self.location {
            WorkbookLocation::FilePath(path) => path.clone(),
            WorkbookLocation::DriveItem { drive_id, item_id } => format!("{drive_id}/{item_id}"),
        };
        format!("excel:{workbook}/{}", self.worksheet)
    }

    /// A refused session is logged and the write continues sessionless.
    async fn open_session(&mut self) -> SyncResult<()> {
        let operation = "create session";
        let url = self.workbook_url(&["createSession"])?;
        let request = self
            .client
            .request(Method::POST, url)
            .json(&json!({ "persistChanges": true }));
        let response = send(operation, request).await?;

        if response.status() == StatusCode::CREATED {
            let session: SessionInfo = response
                .json()
                .await
                .map_err(|e| SyncError::backend(operation, format!("Failed to parse JSON: {e}")))?;
            tracing::info!("Created workbook session: {}", session.id);
            self.session_id = Some(session.id);
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Failed to create session: {} - {}", status, body);
        }
        Ok(())
    }

    async fn close_session(&mut self) -> SyncResult<()> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        let url = self.workbook_url(&["closeSession"])?;
        let request = self
            .client
            .request(Method::POST, url)
            .header(SESSION_HEADER, &session_id);
        let response = send("close session", request).await?;

        if response.status() == StatusCode::NO_CONTENT {
            tracing::info!("Closed workbook session: {}", session_id);
        } else {
            tracing::warn!("Failed to close session {}: {}", session_id, response.status());
        }
        Ok(())
    }

    async fn used_range(&mut self) -> SyncResult<Vec<Vec<String>>> {
        let operation = "read worksheet";
        let url = self.workbook_url(&["worksheets", self.worksheet.as_str(), "usedRange"])?;
        let response = send(operation, self.request(Method::GET, url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let body = read_json(operation, response).await?;
        Ok(normalize_used_range(value_rows(body.get("values"))))
    }

    async fn append(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        tracing::debug!("Appending {} row(s) at {}", values.len(), range);
        self.write_range("append rows", &range.to_a1(), values).await
    }

    async fn patch(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        self.write_range("write range", &range.to_a1(), values).await
    }

    async fn clear(&mut self) -> SyncResult<()> {
        let operation = "clear worksheet";
        let url = self.range_url(WHOLE_SHEET, Some("clear"))?;
        let request = self
            .request(Method::POST, url)
            .json(&json!({ "applyTo": "Contents" }));
        let response = send(operation, request).await?;
        ensure_success(operation, response).await?;
        Ok(())
    }

    async fn add_columns(&mut self, start_col: u32, headers: Vec<String>) -> SyncResult<()> {
        let range = CellRange::with_size(CellAddress::from_numbers(1, start_col)?, 1, headers.len())?;
        self.write_range("add columns", &range.to_a1(), vec![headers]).await
    }
}
