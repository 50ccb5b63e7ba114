//! Google Sheets v4 values API backend.

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use tablesync_core::{SyncError, SyncResult};
use tablesync_primitives::{qualified_range, sanitize_sheet_name, CellAddress, CellRange};
use tablesync_sheet::{normalize_used_range, RangeUpdate, TableSource};

use crate::client::{endpoint, ensure_success, parse_base_url, read_json, send, value_rows, ApiClient};

pub const GOOGLE_SHEETS_API: &str = "https://sheets.googleapis.com/v4";

/// How Google interprets written values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    /// Stored as-is without parsing.
    Raw,
    /// Parsed as if typed into the UI (numbers, dates, formulas).
    #[default]
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::UserEntered => "USER_ENTERED",
        }
    }
}

impl fmt::Display for ValueInputOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueInputOption {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "RAW" => Ok(Self::Raw),
            "USER_ENTERED" => Ok(Self::UserEntered),
            _ => Err(SyncError::config(format!(
                "Unknown value input option '{s}'. Expected RAW or USER_ENTERED"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// One sheet (tab) of a Google spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheetsSource {
    client: ApiClient,
    base_url: Url,
    spreadsheet_id: String,
    sheet_name: String,
    value_input_option: ValueInputOption,
}

impl GoogleSheetsSource {
    pub fn new(
        client: ApiClient,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> SyncResult<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url(GOOGLE_SHEETS_API)?,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            value_input_option: ValueInputOption::default(),
        })
    }

    /// Point at a different API root, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> SyncResult<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_value_input_option(mut self, option: ValueInputOption) -> Self {
        self.value_input_option = option;
        self
    }

    fn spreadsheet_url(&self, suffix: &str) -> SyncResult<Url> {
        let target = format!("{}{suffix}", self.spreadsheet_id);
        endpoint(&self.base_url, ["spreadsheets", target.as_str()])
    }

    fn values_url(&self, range: &str) -> SyncResult<Url> {
        endpoint(
            &self.base_url,
            ["spreadsheets", self.spreadsheet_id.as_str(), "values", range],
        )
    }

    fn batch_values_url(&self) -> SyncResult<Url> {
        endpoint(
            &self.base_url,
            ["spreadsheets", self.spreadsheet_id.as_str(), "values:batchUpdate"],
        )
    }

    fn range_address(&self, range: &CellRange) -> String {
        qualified_range(&self.sheet_name, range)
    }

    async fn sheet_properties(&self) -> SyncResult<Vec<SheetProperties>> {
        let operation = "read spreadsheet metadata";
        let mut url = self.spreadsheet_url("")?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties");
        let response = send(operation, self.client.request(Method::GET, url)).await?;
        let metadata: SpreadsheetMetadata = ensure_success(operation, response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::backend(operation, format!("Failed to parse JSON: {e}")))?;
        Ok(metadata.sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn sheet_not_found(&self) -> SyncError {
        match self.sheet_properties().await {
            Ok(sheets) => SyncError::SheetNotFound {
                sheet: self.sheet_name.clone(),
                available: sheets.into_iter().map(|s| s.title).collect(),
            },
            Err(e) => SyncError::backend_status(
                "read sheet",
                StatusCode::BAD_REQUEST.as_u16(),
                format!(
                    "Sheet '{}' not found. Could not retrieve available sheets: {e}",
                    self.sheet_name
                ),
            ),
        }
    }

    async fn write_values(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: JsonValue,
    ) -> SyncResult<()> {
        let request = self.client.request(method, url).query(query).json(&body);
        let response = send(operation, request).await?;
        ensure_success(operation, response).await?;
        Ok(())
    }
}

#[async_trait]
impl TableSource for GoogleSheetsSource {
    fn describe(&self) -> String {
        format!("google:{}/{}", self.spreadsheet_id, self.sheet_name)
    }

    async fn used_range(&mut self) -> SyncResult<Vec<Vec<String>>> {
        let operation = "read sheet";
        let url = self.values_url(&sanitize_sheet_name(&self.sheet_name))?;
        let response = send(operation, self.client.request(Method::GET, url)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            StatusCode::BAD_REQUEST => return Err(self.sheet_not_found().await),
            _ => {}
        }

        let body = read_json(operation, response).await?;
        Ok(normalize_used_range(value_rows(body.get("values"))))
    }

    async fn append(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        let url = self.values_url(&format!("{}:append", self.range_address(range)))?;
        tracing::debug!("Appending {} row(s) at {}", values.len(), range);
        self.write_values(
            "append rows",
            Method::POST,
            url,
            &[
                ("valueInputOption", self.value_input_option.as_str()),
                ("insertDataOption", "INSERT_ROWS"),
            ],
            json!({ "values": values, "majorDimension": "ROWS" }),
        )
        .await
    }

    async fn patch(&mut self, range: &CellRange, values: Vec<Vec<String>>) -> SyncResult<()> {
        let url = self.values_url(&self.range_address(range))?;
        self.write_values(
            "write range",
            Method::PUT,
            url,
            &[("valueInputOption", self.value_input_option.as_str())],
            json!({ "values": values, "majorDimension": "ROWS" }),
        )
        .await
    }

    /// One `values:batchUpdate` call. Google applies it atomically, so a
    /// rejection fails the whole batch.
    async fn patch_batch(&mut self, updates: Vec<RangeUpdate>) -> SyncResult<Vec<SyncResult<()>>> {
        let count = updates.len();
        let data: Vec<JsonValue> = updates
            .into_iter()
            .map(|u| {
                json!({
                    "range": self.range_address(&u.range),
                    "majorDimension": "ROWS",
                    "values": u.values,
                })
            })
            .collect();
        let url = self.batch_values_url()?;
        self.write_values(
            "batch update",
            Method::POST,
            url,
            &[],
            json!({ "valueInputOption": self.value_input_option.as_str(), "data": data }),
        )
        .await?;
        Ok((0..count).map(|_| Ok(())).collect())
    }

    async fn clear(&mut self) -> SyncResult<()> {
        let address = sanitize_sheet_name(&self.sheet_name);
        let url = self.values_url(&format!("{address}:clear"))?;
        self.write_values("clear sheet", Method::POST, url, &[], json!({}))
            .await
    }

    async fn add_columns(&mut self, start_col: u32, headers: Vec<String>) -> SyncResult<()> {
        let range = CellRange::with_size(CellAddress::from_numbers(1, start_col)?, 1, headers.len())?;
        let url = self.values_url(&self.range_address(&range))?;
        self.write_values(
            "add columns",
            Method::PUT,
            url,
            &[("valueInputOption", self.value_input_option.as_str())],
            json!({ "values": [headers], "majorDimension": "ROWS" }),
        )
        .await
    }

    /// Banded rows with a bold white header on blue, and a frozen header row.
    async fn format_as_table(&mut self, rows: usize, cols: usize) -> SyncResult<()> {
        let sheet_id = self
            .sheet_properties()
            .await?
            .into_iter()
            .find(|s| s.title == self.sheet_name)
            .map(|s| s.sheet_id)
            .ok_or_else(|| {
                SyncError::backend(
                    "format table",
                    format!("Could not find sheet ID for '{}'", self.sheet_name),
                )
            })?;

        let body = json!({
            "requests": [
                {
                    "addBanding": {
                        "bandedRange": {
                            "range": {
                                "sheetId": sheet_id,
                                "startRowIndex": 0,
                                "endRowIndex": rows,
                                "startColumnIndex": 0,
                                "endColumnIndex": cols,
                            },
                            "rowProperties": {
                                "headerColor": { "red": 0.26, "green": 0.52, "blue": 0.96, "alpha": 1.0 },
                                "firstBandColor": { "red": 1.0, "green": 1.0, "blue": 1.0, "alpha": 1.0 },
                                "secondBandColor": { "red": 0.92, "green": 0.95, "blue": 0.99, "alpha": 1.0 },
                            },
                        },
                    },
                },
                {
                    "repeatCell": {
                        "range": {
                            "sheetId": sheet_id,
                            "startRowIndex": 0,
                            "endRowIndex": 1,
                            "startColumnIndex": 0,
                            "endColumnIndex": cols,
                        },
                        "cell": {
                            "userEnteredFormat": {
                                "textFormat": {
                                    "bold": true,
                                    "foregroundColor": { "red": 1.0, "green": 1.0, "blue": 1.0, "alpha": 1.0 },
                                },
                            },
                        },
                        "fields": "userEnteredFormat.textFormat",
                    },
                },
                {
                    "updateSheetProperties": {
                        "properties": {
                            "sheetId": sheet_id,
                            "gridProperties": { "frozenRowCount": 1 },
                        },
                        "fields": "gridProperties.frozenRowCount",
                    },
                },
            ],
        });

        let url = self.spreadsheet_url(":batchUpdate")?;
        self.write_values("format table", Method::POST, url, &[], body)
            .await?;
        tracing::info!("Applied table formatting to {}", self.sheet_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_input_option_from_str() {
        assert_eq!("raw".parse::<ValueInputOption>().unwrap(), ValueInputOption::Raw);
        assert_eq!(
            "user-entered".parse::<ValueInputOption>().unwrap(),
            ValueInputOption::UserEntered
        );
        assert!("parsed".parse::<ValueInputOption>().is_err());
        assert_eq!(ValueInputOption::default().as_str(), "USER_ENTERED");
    }

    #[test]
    fn test_urls() {
        let source = GoogleSheetsSource::new(ApiClient::new("t").unwrap(), "abc", "Sales Data")
            .unwrap();
        assert_eq!(
            source.values_url("Sheet1!A1:B2").unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1!A1:B2"
        );
        assert_eq!(
            source.spreadsheet_url(":batchUpdate").unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc:batchUpdate"
        );
        assert_eq!(
            source.range_address(&CellRange::row_span(3, 2).unwrap()),
            "'Sales Data'!A3:B3"
        );
        assert_eq!(source.describe(), "google:abc/Sales Data");
    }
}
