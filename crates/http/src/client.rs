//! Shared HTTP plumbing for the spreadsheet backends.

use std::fmt;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde_json::Value as JsonValue;
use tablesync_core::{SyncError, SyncResult};
use tablesync_sheet::cell_text;

/// Authenticated JSON client for spreadsheet APIs.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    token: String,
}

impl ApiClient {
    /// Constructs a client sending `token` as a bearer credential.
    ///
    /// Uses a 30-second timeout and bypasses system proxy lookup.
    pub fn new(token: impl Into<String>) -> SyncResult<Self> {
        Self::with_timeout(token, 30)
    }

    /// Constructs a client with a custom per-request timeout in seconds.
    pub fn with_timeout(token: impl Into<String>, timeout_secs: u64) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .no_proxy()
            .build()
            .map_err(|e| SyncError::backend("build http client", e.to_string()))?;

        Ok(Self {
            client,
            token: token.into(),
        })
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Send `request`, mapping transport failures to backend errors.
pub(crate) async fn send(operation: &str, request: RequestBuilder) -> SyncResult<Response> {
    request
        .send()
        .await
        .map_err(|e| SyncError::backend(operation, e.to_string()))
}

/// Turn a non-success response into a backend error carrying status and body.
pub(crate) async fn ensure_success(operation: &str, response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::backend_status(operation, status.as_u16(), body))
}

pub(crate) async fn read_json(operation: &str, response: Response) -> SyncResult<JsonValue> {
    let response = ensure_success(operation, response).await?;
    response
        .json()
        .await
        .map_err(|e| SyncError::backend(operation, format!("Failed to parse JSON: {e}")))
}

/// Append percent-encoded path segments to `base`.
pub(crate) fn endpoint<I, S>(base: &Url, segments: I) -> SyncResult<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| SyncError::config(format!("Invalid base URL: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn parse_base_url(base_url: &str) -> SyncResult<Url> {
    Url::parse(base_url).map_err(|e| SyncError::config(format!("Invalid base URL '{base_url}': {e}")))
}

/// Rows of a `values` array, with every cell rendered as text.
pub(crate) fn value_rows(values: Option<&JsonValue>) -> Vec<Vec<String>> {
    values
        .and_then(JsonValue::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().map(cell_text).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}
