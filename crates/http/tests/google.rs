//! Google Sheets backend tests against a mock values API.

use serde_json::json;
use tablesync_core::{InputFormat, RecordSet, SyncError, WriteConfig, WriteMode};
use tablesync_http::{ApiClient, GoogleSheetsSource, ValueInputOption};
use tablesync_sheet::{post, TableSource, WriteEngine};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn source(server: &MockServer, sheet: &str) -> GoogleSheetsSource {
    GoogleSheetsSource::new(ApiClient::new("test-token").unwrap(), "abc", sheet)
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
}

async fn mount_sheet(server: &MockServer, values: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc/values/Sheet1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:Z1000",
            "majorDimension": "ROWS",
            "values": values,
        })))
        .mount(server)
        .await;
}

// ===== Read Tests =====

#[tokio::test]
async fn test_used_range_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc/values/Sheet1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["id", "score"], [1, 9.5], [2, null]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1");
    let rows = sheet.used_range().await.unwrap();
    assert_eq!(
        rows,
        vec![strings(&["id", "score"]), strings(&["1", "9.5"]), strings(&["2", ""])]
    );
}

#[tokio::test]
async fn test_used_range_missing_values_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc/values/Sheet1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:Z1000",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1");
    assert!(sheet.used_range().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_used_range_not_found_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc/values/Sheet1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1");
    assert!(sheet.used_range().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_sheet_lists_available_sheets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc/values/Missing"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Unable to parse range"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc"))
        .and(query_param("fields", "sheets.properties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [
                {"properties": {"sheetId": 0, "title": "Sheet1"}},
                {"properties": {"sheetId": 7, "title": "Data"}}
            ]
        })))
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Missing");
    let err = sheet.used_range().await.unwrap_err();
    match &err {
        SyncError::SheetNotFound { sheet, available } => {
            assert_eq!(sheet, "Missing");
            assert_eq!(available, &strings(&["Sheet1", "Data"]));
        }
        other => panic!("Expected SheetNotFound, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Sheet 'Missing' not found. Available sheets: Sheet1, Data"
    );
}

// ===== Write Tests =====

#[tokio::test]
async fn test_replace_clears_and_writes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc/values/Sheet1:clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/spreadsheets/abc/values/Sheet1!A1:B2"))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_json(json!({
            "values": [["id", "name"], ["1", "Alice"]],
            "majorDimension": "ROWS"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1").with_value_input_option(ValueInputOption::Raw);
    let outcome = post(
        &mut sheet,
        b"id,name\n1,Alice\n",
        InputFormat::Csv,
        WriteConfig::new(WriteMode::Replace),
    )
    .await
    .unwrap();
    assert_eq!(outcome.rows_written, 1);
}

#[tokio::test]
async fn test_append_to_quoted_sheet_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc/values/'Sales%20Data'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["id", "name"], ["1", "Alice"]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc/values/'Sales%20Data'!A3:B3:append"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(body_json(json!({
            "values": [["2", "Bob"]],
            "majorDimension": "ROWS"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sales Data");
    let outcome = post(
        &mut sheet,
        b"id,name\n2,Bob\n",
        InputFormat::Csv,
        WriteConfig::new(WriteMode::Append),
    )
    .await
    .unwrap();
    assert_eq!(outcome.rows_appended, 1);
}

#[tokio::test]
async fn test_upsert_batches_matched_rows_and_appends_rest() {
    let server = MockServer::start().await;
    mount_sheet(&server, json!([["id", "name"], ["1", "Alice"], ["2", "Bob"]])).await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc/values:batchUpdate"))
        .and(body_json(json!({
            "valueInputOption": "USER_ENTERED",
            "data": [
                {"range": "Sheet1!A3:B3", "majorDimension": "ROWS", "values": [["2", "Bobby"]]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc/values/Sheet1!A4:B4:append"))
        .and(body_json(json!({
            "values": [["3", "Cara"]],
            "majorDimension": "ROWS"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1");
    let config = WriteConfig::new(WriteMode::Upsert).with_identifier_fields(["id"]);
    let records = RecordSet::new(
        strings(&["name", "id"]),
        vec![strings(&["Bobby", "2"]), strings(&["Cara", "3"])],
    );
    let outcome = WriteEngine::new(config)
        .unwrap()
        .write(&mut sheet, &records)
        .await
        .unwrap();

    assert_eq!(outcome.rows_updated, 1);
    assert_eq!(outcome.rows_appended, 1);
    assert_eq!(outcome.rows_written, 2);
}

#[tokio::test]
async fn test_batch_rejection_is_backend_error() {
    let server = MockServer::start().await;
    mount_sheet(&server, json!([["id", "name"], ["1", "Alice"]])).await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc/values:batchUpdate"))
        .respond_with(ResponseTemplate::new(403).set_body_string("The caller does not have permission"))
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1");
    let config = WriteConfig::new(WriteMode::Update).with_identifier_fields(["id"]);
    let err = post(&mut sheet, b"id,name\n1,Alicia\n", InputFormat::Csv, config)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("The caller does not have permission"));
}

#[tokio::test]
async fn test_add_columns_writes_header_cells() {
    let server = MockServer::start().await;
    mount_sheet(&server, json!([["id", "name"], ["1", "Alice"]])).await;
    Mock::given(method("PUT"))
        .and(path("/spreadsheets/abc/values/Sheet1!C1:C1"))
        .and(body_json(json!({
            "values": [["email"]],
            "majorDimension": "ROWS"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1");
    sheet.add_columns(3, strings(&["email"])).await.unwrap();
}

#[tokio::test]
async fn test_format_as_table_targets_sheet_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [
                {"properties": {"sheetId": 0, "title": "Other"}},
                {"properties": {"sheetId": 42, "title": "Sheet1"}}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc:batchUpdate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut sheet = source(&server, "Sheet1");
    sheet.format_as_table(3, 2).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let batch = requests
        .iter()
        .find(|r| r.url.path() == "/spreadsheets/abc:batchUpdate")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&batch.body).unwrap();
    let banding = &body["requests"][0]["addBanding"]["bandedRange"]["range"];
    assert_eq!(banding["sheetId"], 42);
    assert_eq!(banding["endRowIndex"], 3);
    assert_eq!(banding["endColumnIndex"], 2);
    assert_eq!(
        body["requests"][2]["updateSheetProperties"]["properties"]["gridProperties"]["frozenRowCount"],
        1
    );
}
