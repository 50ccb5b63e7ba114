//! Input payload parsing.
//!
//! Accepted payloads:
//! - CSV, first record is the header row. Ragged rows pass through as-is.
//! - JSON array of objects: `[{"id": 1, "name": "Alice"}, ...]`
//! - JSON positional table: `{"headers": [...], "rows": [[...], ...]}`
//! - JSON keyed table: `{"headers": [...], "rows": [{...}, ...]}`
//!
//! A payload with no data rows parses to `None`, meaning "nothing to write".

use serde_json::{Map, Value};
use tablesync_core::{InputFormat, RecordSet, SyncError, SyncResult};

const UNSUPPORTED_JSON: &str = "Unsupported JSON format: expected an array of objects \
     or an object with 'headers' and 'rows'";

/// Parse a raw payload into a record set.
pub fn parse_input(content: &[u8], format: InputFormat) -> SyncResult<Option<RecordSet>> {
    let text = std::str::from_utf8(content)
        .map_err(|e| SyncError::parse(format!("Input is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    match format {
        InputFormat::Csv => parse_csv(text),
        InputFormat::Json => parse_json(text),
    }
}

/// Parse CSV text; the first record is the header row.
pub fn parse_csv(text: &str) -> SyncResult<Option<RecordSet>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| SyncError::parse(format!("Invalid CSV: {e}")))?;
        records.push(record.iter().map(ToString::to_string).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let Some(headers) = records.next() else {
        return Ok(None);
    };
    let rows: Vec<Vec<String>> = records.collect();
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(RecordSet::new(headers, rows)))
}

/// Parse JSON text in one of the three accepted shapes.
pub fn parse_json(text: &str) -> SyncResult<Option<RecordSet>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SyncError::parse(format!("Invalid JSON: {e}")))?;

    match &value {
        Value::Array(items) if items.first().is_some_and(Value::is_object) => {
            let headers: Vec<String> = items[0]
                .as_object()
                .map(|obj| obj.keys().cloned().collect())
                .unwrap_or_default();
            let rows = keyed_rows(items, &headers)?;
            Ok(Some(RecordSet::new(headers, rows)))
        }
        Value::Object(obj) if obj.contains_key("headers") && obj.contains_key("rows") => {
            parse_table_object(obj)
        }
        Value::Array(items) if items.is_empty() => Err(SyncError::parse(format!(
            "{UNSUPPORTED_JSON} (got an empty array)"
        ))),
        Value::Array(_) => Err(SyncError::parse(format!(
            "{UNSUPPORTED_JSON} (got an array of non-objects)"
        ))),
        other => Err(SyncError::parse(format!(
            "{UNSUPPORTED_JSON} (got {})",
            json_kind(other)
        ))),
    }
}

fn parse_table_object(obj: &Map<String, Value>) -> SyncResult<Option<RecordSet>> {
    let headers: Vec<String> = obj
        .get("headers")
        .and_then(Value::as_array)
        .ok_or_else(|| SyncError::parse("'headers' must be an array"))?
        .iter()
        .map(cell_text)
        .collect();

    let rows = obj
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| SyncError::parse("'rows' must be an array"))?;

    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let rows = match first {
        Value::Array(_) => rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                row.as_array()
                    .map(|cells| cells.iter().map(cell_text).collect())
                    .ok_or_else(|| {
                        SyncError::parse(format!("Row at index {idx} must be an array"))
                    })
            })
            .collect::<SyncResult<Vec<Vec<String>>>>()?,
        Value::Object(_) => keyed_rows(rows, &headers)?,
        other => {
            return Err(SyncError::parse(format!(
                "Unsupported row format: rows must be arrays or objects (got {})",
                json_kind(other)
            )))
        }
    };

    Ok(Some(RecordSet::new(headers, rows)))
}

fn keyed_rows(items: &[Value], headers: &[String]) -> SyncResult<Vec<Vec<String>>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let obj = item.as_object().ok_or_else(|| {
                SyncError::parse(format!("Element at index {idx} must be an object"))
            })?;
            Ok(headers
                .iter()
                .map(|h| obj.get(h).map(cell_text).unwrap_or_default())
                .collect())
        })
        .collect()
}

/// Render a JSON value as cell text. Nested values keep their JSON form.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_csv_basic() {
        let set = parse_csv("id,name\n1,Alice\n2,Bob").unwrap().unwrap();
        assert_eq!(set.headers(), strings(&["id", "name"]).as_slice());
        assert_eq!(set.rows()[1], strings(&["2", "Bob"]));
    }

    #[test]
    fn test_csv_ragged_rows_pass_through() {
        let set = parse_csv("a,b,c\n1\n1,2,3,4").unwrap().unwrap();
        assert_eq!(set.rows()[0], strings(&["1"]));
        assert_eq!(set.rows()[1].len(), 4);
        assert_eq!(set.value(0, "c"), "");
    }

    #[test]
    fn test_csv_header_only_is_nothing_to_write() {
        assert!(parse_csv("id,name\n").unwrap().is_none());
        assert!(parse_csv("").unwrap().is_none());
    }

    #[test]
    fn test_json_array_of_objects() {
        let set = parse_json(r#"[{"id": 1, "name": "Alice"}, {"name": "Bob", "extra": true}]"#)
            .unwrap()
            .unwrap();
        assert_eq!(set.headers(), strings(&["id", "name"]).as_slice());
        assert_eq!(set.rows()[0], strings(&["1", "Alice"]));
        assert_eq!(set.rows()[1], strings(&["", "Bob"]));
    }

    #[test]
    fn test_json_keeps_first_object_key_order() {
        let set = parse_json(r#"[{"zeta": 1, "alpha": 2}]"#).unwrap().unwrap();
        assert_eq!(set.headers(), strings(&["zeta", "alpha"]).as_slice());
    }

    #[test]
    fn test_json_positional_rows() {
        let set = parse_json(r#"{"headers": ["a", "b"], "rows": [[1, null], ["x"]]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(set.rows()[0], strings(&["1", ""]));
        assert_eq!(set.rows()[1], strings(&["x"]));
    }

    #[test]
    fn test_json_keyed_rows_follow_header_order() {
        let set = parse_json(r#"{"headers": ["b", "a"], "rows": [{"a": 1, "b": 2, "c": 3}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(set.rows()[0], strings(&["2", "1"]));
    }

    #[test]
    fn test_json_empty_rows_is_nothing_to_write() {
        assert!(parse_json(r#"{"headers": ["a"], "rows": []}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_json_unsupported_shapes() {
        for payload in ["[]", "42", "\"text\"", "[1, 2]", r#"{"rows": []}"#, "null"] {
            let err = parse_json(payload).unwrap_err();
            assert!(matches!(err, SyncError::Parse(_)), "{payload}");
        }
    }

    #[test]
    fn test_json_nested_values_become_text() {
        let set = parse_json(r#"[{"tags": ["a", "b"], "meta": {"k": 1}}]"#)
            .unwrap()
            .unwrap();
        assert_eq!(set.rows()[0], strings(&[r#"["a","b"]"#, r#"{"k":1}"#]));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse_input(&[0xff, 0xfe, 0x00], InputFormat::Csv).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let set = parse_input("\u{feff}id\n1".as_bytes(), InputFormat::Csv)
            .unwrap()
            .unwrap();
        assert_eq!(set.headers(), strings(&["id"]).as_slice());
    }
}
