use serde_json::{Map, Value};

/// One record: field name to value, in field order.
pub type Record = Map<String, Value>;

/// Identity of a record under `id_key`.
///
/// Strings are used verbatim and other scalars by their JSON text, so
/// CSV `"1"` and JSON `1` share a key. A missing or `null` id is `None`,
/// which is still a key of its own.
pub fn record_key(record: &Record, id_key: &str) -> Option<String> {
    match record.get(id_key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Overlay `patch` onto `base`. Patch fields win; base-only fields stay.
pub fn merge_record(base: &mut Record, patch: &Record) {
    for (field, value) in patch {
        base.insert(field.clone(), value.clone());
    }
}

/// Text of a field value as written to CSV.
pub(crate) fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key(&record(json!({"id": "a1"})), "id"), Some("a1".into()));
        assert_eq!(record_key(&record(json!({"id": 7})), "id"), Some("7".into()));
        assert_eq!(record_key(&record(json!({"id": null})), "id"), None);
        assert_eq!(record_key(&record(json!({"name": "x"})), "id"), None);
    }

    #[test]
    fn test_merge_record_last_writer_wins() {
        let mut base = record(json!({"id": 1, "a": 0, "c": 3}));
        merge_record(&mut base, &record(json!({"id": 1, "a": 1, "b": 2})));
        assert_eq!(Value::Object(base), json!({"id": 1, "a": 1, "c": 3, "b": 2}));
    }

    #[test]
    fn test_field_text() {
        assert_eq!(field_text(&json!(null)), "");
        assert_eq!(field_text(&json!("x")), "x");
        assert_eq!(field_text(&json!(2.5)), "2.5");
        assert_eq!(field_text(&json!(true)), "true");
        assert_eq!(field_text(&json!([1, 2])), "[1,2]");
    }
}
