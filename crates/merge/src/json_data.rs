use crate::error::{MergeError, Result};
use crate::record::{merge_record, record_key, Record};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Records inside a JSON document.
///
/// The records live at an optional dotted sub-path (`data.items`, with
/// integer segments indexing arrays). An array target holds records in
/// order; an object target maps each id to its record. The whole document
/// is kept so saving writes it back with the root intact.
#[derive(Debug, Clone)]
pub struct JsonData {
    id_key: String,
    document: Value,
    pointer: String,
}

impl JsonData {
    /// Load a JSON file and locate its records
    pub fn load<P: AsRef<Path>>(path: P, id_key: &str, sub_path: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let document: Value = serde_json::from_reader(BufReader::new(file))?;
        Self::from_value(document, id_key, sub_path, &path.display().to_string())
    }

    /// Locate the records of an already parsed document.
    ///
    /// `source` names the document in error messages.
    pub fn from_value(
        mut document: Value,
        id_key: &str,
        sub_path: Option<&str>,
        source: &str,
    ) -> Result<Self> {
        let pointer = match sub_path.filter(|p| !p.is_empty()) {
            Some(sub_path) => resolve_pointer(&mut document, sub_path)?,
            None => String::new(),
        };

        let data = JsonData {
            id_key: id_key.to_string(),
            document,
            pointer,
        };
        match data.target() {
            Some(Value::Array(items)) => {
                if let Some(index) = items.iter().position(|item| !item.is_object()) {
                    return Err(MergeError::parser(format!(
                        "Could not parse the JSON file {source} - entry {index} is not a JSON object."
                    )));
                }
            }
            Some(Value::Object(_)) => {}
            _ => {
                return Err(MergeError::parser(format!(
                    "Could not parse the JSON file {source} - it neither contains a list, nor a JSON object."
                )))
            }
        }
        Ok(data)
    }

    pub fn id_key(&self) -> &str {
        &self.id_key
    }

    /// The full document, root included
    pub fn document(&self) -> &Value {
        &self.document
    }

    fn target(&self) -> Option<&Value> {
        self.document.pointer(&self.pointer)
    }

    fn target_mut(&mut self) -> Result<&mut Value> {
        let pointer = self.pointer.clone();
        self.document
            .pointer_mut(&pointer)
            .ok_or_else(|| MergeError::parser(format!("path {pointer} no longer resolves")))
    }

    /// Records at the target, one per id.
    ///
    /// For an array target a repeated id yields only its last entry.
    pub fn records(&self) -> Vec<&Record> {
        match self.target() {
            Some(Value::Array(items)) => {
                let mut by_key: HashMap<Option<String>, usize> = HashMap::new();
                let records: Vec<&Record> = items.iter().filter_map(Value::as_object).collect();
                for (i, record) in records.iter().enumerate() {
                    by_key.insert(record_key(record, &self.id_key), i);
                }
                records
                    .iter()
                    .enumerate()
                    .filter(|(i, record)| by_key.get(&record_key(record, &self.id_key)) == Some(i))
                    .map(|(_, record)| *record)
                    .collect()
            }
            Some(Value::Object(entries)) => entries.values().filter_map(Value::as_object).collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge each of `records` into the entry with the same id, or add it.
    ///
    /// New records are appended to an array target and inserted under
    /// their id in an object target. Returns `(updated, inserted)`.
    pub fn upsert_all(&mut self, records: &[Record]) -> Result<(usize, usize)> {
        let id_key = self.id_key.clone();
        let mut updated = 0;
        let mut inserted = 0;

        match self.target_mut()? {
            Value::Array(items) => {
                let mut index: HashMap<Option<String>, usize> = HashMap::new();
                for (i, item) in items.iter().enumerate() {
                    if let Some(record) = item.as_object() {
                        index.insert(record_key(record, &id_key), i);
                    }
                }
                for record in records {
                    let key = record_key(record, &id_key);
                    match index.get(&key).and_then(|&i| items.get_mut(i)) {
                        Some(Value::Object(existing)) => {
                            merge_record(existing, record);
                            updated += 1;
                        }
                        _ => {
                            index.insert(key, items.len());
                            items.push(Value::Object(record.clone()));
                            inserted += 1;
                        }
                    }
                }
            }
            Value::Object(entries) => {
                for record in records {
                    let key = record_key(record, &id_key).unwrap_or_else(|| "null".to_string());
                    match entries.get_mut(&key) {
                        Some(Value::Object(existing)) => {
                            merge_record(existing, record);
                            updated += 1;
                        }
                        Some(other) => {
                            *other = Value::Object(record.clone());
                            updated += 1;
                        }
                        None => {
                            entries.insert(key, Value::Object(record.clone()));
                            inserted += 1;
                        }
                    }
                }
            }
            _ => {
                return Err(MergeError::parser(
                    "JSON target is neither a list nor a JSON object",
                ))
            }
        }
        Ok((updated, inserted))
    }

    /// Write the whole document as pretty JSON
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.document)?;
        Ok(())
    }

    /// Save the whole document, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        crate::ensure_parent_dir(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Walk `sub_path` through `document` and return the JSON pointer of the
/// target. A missing object key gets an empty object so merged records
/// land in the saved document.
fn resolve_pointer(document: &mut Value, sub_path: &str) -> Result<String> {
    let mut pointer = String::new();
    let mut current = document;

    for segment in sub_path.split('.') {
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index: usize = segment.parse().map_err(|_| {
                    MergeError::parser(format!(
                        "path {sub_path} does not fit the delivered structure"
                    ))
                })?;
                items.get_mut(index).ok_or_else(|| {
                    MergeError::parser(format!(
                        "Index error: the delivered structure does not contain an index {index}"
                    ))
                })?
            }
            _ => {
                return Err(MergeError::parser(format!(
                    "path {sub_path} does not fit the delivered structure"
                )))
            }
        };
        pointer.push('/');
        pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    }

    Ok(pointer)
}
