use crate::dialect::CsvDialect;
use crate::error::{MergeError, Result};
use crate::record::{field_text, merge_record, record_key, Record};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// CSV rows keyed by the value of their id column.
#[derive(Debug, Clone)]
pub struct CsvData {
    id_key: String,
    dialect: CsvDialect,
    records: IndexMap<Option<String>, Record>,
}

impl CsvData {
    /// Create an empty data set
    pub fn new(id_key: impl Into<String>, dialect: CsvDialect) -> Self {
        CsvData {
            id_key: id_key.into(),
            dialect,
            records: IndexMap::new(),
        }
    }

    /// Load rows from a CSV file whose first row names the fields
    pub fn load<P: AsRef<Path>>(path: P, id_key: &str, dialect: CsvDialect) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file), id_key, dialect)
    }

    /// Load rows from a reader.
    ///
    /// Field names and values are trimmed. Cells missing from a short row
    /// read as `""`; cells beyond the header are dropped. A repeated id
    /// keeps the last row.
    pub fn from_reader<R: Read>(reader: R, id_key: &str, dialect: CsvDialect) -> Result<Self> {
        let mut csv_reader = dialect.reader().from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut data = CsvData::new(id_key, dialect);
        for result in csv_reader.records() {
            let row = result?;
            let record: Record = headers
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = row.get(i).map(str::trim).unwrap_or_default();
                    (name.clone(), Value::String(value.to_string()))
                })
                .collect();
            data.records.insert(record_key(&record, id_key), record);
        }
        Ok(data)
    }

    pub fn id_key(&self) -> &str {
        &self.id_key
    }

    pub fn dialect(&self) -> &CsvDialect {
        &self.dialect
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Record stored under `key` (`None` is the missing-id key)
    pub fn get(&self, key: Option<&str>) -> Option<&Record> {
        self.records.get(&key.map(ToString::to_string))
    }

    /// Merge `record` into the row with the same id, or add it as a new
    /// row. Returns `true` when an existing row was updated.
    pub fn upsert(&mut self, record: &Record) -> bool {
        let key = record_key(record, &self.id_key);
        match self.records.get_mut(&key) {
            Some(existing) => {
                merge_record(existing, record);
                true
            }
            None => {
                self.records.insert(key, record.clone());
                false
            }
        }
    }

    /// Sorted union of every row's field names
    pub fn field_names(&self) -> Vec<String> {
        self.records
            .values()
            .flat_map(|record| record.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Write the header and all rows to a writer
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let fields = self.field_names();
        let mut csv_writer = self.dialect.writer().from_writer(writer);

        if !fields.is_empty() {
            csv_writer.write_record(&fields)?;
        }
        for record in self.records.values() {
            let row: Vec<String> = fields
                .iter()
                .map(|field| record.get(field).map(field_text).unwrap_or_default())
                .collect();
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Save to a CSV file, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        crate::ensure_parent_dir(path)?;
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    /// Convert to a CSV string
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MergeError::parser(e.to_string()))
    }
}
