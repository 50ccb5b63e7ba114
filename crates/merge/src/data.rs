use crate::csv_data::CsvData;
use crate::dialect::CsvDialect;
use crate::error::{MergeError, Result};
use crate::json_data::JsonData;
use crate::record::Record;
use crate::DataSpec;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// File format of a data set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataKind {
    #[default]
    Csv,
    Json,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Csv => write!(f, "csv"),
            DataKind::Json => write!(f, "json"),
        }
    }
}

impl FromStr for DataKind {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(DataKind::Csv),
            "json" => Ok(DataKind::Json),
            _ => Err(MergeError::UnknownKind(s.to_string())),
        }
    }
}

/// Counts from one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Base records that received patch fields
    pub updated: usize,
    /// Patch records added to the base
    pub inserted: usize,
}

/// A keyed data set that can be loaded, merged into and saved
#[derive(Debug, Clone)]
pub enum MergeableData {
    Csv(CsvData),
    Json(JsonData),
}

impl MergeableData {
    /// Load the data set described by `spec`, keying records by `id_key`
    pub fn load(spec: &DataSpec, id_key: &str) -> Result<Self> {
        match spec.kind {
            DataKind::Csv => {
                let dialect = CsvDialect::from_args(&spec.csv_args)?;
                Ok(MergeableData::Csv(CsvData::load(&spec.path, id_key, dialect)?))
            }
            DataKind::Json => Ok(MergeableData::Json(JsonData::load(
                &spec.path,
                id_key,
                spec.sub_path.as_deref(),
            )?)),
        }
    }

    pub fn kind(&self) -> DataKind {
        match self {
            MergeableData::Csv(_) => DataKind::Csv,
            MergeableData::Json(_) => DataKind::Json,
        }
    }

    /// Records in merge order, one per id
    pub fn records(&self) -> Vec<&Record> {
        match self {
            MergeableData::Csv(data) => data.records().collect(),
            MergeableData::Json(data) => data.records(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MergeableData::Csv(data) => data.len(),
            MergeableData::Json(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge every record of `patch` into this data set by id.
    ///
    /// A matching record takes the patch's fields over its own and keeps
    /// the rest. A record with an unknown id is added.
    pub fn merge(&mut self, patch: &MergeableData) -> Result<MergeStats> {
        let records = patch.records();
        let mut stats = MergeStats::default();

        match self {
            MergeableData::Csv(data) => {
                for record in records {
                    if data.upsert(record) {
                        stats.updated += 1;
                    } else {
                        stats.inserted += 1;
                    }
                }
            }
            MergeableData::Json(data) => {
                let owned: Vec<Record> = records.into_iter().cloned().collect();
                let (updated, inserted) = data.upsert_all(&owned)?;
                stats.updated = updated;
                stats.inserted = inserted;
            }
        }

        tracing::debug!(
            "Merged {} record(s): {} updated, {} inserted",
            stats.updated + stats.inserted,
            stats.updated,
            stats.inserted
        );
        Ok(stats)
    }

    /// Save in this data set's own format
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        match self {
            MergeableData::Csv(data) => data.save(path),
            MergeableData::Json(data) => data.save(path),
        }
    }
}
