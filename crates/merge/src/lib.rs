//! # tablesync-merge
//!
//! Merge one keyed data set into another.
//!
//! Both sides are CSV or JSON files whose records carry an id field. Each
//! patch record is matched to the base record with the same id: matching
//! records take the patch's fields (base-only fields are kept), unknown ids
//! are added. The result is written in the base's format.
//!
//! ```no_run
//! use tablesync_merge::{merge_files, DataSpec, MergeRequest};
//!
//! let request = MergeRequest::new(
//!     "id",
//!     DataSpec::csv("customers.csv"),
//!     DataSpec::json("changes.json").with_sub_path("data.items"),
//!     "merged.csv",
//! );
//! let stats = merge_files(&request)?;
//! println!("{} updated, {} inserted", stats.updated, stats.inserted);
//! # Ok::<(), tablesync_merge::MergeError>(())
//! ```

mod csv_data;
mod data;
mod dialect;
mod error;
mod json_data;
mod record;

pub use csv_data::CsvData;
pub use data::{DataKind, MergeStats, MergeableData};
pub use dialect::{is_true, parse_csv_args, CsvDialect, Quoting};
pub use error::{MergeError, Result};
pub use json_data::JsonData;
pub use record::{merge_record, record_key, Record};

use std::path::{Path, PathBuf};

/// Where one side of a merge lives and how to read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSpec {
    pub path: PathBuf,
    pub kind: DataKind,
    /// Dotted path to the records inside a JSON document
    pub sub_path: Option<String>,
    /// CSV dialect arguments, `arg=value,arg2=value2`
    pub csv_args: String,
}

impl DataSpec {
    pub fn new(path: impl Into<PathBuf>, kind: DataKind) -> Self {
        DataSpec {
            path: path.into(),
            kind,
            sub_path: None,
            csv_args: String::new(),
        }
    }

    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DataKind::Csv)
    }

    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DataKind::Json)
    }

    #[must_use]
    pub fn with_sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    #[must_use]
    pub fn with_csv_args(mut self, csv_args: impl Into<String>) -> Self {
        self.csv_args = csv_args.into();
        self
    }
}

/// One merge job: base input, patch, and output path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub id_key: String,
    pub input: DataSpec,
    pub patch: DataSpec,
    /// Written in the input's format
    pub output: PathBuf,
}

impl MergeRequest {
    pub fn new(
        id_key: impl Into<String>,
        input: DataSpec,
        patch: DataSpec,
        output: impl Into<PathBuf>,
    ) -> Self {
        MergeRequest {
            id_key: id_key.into(),
            input,
            patch,
            output: output.into(),
        }
    }
}

/// Load the input and the patch, merge, and save to the output path
pub fn merge_files(request: &MergeRequest) -> Result<MergeStats> {
    for spec in [&request.input, &request.patch] {
        if !spec.path.is_file() {
            return Err(MergeError::MissingPath(spec.path.clone()));
        }
    }

    let mut base = MergeableData::load(&request.input, &request.id_key)?;
    let patch = MergeableData::load(&request.patch, &request.id_key)?;
    let stats = base.merge(&patch)?;
    base.save(&request.output)?;

    tracing::info!(
        "Merged {} into {}: {} updated, {} inserted, saved to {}",
        request.patch.path.display(),
        request.input.path.display(),
        stats.updated,
        stats.inserted,
        request.output.display()
    );
    Ok(stats)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
