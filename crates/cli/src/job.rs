//! YAML job files for `tablesync post`.
//!
//! ```yaml
//! backend:
//!   type: google_sheets
//!   spreadsheet_id: 1AbC
//! token_env: GOOGLE_TOKEN
//! format: csv
//! write:
//!   sheet_name: Customers
//!   mode: upsert
//!   identifier_fields: [id]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tablesync_core::{InputFormat, WriteConfig};
use tablesync_http::{
    ApiClient, ExcelWorkbookSource, GoogleSheetsSource, ValueInputOption, WorkbookLocation,
};
use tablesync_sheet::{CsvFileTable, TableSource};

/// Environment variable holding the bearer token when the job names none.
pub const DEFAULT_TOKEN_ENV: &str = "TABLESYNC_TOKEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub format: InputFormat,
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default)]
    pub write: WriteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    GoogleSheets {
        spreadsheet_id: String,
        #[serde(default)]
        value_input_option: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    Excel {
        #[serde(default)]
        file_path: Option<String>,
        #[serde(default)]
        drive_id: Option<String>,
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    CsvFile {
        path: PathBuf,
    },
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid job file: {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    fn token(&self) -> Result<String> {
        let name = self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
        std::env::var(name)
            .with_context(|| format!("Environment variable {name} must hold an access token"))
    }

    /// Build the table the job writes to.
    pub fn open_backend(&self) -> Result<Box<dyn TableSource>> {
        match &self.backend {
            BackendConfig::GoogleSheets {
                spreadsheet_id,
                value_input_option,
                base_url,
            } => {
                let client = ApiClient::new(self.token()?)?;
                let mut source =
                    GoogleSheetsSource::new(client, spreadsheet_id, &self.write.sheet_name)?;
                if let Some(option) = value_input_option {
                    source = source.with_value_input_option(option.parse::<ValueInputOption>()?);
                }
                if let Some(url) = base_url {
                    source = source.with_base_url(url)?;
                }
                Ok(Box::new(source))
            }
            BackendConfig::Excel {
                file_path,
                drive_id,
                item_id,
                base_url,
            } => {
                let location = match (file_path, drive_id, item_id) {
                    (Some(path), None, None) => WorkbookLocation::FilePath(path.clone()),
                    (None, Some(drive_id), Some(item_id)) => WorkbookLocation::DriveItem {
                        drive_id: drive_id.clone(),
                        item_id: item_id.clone(),
                    },
                    _ => bail!("Excel backend needs either file_path or both drive_id and item_id"),
                };
                let client = ApiClient::new(self.token()?)?;
                let mut source = ExcelWorkbookSource::new(client, location, &self.write.sheet_name)?;
                if let Some(url) = base_url {
                    source = source.with_base_url(url)?;
                }
                Ok(Box::new(source))
            }
            BackendConfig::CsvFile { path } => Ok(Box::new(CsvFileTable::new(path))),
        }
    }
}
