use crate::error::{ProcessingError, Result};
use crate::models::SourceFormat;
use crate::utils::constants::*;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Paths, table name and retry policy for one pipeline run.
///
/// File names are resolved against `data_dir`; `database` is used as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub archive: String,

    pub vehicle_file: String,
    pub tollplaza_file: String,
    pub payment_file: String,

    pub csv_output: String,
    pub tsv_output: String,
    pub fixed_width_output: String,
    pub consolidated_output: String,
    pub transformed_output: String,

    pub database: PathBuf,

    #[validate(custom(function = "validate_table_name"))]
    pub table_name: String,

    #[validate(range(min = 1))]
    pub sample_size: usize,

    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            archive: DEFAULT_ARCHIVE.to_string(),
            vehicle_file: VEHICLE_DATA_FILE.to_string(),
            tollplaza_file: TOLLPLAZA_DATA_FILE.to_string(),
            payment_file: PAYMENT_DATA_FILE.to_string(),
            csv_output: CSV_OUTPUT_FILE.to_string(),
            tsv_output: TSV_OUTPUT_FILE.to_string(),
            fixed_width_output: FIXED_WIDTH_OUTPUT_FILE.to_string(),
            consolidated_output: CONSOLIDATED_OUTPUT_FILE.to_string(),
            transformed_output: TRANSFORMED_OUTPUT_FILE.to_string(),
            database: PathBuf::from(DEFAULT_DATABASE),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            retries: DEFAULT_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then the optional TOML file, then `TOLL_ETL_*`
    /// environment variables, and validate the result.
    ///
    /// An explicitly given file must exist; the default `toll-etl.toml` is
    /// only read when present.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file_source = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Same as `Default`, rooted at another working directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join(&self.archive)
    }

    pub fn source_path(&self, format: SourceFormat) -> PathBuf {
        let name = match format {
            SourceFormat::Csv => &self.vehicle_file,
            SourceFormat::Tsv => &self.tollplaza_file,
            SourceFormat::FixedWidth => &self.payment_file,
        };
        self.data_dir.join(name)
    }

    pub fn extracted_path(&self, format: SourceFormat) -> PathBuf {
        let name = match format {
            SourceFormat::Csv => &self.csv_output,
            SourceFormat::Tsv => &self.tsv_output,
            SourceFormat::FixedWidth => &self.fixed_width_output,
        };
        self.data_dir.join(name)
    }

    /// Intermediate files in consolidation order
    pub fn extracted_paths(&self) -> Vec<PathBuf> {
        SourceFormat::ALL
            .iter()
            .map(|f| self.extracted_path(*f))
            .collect()
    }

    pub fn consolidated_path(&self) -> PathBuf {
        self.data_dir.join(&self.consolidated_output)
    }

    pub fn transformed_path(&self) -> PathBuf {
        self.data_dir.join(&self.transformed_output)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// True for a plain SQL identifier: a letter or underscore followed by
/// letters, digits or underscores
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reject anything but a plain identifier before it is interpolated into SQL
pub fn check_table_name(name: &str) -> Result<()> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(ProcessingError::InvalidIdentifier(name.to_string()))
    }
}

fn validate_table_name(name: &str) -> std::result::Result<(), ValidationError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_table_name"))
    }
}
