/// Working directory and archive
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_ARCHIVE: &str = "tolldata.tgz";

/// Raw source files shipped inside the archive
pub const VEHICLE_DATA_FILE: &str = "vehicle-data.csv";
pub const TOLLPLAZA_DATA_FILE: &str = "tollplaza-data.tsv";
pub const PAYMENT_DATA_FILE: &str = "payment-data.txt";

/// Intermediate files
pub const CSV_OUTPUT_FILE: &str = "csv_data.csv";
pub const TSV_OUTPUT_FILE: &str = "tsv_data.csv";
pub const FIXED_WIDTH_OUTPUT_FILE: &str = "fixed_width_data.csv";
pub const CONSOLIDATED_OUTPUT_FILE: &str = "extracted_data.csv";
pub const TRANSFORMED_OUTPUT_FILE: &str = "transformed_data.csv";

/// Relational store
pub const DEFAULT_DATABASE: &str = "toll.db";
pub const DEFAULT_TABLE_NAME: &str = "toll_data";
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Field positions retained by each extractor (half-open ranges)
pub const VEHICLE_FIELDS: std::ops::Range<usize> = 0..4;
pub const TOLLPLAZA_FIELDS: std::ops::Range<usize> = 4..7;
pub const PAYMENT_FIELDS: std::ops::Range<usize> = 9..11;

/// Consolidated column holding the vehicle type
pub const UPPERCASE_FIELD_INDEX: usize = 3;

/// Retry policy applied by the pipeline runner
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 300;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "TOLL_ETL";
pub const DEFAULT_CONFIG_FILE: &str = "toll-etl.toml";
