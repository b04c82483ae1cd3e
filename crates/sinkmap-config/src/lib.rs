//! Configuration file handling for sinkmap.
//!
//! Looks for `.config/sinkmap.styx` in the current directory or any parent directory.
//!
//! ```styx
//! write-mode @upsert
//! batch-size 500
//! mappings (
//!     {
//!         source orders
//!         table order_line
//!         all-fields true
//!         fields {quantity qty}
//!     }
//! )
//! ```

use facet::Facet;
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Batch size used when the configuration does not set one.
pub const DEFAULT_BATCH_SIZE: usize = 3000;

const CONFIG_PATH: &str = ".config/sinkmap.styx";

/// How rows are written to the target tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Facet)]
#[facet(rename_all = "lowercase")]
#[repr(u8)]
pub enum WriteMode {
    /// Append-only inserts.
    #[default]
    Insert,
    /// Insert-or-update, keyed by the table's primary key.
    Upsert,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Insert => write!(f, "INSERT"),
            WriteMode::Upsert => write!(f, "UPSERT"),
        }
    }
}

/// Top-level sink configuration.
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "kebab-case")]
pub struct Config {
    /// Write mode shared by every mapping (defaults to insert).
    #[facet(default)]
    pub write_mode: Option<WriteMode>,

    /// Number of records per batch (defaults to [`DEFAULT_BATCH_SIZE`]).
    #[facet(default)]
    pub batch_size: Option<usize>,

    /// One entry per source routed to a table.
    #[facet(default)]
    pub mappings: Vec<TableMapping>,
}

/// A declared mapping from one source to one table.
#[derive(Debug, Clone, Default, PartialEq, Facet)]
#[facet(rename_all = "kebab-case")]
pub struct TableMapping {
    /// Source identifier (topic or stream name).
    pub source: String,

    /// Target table.
    pub table: String,

    /// Include every column of the table, with `fields` as overrides.
    #[facet(default)]
    pub all_fields: bool,

    /// The table does not exist yet and will be created by the writer.
    #[facet(default)]
    pub auto_create: bool,

    /// Record field name to target column name.
    #[facet(default)]
    pub fields: IndexMap<String, String>,
}

impl Config {
    /// Effective write mode.
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode.unwrap_or_default()
    }

    /// Effective batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Reject values that parse fine but can never produce a working sink.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == Some(0) {
            return Err(ConfigError::Invalid("batch-size must be at least 1".into()));
        }
        for (i, mapping) in self.mappings.iter().enumerate() {
            if mapping.source.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "mapping #{} has an empty source",
                    i
                )));
            }
            if mapping.table.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "mapping #{} (source '{}') has an empty table",
                    i, mapping.source
                )));
            }
        }
        Ok(())
    }
}

/// Parse and validate a configuration from Styx source.
pub fn from_str(source: &str) -> Result<Config, ConfigError> {
    let config: Config =
        facet_styx::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `.config/sinkmap.styx`, searching up the directory tree.
pub fn load() -> Result<(Config, PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let config = from_str(&content)?;

    Ok((config, config_path))
}

/// Find `.config/sinkmap.styx` by searching up the directory tree.
fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_PATH);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No `.config/sinkmap.styx` found in any parent directory
    NotFound,
    /// I/O error reading the file
    Io(String),
    /// Parse error in the Styx file
    Parse(String),
    /// The file parsed but holds unusable values
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound => {
                write!(
                    f,
                    "No {} found in current directory or any parent",
                    CONFIG_PATH
                )
            }
            ConfigError::Io(e) => write!(f, "Failed to read {}: {}", CONFIG_PATH, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse {}: {}", CONFIG_PATH, e),
            ConfigError::Invalid(e) => write!(f, "Invalid sink configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
