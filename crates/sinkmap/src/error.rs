use sinkmap_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(
        "table '{table}' not found in the database (available tables: {}). \
         Set the mapping to auto-create the table or add it to the database",
        .available.join(",")
    )]
    TableNotFound {
        table: String,
        available: Vec<String>,
    },

    #[error(
        "invalid field mapping: column '{column}' not found in table '{table}' (available columns: {})",
        .available.join(",")
    )]
    ColumnNotFound {
        table: String,
        column: String,
        available: Vec<String>,
    },

    #[error(
        "invalid field mapping for table '{table}': upsert needs every primary key column, \
         mapped [{}] out of [{}]",
        .specified.join(","),
        .required.join(",")
    )]
    IncompletePrimaryKeyMapping {
        table: String,
        specified: Vec<String>,
        required: Vec<String>,
    },

    #[error("mapping for table '{declared}' cannot be reconciled against table '{actual}'")]
    TableMismatch { declared: String, actual: String },

    #[error("mapping for table '{table}' is auto-created and has nothing to reconcile against")]
    AutoCreateReconcile { table: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
