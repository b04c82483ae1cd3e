//! Reconciles declared sink field mappings against live table metadata.
//!
//! A sink routes records from several sources (topics, streams) into database
//! tables. For each source the user declares which record fields go to which
//! columns, or asks for all of them. Before any row is written, this crate
//! checks those declarations against the tables that actually exist and
//! produces the final mapping the write path uses:
//!
//! - [`reconcile`] merges one declared [`FieldMapping`] with one table's
//!   columns and primary key.
//! - [`MappingRegistryBuilder`] does that for every configured mapping and
//!   collects the results into a [`MappingRegistry`] keyed by source.
//!
//! Nothing here talks to the database. The metadata snapshot is gathered
//! beforehand and SQL generation happens afterwards, elsewhere.
//!
//! ```ignore
//! let (config, _path) = sinkmap_config::load()?;
//! let plan = sinkmap::plan_from_config(&config, &schema, &|m: FieldMapping| m, statements)?;
//! for diagnostic in &plan.diagnostics {
//!     eprintln!("warning: {diagnostic}");
//! }
//! ```

mod diagnostic;
mod error;
mod mapping;
pub mod reconcile;
pub mod registry;

pub use diagnostic::Diagnostic;
pub use error::Error;
pub use mapping::{FieldAlias, FieldMapping};
pub use reconcile::{Reconciled, reconcile};
pub use registry::{
    BindExtractor, MappingRegistry, MappingRegistryBuilder, WritePlan, build_as_declared,
};

pub use sinkmap_config::{Config, WriteMode};
pub use sinkmap_db_schema::{Column, Schema, Table};

/// Result type for sinkmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Build a [`WritePlan`] from a loaded configuration.
///
/// Uses the configuration's write mode and batch size, and reconciles every
/// declared mapping against `metadata`.
pub fn plan_from_config<B, Q>(
    config: &Config,
    metadata: &Schema,
    binder: &B,
    statements: Q,
) -> Result<WritePlan<B::Extractor, Q>>
where
    B: BindExtractor,
{
    config.validate()?;

    let mappings: Vec<FieldMapping> = config.mappings.iter().map(FieldMapping::from).collect();

    MappingRegistryBuilder::new(metadata, config.write_mode())
        .batch_size(config.batch_size())
        .build(&mappings, binder, statements)
}
