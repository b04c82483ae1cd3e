//! Field mappings: how record fields land in table columns.

use indexmap::{IndexMap, IndexSet};
use sinkmap_config::TableMapping;

/// Where a record field is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldAlias {
    /// Target column name
    pub column: String,
    /// Whether the target column is part of the primary key.
    ///
    /// Only the reconciler sets this, from table metadata.
    pub primary_key: bool,
}

impl FieldAlias {
    /// A declared alias. Key membership is unknown until reconciliation.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            primary_key: false,
        }
    }

    pub(crate) fn resolved(column: impl Into<String>, primary_key: bool) -> Self {
        Self {
            column: column.into(),
            primary_key,
        }
    }
}

/// The mapping of one source onto one table.
///
/// This is both what users declare and what reconciliation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Target table
    pub table: String,
    /// Source identifier (topic or stream name)
    pub source: String,
    /// Whether every column of the table is included
    pub all_fields: bool,
    /// Whether the writer creates the table
    pub auto_create: bool,
    /// Record field name to target column, in declaration order
    pub aliases: IndexMap<String, FieldAlias>,
}

impl FieldMapping {
    pub fn new(table: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            source: source.into(),
            all_fields: false,
            auto_create: false,
            aliases: IndexMap::new(),
        }
    }

    pub fn with_all_fields(mut self, all_fields: bool) -> Self {
        self.all_fields = all_fields;
        self
    }

    pub fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    /// Map `field` to `column`. A later alias for the same field replaces the earlier one.
    pub fn alias(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.aliases.insert(field.into(), FieldAlias::new(column));
        self
    }

    /// Distinct target columns, in alias order.
    pub fn columns(&self) -> IndexSet<&str> {
        self.aliases.values().map(|a| a.column.as_str()).collect()
    }

    /// Field names whose target column is part of the primary key.
    pub fn primary_key_aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .filter(|(_, a)| a.primary_key)
            .map(|(field, _)| field.as_str())
    }
}

impl From<&TableMapping> for FieldMapping {
    fn from(decl: &TableMapping) -> Self {
        Self {
            table: decl.table.clone(),
            source: decl.source.clone(),
            all_fields: decl.all_fields,
            auto_create: decl.auto_create,
            aliases: decl
                .fields
                .iter()
                .map(|(field, column)| (field.clone(), FieldAlias::new(column.as_str())))
                .collect(),
        }
    }
}
