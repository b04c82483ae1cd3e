//! Table metadata snapshot types for sinkmap.
//!
//! These types describe the structure of tables that already exist in the
//! target database, as reported by whatever introspects it. They are shared
//! between the configuration layer and the mapping reconciler, which only ever
//! reads them.

use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// A column of an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// Column name, case-sensitive as stored in the database
    pub name: String,
    /// Whether this column is part of the table's primary key
    pub primary_key: bool,
}

impl Column {
    /// Create a regular (non-key) column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: false,
        }
    }

    /// Create a primary key column.
    pub fn pk(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: true,
        }
    }
}

/// The structure of one table at the time the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Columns, indexed by name, in database order
    pub columns: IndexMap<String, Column>,
}

impl Table {
    /// Create a table from its columns.
    ///
    /// If two columns share a name, the later one replaces the earlier one.
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    /// Get a column by exact name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Check whether a column exists (exact match, no case folding).
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in database order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Names of the primary key columns, in database order.
    pub fn primary_key_columns(&self) -> IndexSet<&str> {
        self.columns
            .values()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.name)?;
        for (i, col) in self.columns.values().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", col.name)?;
            if col.primary_key {
                write!(f, " PK")?;
            }
        }
        write!(f, ")")
    }
}

/// A read-only snapshot of the tables known to exist in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Tables in the schema, indexed by name
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from a list of tables.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    /// Check whether a table exists.
    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// All known table names, in snapshot order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Iterate over all tables.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests;
