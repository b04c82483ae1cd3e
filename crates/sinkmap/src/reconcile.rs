//! Reconciliation of a declared mapping against an existing table.
//!
//! The declared mapping says which record fields go to which columns. The
//! table metadata says which columns really exist and which of them form the
//! primary key. Reconciliation merges the two:
//!
//! - **Wildcard** mappings (`all_fields`) start from every column of the table,
//!   mapped to a field of the same name, then apply the declared aliases as
//!   overrides on top.
//! - **Explicit** mappings keep exactly the declared aliases, after checking
//!   that each target column exists.
//!
//! Either way, every resulting alias is tagged with whether its column is part
//! of the primary key. For explicit mappings the key must be fully mapped when
//! upserting, since an upsert without the whole key cannot identify a row.

use crate::{Diagnostic, Error, FieldAlias, FieldMapping, Result, WriteMode};
use indexmap::{IndexMap, IndexSet};
use sinkmap_db_schema::Table;

/// A reconciled mapping plus whatever non-fatal findings came up on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub mapping: FieldMapping,
    pub diagnostics: Vec<Diagnostic>,
}

/// Merge `declared` with the structure of `table`.
///
/// `declared` must target `table` and must not be an auto-create mapping.
pub fn reconcile(declared: &FieldMapping, table: &Table, mode: WriteMode) -> Result<Reconciled> {
    if declared.auto_create {
        return Err(Error::AutoCreateReconcile {
            table: declared.table.clone(),
        });
    }
    if declared.table != table.name {
        return Err(Error::TableMismatch {
            declared: declared.table.clone(),
            actual: table.name.clone(),
        });
    }

    let pk_columns = table.primary_key_columns();
    let mut diagnostics = Vec::new();

    let aliases = if declared.all_fields {
        merge_wildcard(declared, table, &pk_columns, &mut diagnostics)?
    } else {
        validate_explicit(declared, table, &pk_columns, mode, &mut diagnostics)?
    };

    tracing::debug!(
        table = %declared.table,
        source = %declared.source,
        all_fields = declared.all_fields,
        aliases = aliases.len(),
        "reconciled field mapping"
    );

    Ok(Reconciled {
        mapping: FieldMapping {
            table: declared.table.clone(),
            source: declared.source.clone(),
            all_fields: declared.all_fields,
            auto_create: false,
            aliases,
        },
        diagnostics,
    })
}

fn merge_wildcard(
    declared: &FieldMapping,
    table: &Table,
    pk_columns: &IndexSet<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<IndexMap<String, FieldAlias>> {
    let mut aliases: IndexMap<String, FieldAlias> = table
        .columns
        .values()
        .map(|col| {
            (
                col.name.clone(),
                FieldAlias::resolved(col.name.as_str(), col.primary_key),
            )
        })
        .collect();

    // column -> renaming fields that target it
    let mut renames: IndexMap<&str, Vec<String>> = IndexMap::new();

    for (field, alias) in &declared.aliases {
        let column = alias.column.as_str();
        if !table.has_column(column) {
            return Err(column_not_found(table, column));
        }
        if field != column {
            renames.entry(column).or_default().push(field.clone());
        }
        aliases.insert(
            field.clone(),
            FieldAlias::resolved(column, pk_columns.contains(column)),
        );
    }

    for (column, fields) in renames {
        if fields.len() > 1 {
            Diagnostic::DuplicateColumnTarget {
                table: table.name.clone(),
                column: column.to_string(),
                fields,
            }
            .emit(diagnostics);
        }
    }

    Ok(aliases)
}

fn validate_explicit(
    declared: &FieldMapping,
    table: &Table,
    pk_columns: &IndexSet<&str>,
    mode: WriteMode,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<IndexMap<String, FieldAlias>> {
    let mut aliases = IndexMap::with_capacity(declared.aliases.len());
    let mut specified_pks: IndexSet<&str> = IndexSet::new();

    for (field, alias) in &declared.aliases {
        let column = alias.column.as_str();
        if !table.has_column(column) {
            return Err(column_not_found(table, column));
        }
        let primary_key = pk_columns.contains(column);
        if primary_key {
            specified_pks.insert(column);
        }
        aliases.insert(field.clone(), FieldAlias::resolved(column, primary_key));
    }

    if !pk_columns.is_empty() && specified_pks.len() < pk_columns.len() {
        let specified: Vec<String> = pk_columns
            .iter()
            .filter(|c| specified_pks.contains(*c))
            .map(|c| c.to_string())
            .collect();
        let required: Vec<String> = pk_columns.iter().map(|c| c.to_string()).collect();

        match mode {
            WriteMode::Upsert => {
                return Err(Error::IncompletePrimaryKeyMapping {
                    table: table.name.clone(),
                    specified,
                    required,
                });
            }
            WriteMode::Insert => Diagnostic::IncompletePrimaryKey {
                table: table.name.clone(),
                specified,
                required,
            }
            .emit(diagnostics),
        }
    }

    Ok(aliases)
}

fn column_not_found(table: &Table, column: &str) -> Error {
    Error::ColumnNotFound {
        table: table.name.clone(),
        column: column.to_string(),
        available: table.column_names().map(str::to_string).collect(),
    }
}
