//! Non-fatal findings reported alongside a successful result.

use std::fmt;

/// A configuration hazard that does not stop the sink from starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An insert-mode mapping leaves part of the primary key unmapped.
    IncompletePrimaryKey {
        table: String,
        specified: Vec<String>,
        required: Vec<String>,
    },

    /// Several wildcard overrides write into the same column; the last one wins.
    DuplicateColumnTarget {
        table: String,
        column: String,
        fields: Vec<String>,
    },

    /// Two mappings share a source identifier (ignoring case); the later one wins.
    DuplicateSource {
        source: String,
        replaced_table: String,
        table: String,
    },
}

impl Diagnostic {
    /// Stable code for filtering and tests.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::IncompletePrimaryKey { .. } => "incomplete-primary-key",
            Diagnostic::DuplicateColumnTarget { .. } => "duplicate-column-target",
            Diagnostic::DuplicateSource { .. } => "duplicate-source",
        }
    }

    /// The table this diagnostic is about.
    pub fn table(&self) -> &str {
        match self {
            Diagnostic::IncompletePrimaryKey { table, .. }
            | Diagnostic::DuplicateColumnTarget { table, .. }
            | Diagnostic::DuplicateSource { table, .. } => table,
        }
    }

    /// Log this diagnostic and push it to `diagnostics`.
    pub(crate) fn emit(self, diagnostics: &mut Vec<Diagnostic>) {
        tracing::warn!(code = self.code(), table = self.table(), "{}", self);
        diagnostics.push(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::IncompletePrimaryKey {
                table,
                specified,
                required,
            } => write!(
                f,
                "not all primary key columns of '{}' are mapped: [{}] out of [{}]",
                table,
                specified.join(","),
                required.join(",")
            ),
            Diagnostic::DuplicateColumnTarget {
                table,
                column,
                fields,
            } => write!(
                f,
                "fields [{}] all map to column '{}.{}'",
                fields.join(","),
                table,
                column
            ),
            Diagnostic::DuplicateSource {
                source,
                replaced_table,
                table,
            } => write!(
                f,
                "source '{}' is mapped more than once; '{}' replaces '{}'",
                source, table, replaced_table
            ),
        }
    }
}
