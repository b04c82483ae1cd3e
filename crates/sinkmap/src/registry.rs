//! Building the per-source registry handed to the write path.
//!
//! Every configured mapping either targets a table that already exists, in
//! which case it is reconciled against the metadata snapshot, or is marked
//! auto-create, in which case the writer creates the table and the mapping is
//! taken as declared. The effective mapping is then bound to an extractor and
//! registered under the lowercase source identifier.
//!
//! Any validation failure aborts the whole build; there is no partial registry.

use crate::reconcile::reconcile;
use crate::{Diagnostic, Error, FieldMapping, Result, WriteMode};
use indexmap::IndexMap;
use sinkmap_config::DEFAULT_BATCH_SIZE;
use sinkmap_db_schema::Schema;

/// Turns an effective mapping into whatever pulls values out of records.
///
/// Any `Fn(FieldMapping) -> E` closure is a binder.
pub trait BindExtractor {
    type Extractor;

    fn bind(&self, mapping: FieldMapping) -> Self::Extractor;
}

impl<F, E> BindExtractor for F
where
    F: Fn(FieldMapping) -> E,
{
    type Extractor = E;

    fn bind(&self, mapping: FieldMapping) -> E {
        self(mapping)
    }
}

/// Extractors keyed by lowercase source identifier.
#[derive(Debug, Clone)]
pub struct MappingRegistry<E> {
    entries: IndexMap<String, E>,
}

impl<E> MappingRegistry<E> {
    /// Look up the extractor for a source, ignoring case.
    pub fn get(&self, source: &str) -> Option<&E> {
        self.entries.get(source.to_lowercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered (lowercase) sources, in configuration order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Everything the statement builder needs to start writing.
#[derive(Debug, Clone)]
pub struct WritePlan<E, Q> {
    pub registry: MappingRegistry<E>,
    /// The statement builder, passed through untouched
    pub statements: Q,
    pub write_mode: WriteMode,
    pub batch_size: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds a [`WritePlan`] by checking each mapping against a metadata snapshot.
///
/// # Example
///
/// ```ignore
/// let plan = MappingRegistryBuilder::new(&schema, WriteMode::Upsert)
///     .batch_size(500)
///     .build(&mappings, &|m: FieldMapping| RecordExtractor::new(m), statement_builder)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MappingRegistryBuilder<'a> {
    metadata: &'a Schema,
    write_mode: WriteMode,
    batch_size: usize,
}

impl<'a> MappingRegistryBuilder<'a> {
    pub fn new(metadata: &'a Schema, write_mode: WriteMode) -> Self {
        Self {
            metadata,
            write_mode,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Reconcile every mapping and bind the results.
    pub fn build<B, Q>(
        &self,
        mappings: &[FieldMapping],
        binder: &B,
        statements: Q,
    ) -> Result<WritePlan<B::Extractor, Q>>
    where
        B: BindExtractor,
    {
        let mut entries = Entries::default();

        for declared in mappings {
            let effective = if declared.auto_create {
                tracing::debug!(
                    table = %declared.table,
                    source = %declared.source,
                    "table is auto-created, using mapping as declared"
                );
                declared.clone()
            } else {
                let Some(table) = self.metadata.get_table(&declared.table) else {
                    return Err(Error::TableNotFound {
                        table: declared.table.clone(),
                        available: self.metadata.table_names().map(str::to_string).collect(),
                    });
                };
                let reconciled = reconcile(declared, table, self.write_mode)?;
                entries.diagnostics.extend(reconciled.diagnostics);
                reconciled.mapping
            };

            entries.insert(effective, binder);
        }

        Ok(entries.finish(statements, self.write_mode, self.batch_size))
    }
}

/// Bind every mapping as declared, without looking at any table metadata.
///
/// This is for sinks that evolve their tables as they go, where there is no
/// fixed structure to reconcile against.
pub fn build_as_declared<B, Q>(
    mappings: &[FieldMapping],
    write_mode: WriteMode,
    batch_size: usize,
    binder: &B,
    statements: Q,
) -> WritePlan<B::Extractor, Q>
where
    B: BindExtractor,
{
    let mut entries = Entries::default();
    for declared in mappings {
        entries.insert(declared.clone(), binder);
    }
    entries.finish(statements, write_mode, batch_size)
}

struct Entries<E> {
    extractors: IndexMap<String, E>,
    tables: IndexMap<String, String>,
    diagnostics: Vec<Diagnostic>,
}

impl<E> Default for Entries<E> {
    fn default() -> Self {
        Self {
            extractors: IndexMap::new(),
            tables: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl<E> Entries<E> {
    fn insert<B>(&mut self, effective: FieldMapping, binder: &B)
    where
        B: BindExtractor<Extractor = E>,
    {
        let source = effective.source.to_lowercase();
        let table = effective.table.clone();

        if let Some(replaced_table) = self.tables.insert(source.clone(), table.clone()) {
            Diagnostic::DuplicateSource {
                source: source.clone(),
                replaced_table,
                table,
            }
            .emit(&mut self.diagnostics);
        }

        self.extractors.insert(source, binder.bind(effective));
    }

    fn finish<Q>(self, statements: Q, write_mode: WriteMode, batch_size: usize) -> WritePlan<E, Q> {
        tracing::info!(
            entries = self.extractors.len(),
            mode = %write_mode,
            batch_size,
            warnings = self.diagnostics.len(),
            "built mapping registry"
        );

        WritePlan {
            registry: MappingRegistry {
                entries: self.extractors,
            },
            statements,
            write_mode,
            batch_size,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use sinkmap_db_schema::{Column, Table};

    fn schema() -> Schema {
        Schema::from_tables([
            Table::new(
                "account",
                [Column::pk("id"), Column::new("name"), Column::new("email")],
            ),
            Table::new("event", [Column::new("at"), Column::new("kind")]),
        ])
    }

    fn identity(mapping: FieldMapping) -> FieldMapping {
        mapping
    }

    #[test]
    fn test_auto_create_mapping_is_bound_verbatim() {
        let schema = schema();
        let auto = FieldMapping::new("audit_log", "Audit")
            .with_auto_create(true)
            .alias("who", "user_name");
        let existing = FieldMapping::new("account", "accounts").with_all_fields(true);

        let plan = MappingRegistryBuilder::new(&schema, WriteMode::Insert)
            .build(&[auto.clone(), existing], &identity, ())
            .unwrap();

        assert_eq!(plan.registry.len(), 2);
        assert_eq!(plan.registry.get("audit"), Some(&auto));

        let reconciled = plan.registry.get("accounts").unwrap();
        assert_eq!(reconciled.aliases.len(), 3);
        assert!(reconciled.aliases["id"].primary_key);
    }

    #[test]
    fn test_missing_table_aborts_build() {
        let schema = schema();
        let mappings = [
            FieldMapping::new("account", "accounts").with_all_fields(true),
            FieldMapping::new("acount", "typo"),
        ];

        let err = MappingRegistryBuilder::new(&schema, WriteMode::Insert)
            .build(&mappings, &identity, ())
            .unwrap_err();

        assert_eq!(
            err,
            Error::TableNotFound {
                table: "acount".into(),
                available: vec!["account".into(), "event".into()],
            }
        );
        insta::assert_snapshot!(err.to_string(), @"table 'acount' not found in the database (available tables: account,event). Set the mapping to auto-create the table or add it to the database");
    }

    #[test]
    fn test_reconcile_errors_propagate() {
        let schema = schema();
        let mappings = [FieldMapping::new("account", "accounts").alias("name", "name")];

        let err = MappingRegistryBuilder::new(&schema, WriteMode::Upsert)
            .build(&mappings, &identity, ())
            .unwrap_err();
        assert!(matches!(err, Error::IncompletePrimaryKeyMapping { .. }));
    }

    #[test]
    fn test_sources_are_lowercased() {
        let schema = schema();
        let mappings = [FieldMapping::new("event", "Click-Stream").alias("kind", "kind")];

        let plan = MappingRegistryBuilder::new(&schema, WriteMode::Insert)
            .build(&mappings, &identity, ())
            .unwrap();

        assert_eq!(plan.registry.sources().collect::<Vec<_>>(), vec!["click-stream"]);
        assert!(plan.registry.get("CLICK-STREAM").is_some());
        assert!(plan.registry.get("click-stream").is_some());
    }

    #[test]
    fn test_duplicate_source_last_wins() {
        let schema = schema();
        let mappings = [
            FieldMapping::new("account", "Events").with_all_fields(true),
            FieldMapping::new("event", "events").with_all_fields(true),
        ];

        let plan = MappingRegistryBuilder::new(&schema, WriteMode::Insert)
            .build(&mappings, &identity, ())
            .unwrap();

        assert_eq!(plan.registry.len(), 1);
        assert_eq!(plan.registry.get("events").unwrap().table, "event");
        assert_eq!(
            plan.diagnostics,
            vec![Diagnostic::DuplicateSource {
                source: "events".into(),
                replaced_table: "account".into(),
                table: "event".into(),
            }]
        );
    }

    #[test]
    fn test_plan_carries_settings_and_diagnostics() {
        let schema = schema();
        let mappings = [FieldMapping::new("account", "accounts").alias("name", "name")];

        let plan = MappingRegistryBuilder::new(&schema, WriteMode::Insert)
            .batch_size(250)
            .build(&mappings, &identity, "statement-builder")
            .unwrap();

        assert_eq!(plan.batch_size, 250);
        assert_eq!(plan.write_mode, WriteMode::Insert);
        assert_eq!(plan.statements, "statement-builder");
        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].code(), "incomplete-primary-key");
    }

    #[test]
    fn test_default_batch_size() {
        let schema = schema();
        let plan = MappingRegistryBuilder::new(&schema, WriteMode::Insert)
            .build(&[], &identity, ())
            .unwrap();
        assert!(plan.registry.is_empty());
        assert_eq!(plan.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_closure_binder() {
        let schema = schema();
        let mappings = [FieldMapping::new("event", "events").with_all_fields(true)];

        let plan = MappingRegistryBuilder::new(&schema, WriteMode::Insert)
            .build(&mappings, &|m: FieldMapping| m.aliases.len(), ())
            .unwrap();

        assert_eq!(plan.registry.iter().collect::<Vec<_>>(), vec![("events", &2)]);
    }

    #[test]
    fn test_build_as_declared_skips_reconciliation() {
        let mappings = [
            FieldMapping::new("nowhere", "A").alias("x", "y"),
            FieldMapping::new("elsewhere", "a"),
        ];

        let plan = build_as_declared(&mappings, WriteMode::Upsert, 10, &identity, ());

        assert_eq!(plan.registry.len(), 1);
        assert_eq!(plan.registry.get("a"), Some(&mappings[1]));
        assert_eq!(plan.batch_size, 10);
        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].code(), "duplicate-source");
    }
}
