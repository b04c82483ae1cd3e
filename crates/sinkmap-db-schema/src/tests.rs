use super::*;
use facet_testhelpers::test;

fn order_line() -> Table {
    Table::new(
        "order_line",
        [
            Column::pk("order_id"),
            Column::new("sku"),
            Column::pk("line_no"),
            Column::new("qty"),
        ],
    )
}

#[test]
fn test_primary_key_columns_keep_table_order() {
    let table = order_line();
    let pks: Vec<_> = table.primary_key_columns().into_iter().collect();
    assert_eq!(pks, vec!["order_id", "line_no"]);
}

#[test]
fn test_no_primary_key() {
    let table = Table::new("audit", [Column::new("at"), Column::new("what")]);
    assert!(table.primary_key_columns().is_empty());
}

#[test]
fn test_column_lookup_is_case_sensitive() {
    let table = order_line();
    assert!(table.has_column("sku"));
    assert!(!table.has_column("SKU"));
    assert_eq!(table.get_column("qty"), Some(&Column::new("qty")));
}

#[test]
fn test_duplicate_column_replaces_earlier() {
    let table = Table::new("t", [Column::new("id"), Column::pk("id")]);
    assert_eq!(table.columns.len(), 1);
    assert!(table.columns["id"].primary_key);
}

#[test]
fn test_table_display() {
    let table = order_line();
    assert_eq!(
        table.to_string(),
        "order_line (order_id PK, sku, line_no PK, qty)"
    );
}

#[test]
fn test_schema_table_names_in_order() {
    let schema = Schema::from_tables([
        Table::new("customer", [Column::pk("id")]),
        order_line(),
    ]);
    assert!(schema.contains_table("order_line"));
    assert!(!schema.contains_table("orders"));
    assert_eq!(
        schema.table_names().collect::<Vec<_>>(),
        vec!["customer", "order_line"]
    );
    assert_eq!(schema.iter_tables().count(), 2);
}
