//! Database schema definitions
//!
//! Tables are generated from the entity field descriptors and the
//! relationship schema, so foreign keys, cascades and join tables always
//! match what the file backend does by scanning.

use crate::kind::EntityKind;
use crate::relation::{self, AssociationEdge};

/// Columns every entity table starts with
pub const COMMON_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

/// All columns of a kind's table, in select/insert order
pub fn columns(kind: EntityKind) -> Vec<&'static str> {
    let mut cols = COMMON_COLUMNS.to_vec();
    cols.extend(kind.fields().iter().map(|f| f.name));
    cols
}

/// SQL to create one entity table
pub fn create_table(kind: EntityKind) -> String {
    let mut lines = vec![
        "    id TEXT PRIMARY KEY NOT NULL".to_string(),
        "    created_at TEXT NOT NULL".to_string(),
        "    updated_at TEXT NOT NULL".to_string(),
    ];

    for field in kind.fields() {
        let null = if field.nullable { "" } else { " NOT NULL" };
        lines.push(format!("    {} {}{}", field.name, field.ty.sql_type(), null));
    }

    for edge in relation::parents_of(kind) {
        let on_delete = if edge.cascade { " ON DELETE CASCADE" } else { "" };
        lines.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}(id){}",
            edge.foreign_key,
            edge.parent.table_name(),
            on_delete
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        kind.table_name(),
        lines.join(",\n")
    )
}

/// SQL to create an association's join table
///
/// Both columns form the primary key, so a pair can only exist once, and
/// deleting either side removes the pair.
pub fn create_join_table(edge: &AssociationEdge) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {name} (
    {left_col} TEXT NOT NULL,
    {right_col} TEXT NOT NULL,
    PRIMARY KEY ({left_col}, {right_col}),
    FOREIGN KEY ({left_col}) REFERENCES {left_table}(id) ON DELETE CASCADE,
    FOREIGN KEY ({right_col}) REFERENCES {right_table}(id) ON DELETE CASCADE
)"#,
        name = edge.name,
        left_col = edge.left_column,
        right_col = edge.right_column,
        left_table = edge.left.table_name(),
        right_table = edge.right.table_name(),
    )
}

/// Indexes on every foreign key column
pub fn create_indexes() -> Vec<String> {
    let mut stmts: Vec<String> = relation::CHILD_EDGES
        .iter()
        .map(|edge| {
            let table = edge.child.table_name();
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{fk} ON {table}({fk})",
                table = table,
                fk = edge.foreign_key
            )
        })
        .collect();

    stmts.extend(relation::ASSOCIATIONS.iter().map(|edge| {
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{name}_{col} ON {name}({col})",
            name = edge.name,
            col = edge.right_column
        )
    }));
    stmts
}

/// All schema creation statements, parents before children
pub fn all_schema_statements() -> Vec<String> {
    let mut stmts: Vec<String> = relation::dependency_order().into_iter().map(create_table).collect();
    stmts.extend(relation::ASSOCIATIONS.iter().map(create_join_table));
    stmts.extend(create_indexes());
    stmts
}

/// Drop statements, join tables first, then children before parents
pub fn drop_statements() -> Vec<String> {
    let mut stmts: Vec<String> = relation::ASSOCIATIONS
        .iter()
        .map(|edge| format!("DROP TABLE IF EXISTS {}", edge.name))
        .collect();
    stmts.extend(
        relation::dependency_order()
            .into_iter()
            .rev()
            .map(|kind| format!("DROP TABLE IF EXISTS {}", kind.table_name())),
    );
    stmts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_table_declares_cascade() {
        let sql = create_table(EntityKind::Location);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS locations"));
        assert!(sql.contains("region_id TEXT NOT NULL"));
        assert!(sql.contains("FOREIGN KEY (region_id) REFERENCES regions(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_nullable_columns() {
        let sql = create_table(EntityKind::Listing);
        assert!(sql.contains("latitude REAL,") || sql.contains("latitude REAL\n"));
        assert!(sql.contains("price_by_night INTEGER NOT NULL"));
    }

    #[test]
    fn test_join_table_composite_key() {
        let edge = &relation::ASSOCIATIONS[0];
        let sql = create_join_table(edge);
        assert!(sql.contains("PRIMARY KEY (listing_id, amenity_id)"));
        assert!(sql.contains("REFERENCES listings(id) ON DELETE CASCADE"));
        assert!(sql.contains("REFERENCES amenities(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_columns_order() {
        assert_eq!(columns(EntityKind::Region), vec!["id", "created_at", "updated_at", "name"]);
    }

    #[test]
    fn test_drop_order_children_first() {
        let stmts = drop_statements();
        let pos = |table: &str| stmts.iter().position(|s| s.ends_with(table)).unwrap();
        assert!(pos("listing_amenities") < pos("listings"));
        assert!(pos("reviews") < pos("listings"));
        assert!(pos("locations") < pos("regions"));
    }
}
