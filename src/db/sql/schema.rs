//! Primary-key introspection.
//!
//! Metadata is read fresh on every call; nothing is cached.

use tracing::debug;

use super::driver::SqlDriver;
use crate::db::{ColumnDescriptor, CrudError, CrudResult, PrimaryKeyInfo};

/// Describe `table` and isolate its single primary-key column.
///
/// Fails with a schema error when the table has no columns, no key column, or
/// a composite key.
pub async fn describe<D: SqlDriver>(driver: &D, table: &str) -> CrudResult<PrimaryKeyInfo> {
    let columns = driver.describe(table).await?;
    let column = primary_key(table, columns)?;
    debug!(table, key = %column.name, generated = column.generated, "primary key resolved");

    Ok(PrimaryKeyInfo {
        table: table.to_string(),
        column,
        last_insert: None,
    })
}

/// Pick the one column marked as primary key.
pub fn primary_key(table: &str, columns: Vec<ColumnDescriptor>) -> CrudResult<ColumnDescriptor> {
    if columns.is_empty() {
        return Err(CrudError::schema(table, "table has no columns (does it exist?)"));
    }

    let mut keys: Vec<ColumnDescriptor> = columns.into_iter().filter(|c| c.is_primary()).collect();
    match keys.len() {
        0 => Err(CrudError::schema(table, "no primary key column")),
        1 => Ok(keys.remove(0)),
        n => Err(CrudError::schema(
            table,
            format!(
                "composite primary key ({} columns: {}) is not supported",
                n,
                keys.iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::KeyRole;

    fn column(name: &str, key_role: KeyRole) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            declared_type: "TEXT".to_string(),
            key_role,
            generated: false,
        }
    }

    #[test]
    fn test_single_key_is_selected() {
        let columns = vec![
            column("title", KeyRole::None),
            column("id", KeyRole::Primary),
        ];
        assert_eq!(primary_key("tasks", columns).unwrap().name, "id");
    }

    #[test]
    fn test_missing_key_is_schema_error() {
        let columns = vec![column("title", KeyRole::None)];
        let err = primary_key("notes", columns).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema error on table 'notes': no primary key column"
        );
    }

    #[test]
    fn test_composite_key_is_schema_error() {
        let columns = vec![
            column("a", KeyRole::Primary),
            column("b", KeyRole::Primary),
        ];
        let err = primary_key("pairs", columns).unwrap_err();
        assert!(err.to_string().contains("composite primary key (2 columns: a, b)"));
    }

    #[test]
    fn test_unknown_table_is_schema_error() {
        let err = primary_key("ghost", vec![]).unwrap_err();
        assert!(matches!(err, CrudError::Schema { .. }));
    }
}
