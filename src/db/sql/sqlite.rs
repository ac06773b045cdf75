//! SQLite driver (sqlx).

use std::str::FromStr;

use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::driver::{SqlDriver, WriteOutcome};
use super::query_builder::Statement;
use crate::config::RelationalConfig;
use crate::db::{ColumnDescriptor, CrudError, CrudResult, KeyRole, Record, Scalar};

/// SQLite engine behind a single pooled connection.
#[derive(Clone)]
pub struct SqliteDriver {
    pool: SqlitePool,
}

impl SqlDriver for SqliteDriver {
    const NAME: &'static str = "SQLite";
    const DEFAULT_BOOTSTRAP: &'static str = include_str!("../../../data/sql/sqlite/dbtodo.sql");

    async fn open(config: &RelationalConfig) -> CrudResult<Self> {
        // A configured database name is the database file itself.
        let options = match &config.database {
            Some(path) => SqliteConnectOptions::new().filename(path),
            None => SqliteConnectOptions::from_str(&config.url).map_err(|e| {
                CrudError::Connection {
                    message: format!("invalid SQLite URL '{}': {}", config.url, e),
                }
            })?,
        }
        .create_if_missing(true);

        // One connection, never recycled: an in-memory database lives exactly
        // as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| CrudError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    async fn describe(&self, table: &str) -> CrudResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query("SELECT name, type, pk FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let declared_type: String = row.try_get("type")?;
                let pk: i64 = row.try_get("pk")?;
                Ok(ColumnDescriptor {
                    name: row.try_get("name")?,
                    // INTEGER PRIMARY KEY aliases the rowid, so the engine fills it.
                    generated: pk > 0 && declared_type.eq_ignore_ascii_case("INTEGER"),
                    declared_type,
                    key_role: if pk > 0 {
                        KeyRole::Primary
                    } else {
                        KeyRole::None
                    },
                })
            })
            .collect()
    }

    async fn fetch_all(&self, statement: &Statement) -> CrudResult<Vec<Record>> {
        debug!(sql = %statement.sql, params = statement.params.len(), "sqlite fetch");
        let rows = bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, statement: &Statement) -> CrudResult<WriteOutcome> {
        debug!(sql = %statement.sql, params = statement.params.len(), "sqlite execute");
        let result = bind_params(sqlx::query(&statement.sql), &statement.params)
            .execute(&self.pool)
            .await?;
        Ok(WriteOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_rowid(),
        })
    }

    async fn run_script(&self, script: &str) -> CrudResult<()> {
        sqlx::raw_sql(script).execute(&self.pool).await?;
        Ok(())
    }

    async fn current_database(&self) -> CrudResult<String> {
        let name: String =
            sqlx::query_scalar("SELECT name FROM pragma_database_list ORDER BY seq LIMIT 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(name)
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Scalar],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            Scalar::Null => query.bind(None::<String>),
            Scalar::Bool(b) => query.bind(*b),
            Scalar::Integer(i) => query.bind(*i),
            Scalar::Float(x) => query.bind(*x),
            Scalar::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

/// Decode by the value's storage class, not the declared column type.
fn decode_row(row: &SqliteRow) -> CrudResult<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Scalar::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Scalar::Integer(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => Scalar::Float(row.try_get_unchecked::<f64, _>(index)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get_unchecked(index)?;
                    Scalar::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Scalar::Text(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}
