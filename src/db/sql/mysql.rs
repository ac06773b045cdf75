//! MySQL driver (sqlx).

use std::str::FromStr;

use sqlx::mysql::{
    MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow,
};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::driver::{SqlDriver, WriteOutcome};
use super::query_builder::Statement;
use crate::config::RelationalConfig;
use crate::db::{ColumnDescriptor, CrudError, CrudResult, KeyRole, Record, Scalar};

/// MySQL engine behind a single pooled connection.
///
/// The connection is never recycled, so a database selected by the bootstrap
/// script (`USE ...`) stays selected for the life of the process.
#[derive(Clone)]
pub struct MySqlDriver {
    pool: MySqlPool,
}

impl SqlDriver for MySqlDriver {
    const NAME: &'static str = "MySQL";
    const DEFAULT_BOOTSTRAP: &'static str = include_str!("../../../data/sql/mysql/dbtodo.sql");

    async fn open(config: &RelationalConfig) -> CrudResult<Self> {
        let mut options = MySqlConnectOptions::from_str(&config.url).map_err(|e| {
            CrudError::Connection {
                message: format!("invalid MySQL URL: {}", e),
            }
        })?;
        if let Some(database) = &config.database {
            options = options.database(database);
        }

        let pool = MySqlPoolOptions::new()
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
        // information_schema text columns may surface as binary strings, hence the casts.
        let rows = sqlx::query(
            r#"
            SELECT CAST(COLUMN_NAME AS CHAR) AS name,
                   CAST(COLUMN_TYPE AS CHAR) AS declared_type,
                   CAST(COLUMN_KEY AS CHAR) AS column_key,
                   CAST(EXTRA AS CHAR) AS extra
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let column_key: String = row.try_get_unchecked("column_key")?;
                let extra: String = row.try_get_unchecked("extra")?;
                Ok(ColumnDescriptor {
                    name: row.try_get_unchecked("name")?,
                    declared_type: row.try_get_unchecked("declared_type")?,
                    key_role: if column_key == "PRI" {
                        KeyRole::Primary
                    } else {
                        KeyRole::None
                    },
                    generated: extra.to_lowercase().contains("auto_increment"),
                })
            })
            .collect()
    }

    async fn fetch_all(&self, statement: &Statement) -> CrudResult<Vec<Record>> {
        debug!(sql = %statement.sql, params = statement.params.len(), "mysql fetch");
        let rows = bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, statement: &Statement) -> CrudResult<WriteOutcome> {
        debug!(sql = %statement.sql, params = statement.params.len(), "mysql execute");
        let result = bind_params(sqlx::query(&statement.sql), &statement.params)
            .execute(&self.pool)
            .await?;
        Ok(WriteOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: i64::try_from(result.last_insert_id()).unwrap_or(0),
        })
    }

    async fn run_script(&self, script: &str) -> CrudResult<()> {
        sqlx::raw_sql(script).execute(&self.pool).await?;
        Ok(())
    }

    async fn current_database(&self) -> CrudResult<String> {
        let name: Option<String> = sqlx::query_scalar("SELECT CAST(DATABASE() AS CHAR)")
            .fetch_one(&self.pool)
            .await?;
        name.ok_or_else(|| CrudError::Connection {
            message: "no database selected".to_string(),
        })
    }
}

fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [Scalar],
) -> Query<'q, MySql, MySqlArguments> {
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

fn decode_row(row: &MySqlRow) -> CrudResult<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Scalar::Null
        } else {
            decode_value(row, index, raw.type_info().name())?
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_value(row: &MySqlRow, index: usize, type_name: &str) -> CrudResult<Scalar> {
    let value = match type_name {
        // TINYINT(1) reports as BOOLEAN; it is returned as 0/1 like any integer.
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Scalar::Integer(row.try_get_unchecked::<i64, _>(index)?)
        }
        unsigned if unsigned.ends_with("UNSIGNED") => {
            let n: u64 = row.try_get_unchecked(index)?;
            match i64::try_from(n) {
                Ok(n) => Scalar::Integer(n),
                Err(_) => Scalar::Text(n.to_string()),
            }
        }
        "FLOAT" => Scalar::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "DOUBLE" => Scalar::Float(row.try_get_unchecked::<f64, _>(index)?),
        "DATETIME" | "TIMESTAMP" => {
            let at: chrono::NaiveDateTime = row.try_get_unchecked(index)?;
            Scalar::Text(at.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        "DATE" => {
            let day: chrono::NaiveDate = row.try_get_unchecked(index)?;
            Scalar::Text(day.to_string())
        }
        "TIME" => {
            let time: chrono::NaiveTime = row.try_get_unchecked(index)?;
            Scalar::Text(time.to_string())
        }
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT" => {
            let bytes: Vec<u8> = row.try_get_unchecked(index)?;
            Scalar::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        // DECIMAL, JSON and the character types all arrive as text.
        _ => Scalar::Text(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}
