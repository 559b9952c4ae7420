//! Async statement execution against SQLite.
//!
//! `Database` wraps a `SqlitePool` and executes rendered statements,
//! decoding fetched rows into `Row` values keyed by the selected
//! column alias.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as _, Row as _, TypeInfo as _, ValueRef as _};
use tracing::debug;

use crate::error::{Result, SqlError};
use crate::value::SqlValue;

/// A fetched row: ordered (column alias, value) pairs.
///
/// Keys are whatever each column was selected AS; joined selects use
/// qualified aliases so identically-named columns do not collide.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<(String, SqlValue)>,
}

impl Row {
    /// Builds a row from (alias, value) pairs.
    #[must_use]
    pub fn from_pairs(values: Vec<(String, SqlValue)>) -> Self {
        Self { values }
    }

    /// Returns the value of the named column, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, v)| v)
    }

    /// Returns the value of the named column, or a `MissingColumn`
    /// error.
    pub fn try_get(&self, key: &str) -> Result<&SqlValue> {
        self.get(key)
            .ok_or_else(|| SqlError::MissingColumn(key.to_string()))
    }

    /// Returns the value in the given position.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index).map(|(_, v)| v)
    }

    /// Returns the columns in select order.
    #[must_use]
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    fn decode(row: &SqliteRow) -> Result<Self> {
        let mut values = Vec::with_capacity(row.len());
        for (i, col) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(i)?;
            let value = if raw.is_null() {
                SqlValue::Null
            } else {
                match raw.type_info().name() {
                    "INTEGER" => SqlValue::Int(row.try_get::<i64, _>(i)?),
                    "REAL" => SqlValue::Float(row.try_get::<f64, _>(i)?),
                    "TEXT" => SqlValue::Text(row.try_get::<String, _>(i)?),
                    "BLOB" => SqlValue::Blob(row.try_get::<Vec<u8>, _>(i)?),
                    other => {
                        return Err(SqlError::Decode {
                            column: col.name().to_string(),
                            type_name: other.to_string(),
                        })
                    }
                }
            };
            values.push((col.name().to_string(), value));
        }
        Ok(Self { values })
    }
}

/// An async connection handle executing one logical statement per
/// call. Pooling and transaction scoping stay with sqlx.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects to the given SQLite URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url).await?;
        Ok(Self { pool })
    }

    /// Opens an in-memory database on a single connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Executes a statement and returns the affected-row count.
    pub async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<u64> {
        debug!(sql = %sql, "executing statement");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Executes an INSERT and returns the store-assigned row id.
    pub async fn execute_insert(&self, sql: &str, params: Vec<SqlValue>) -> Result<i64> {
        debug!(sql = %sql, "executing insert");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.last_insert_rowid())
    }

    /// Executes one statement once per parameter set, sequentially.
    ///
    /// A failure partway through leaves earlier executions committed;
    /// no compensating rollback is attempted here.
    pub async fn execute_many(
        &self,
        sql: &str,
        param_sets: Vec<Vec<SqlValue>>,
    ) -> Result<u64> {
        debug!(sql = %sql, sets = param_sets.len(), "executing batch");
        let mut affected = 0;
        for params in param_sets {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            affected += query.execute(&self.pool).await?.rows_affected();
        }
        Ok(affected)
    }

    /// Fetches all rows for a query.
    pub async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>> {
        debug!(sql = %sql, "fetching rows");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Row::decode).collect()
    }

    /// Fetches the first row for a query, if any.
    pub async fn fetch_one(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<Row>> {
        debug!(sql = %sql, "fetching row");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(Row::decode).transpose()
    }

    /// Fetches the first column of the first row.
    pub async fn fetch_val(&self, sql: &str, params: Vec<SqlValue>) -> Result<SqlValue> {
        let row = self
            .fetch_one(sql, params)
            .await?
            .ok_or(SqlError::Database(sqlx::Error::RowNotFound))?;
        row.get_index(0)
            .cloned()
            .ok_or_else(|| SqlError::MissingColumn(String::from("0")))
    }
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}
