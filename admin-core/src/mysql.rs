//! MySQL driver built on sqlx.
//!
//! One `MySqlConnection` per session, never a pool: `USE` changes state on
//! the connection it runs on, and every later statement must see it.
//!
//! Prepared statements are never cached: MySQL runs a prepared statement in
//! the database that was current when it was prepared.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlColumn, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::Statement as _;
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, TypeInfo};

use common::errors::{AppError, AppResult};
use common::models::{ColumnInfo, ConnectParams, QueryResult};

use crate::driver::{Connector, SqlDriver, Statement};

/// Opens [`MySqlDriver`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self, params: &ConnectParams) -> AppResult<Box<dyn SqlDriver>> {
        let mut options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.username)
            .password(&params.password)
            .statement_cache_capacity(0);
        if let Some(database) = params.database.as_deref() {
            options = options.database(database);
        }

        let conn = options
            .connect()
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
        Ok(Box::new(MySqlDriver { conn }))
    }
}

/// A single authenticated MySQL connection.
pub struct MySqlDriver {
    conn: MySqlConnection,
}

fn server_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseQuery(e.to_string())
}

/// Binds JSON values as positional `?` parameters.
///
/// The statement is prepared fresh on every call.
fn bind_values<'q>(sql: &'q str, params: &'q [Value]) -> Query<'q, MySql, MySqlArguments> {
    let query = sqlx::query(sql).persistent(false);
    params.iter().fold(query, |query, value| match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    })
}

fn describe(columns: &[MySqlColumn]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|c| ColumnInfo::new(c.name(), c.type_info().name()))
        .collect()
}

fn decode_row(row: &MySqlRow) -> Vec<Value> {
    row.columns()
        .iter()
        .map(|column| {
            decode_cell(row, column.ordinal(), column.type_info().name()).unwrap_or_else(|e| {
                tracing::warn!(column = column.name(), error = %e, "Undecodable value, returning null");
                Value::Null
            })
        })
        .collect()
}

/// Decodes one cell by its declared type.
///
/// `TINYINT(1)` is reported as BOOLEAN but stays an integer.
/// DECIMAL, character, ENUM, SET and JSON columns come back as text.
fn decode_cell(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get_unchecked::<Option<i64>, _>(index)?.map(Value::from)
        }
        unsigned if unsigned.ends_with("UNSIGNED") => {
            row.try_get_unchecked::<Option<u64>, _>(index)?.map(Value::from)
        }
        "FLOAT" | "DOUBLE" => row.try_get_unchecked::<Option<f64>, _>(index)?.map(Value::from),
        "DATE" => row
            .try_get_unchecked::<Option<chrono::NaiveDate>, _>(index)?
            .map(|d| Value::from(d.format("%Y-%m-%d").to_string())),
        "DATETIME" => row
            .try_get_unchecked::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|d| Value::from(d.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIMESTAMP" => row
            .try_get_unchecked::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
            .map(|d| Value::from(d.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIME" => row
            .try_get_unchecked::<Option<chrono::NaiveTime>, _>(index)?
            .map(|t| Value::from(t.format("%H:%M:%S").to_string())),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)?
            .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned())),
        _ => row.try_get_unchecked::<Option<String>, _>(index)?.map(Value::from),
    };
    Ok(value.unwrap_or(Value::Null))
}

#[async_trait]
impl SqlDriver for MySqlDriver {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> AppResult<u64> {
        let done = if params.is_empty() {
            (&mut self.conn).execute(sqlx::raw_sql(sql)).await
        } else {
            bind_values(sql, params).execute(&mut self.conn).await
        }
        .map_err(server_error)?;
        Ok(done.rows_affected())
    }

    async fn execute_all(&mut self, statements: &[Statement<'_>]) -> AppResult<u64> {
        let mut tx = self.conn.begin().await.map_err(server_error)?;
        let mut affected = 0;
        for &(sql, params) in statements {
            let done = bind_values(sql, params)
                .execute(&mut *tx)
                .await
                .map_err(server_error)?;
            affected += done.rows_affected();
        }
        tx.commit().await.map_err(server_error)?;
        Ok(affected)
    }

    async fn fetch(&mut self, sql: &str, params: &[Value]) -> AppResult<QueryResult> {
        let rows = bind_values(sql, params)
            .fetch_all(&mut self.conn)
            .await
            .map_err(server_error)?;

        let columns = match rows.first() {
            Some(row) => describe(row.columns()),
            None => {
                let statement = (&mut self.conn).prepare(sql).await.map_err(server_error)?;
                describe(statement.columns())
            }
        };

        Ok(QueryResult {
            columns,
            rows: rows.iter().map(decode_row).collect(),
        })
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        let MySqlDriver { conn } = *self;
        conn.close().await.map_err(server_error)
    }
}

/// Runs against a live server when `MYSQL_TEST_HOST` is set:
/// `MYSQL_TEST_HOST=127.0.0.1 MYSQL_TEST_PASSWORD=... cargo test -p admin-core -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::session::DbSession;
    use common::models::ColumnDef;
    use serde_json::json;

    const DB_A: &str = "admin_core_scope_a";
    const DB_B: &str = "admin_core_scope_b";

    fn live_params() -> Option<ConnectParams> {
        let host = std::env::var("MYSQL_TEST_HOST").ok()?;
        let user = std::env::var("MYSQL_TEST_USER").unwrap_or_else(|_| "root".into());
        let password = std::env::var("MYSQL_TEST_PASSWORD").unwrap_or_default();
        let port = std::env::var("MYSQL_TEST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3306);
        Some(ConnectParams::new(host, user, password).with_port(port))
    }

    async fn live_session() -> Option<DbSession> {
        let params = live_params()?;
        let mut session = DbSession::mysql();
        session.try_connect(&params).await.unwrap();
        for db in [DB_A, DB_B] {
            session
                .execute(&format!("DROP DATABASE IF EXISTS `{}`", db), &[])
                .await
                .unwrap();
            session
                .execute(&format!("CREATE DATABASE `{}`", db), &[])
                .await
                .unwrap();
        }
        Some(session)
    }

    async fn drop_databases(session: &mut DbSession) {
        for db in [DB_A, DB_B] {
            session
                .execute(&format!("DROP DATABASE IF EXISTS `{}`", db), &[])
                .await
                .unwrap();
        }
        session.close().await;
    }

    #[tokio::test]
    #[ignore]
    async fn test_same_statement_follows_scope_switch() {
        let Some(mut session) = live_session().await else { return };
        let widgets = vec![ColumnDef::new("id", "INT"), ColumnDef::new("name", "VARCHAR(32)")];

        ops::create_table(&mut session, DB_A, "Widgets", &widgets).await.unwrap();
        ops::create_table(&mut session, DB_A, "OnlyInA", &widgets).await.unwrap();
        ops::create_table(&mut session, DB_B, "Widgets", &widgets).await.unwrap();

        let tables_a = ops::list_tables(&mut session, DB_A).await.unwrap();
        let tables_b = ops::list_tables(&mut session, DB_B).await.unwrap();
        assert!(tables_a.contains(&"OnlyInA".to_string()));
        assert!(!tables_b.contains(&"OnlyInA".to_string()));

        ops::add_row(&mut session, DB_A, "Widgets", &[json!(1), json!("a")], None)
            .await
            .unwrap();
        ops::add_row(&mut session, DB_B, "Widgets", &[json!(2), json!("b")], None)
            .await
            .unwrap();

        let a = ops::get_table_contents(&mut session, DB_A, "Widgets").await.unwrap();
        let b = ops::get_table_contents(&mut session, DB_B, "Widgets").await.unwrap();
        assert_eq!(a.rows, vec![vec![json!(1), json!("a")]]);
        assert_eq!(b.rows, vec![vec![json!(2), json!("b")]]);

        drop_databases(&mut session).await;
    }

    #[tokio::test]
    #[ignore]
    async fn test_values_round_trip_and_empty_descriptors() {
        let Some(mut session) = live_session().await else { return };
        let columns = vec![
            ColumnDef::new("id", "BIGINT"),
            ColumnDef::new("flag", "TINYINT(1)"),
            ColumnDef::new("label", "VARCHAR(64)"),
            ColumnDef::new("day", "DATE"),
            ColumnDef::new("note", "TEXT"),
        ];
        ops::create_table(&mut session, DB_A, "Samples", &columns).await.unwrap();

        let empty = ops::get_table_contents(&mut session, DB_A, "Samples").await.unwrap();
        assert!(empty.rows.is_empty());
        assert_eq!(empty.column_names(), vec!["id", "flag", "label", "day", "note"]);

        let row = vec![
            json!(9_007_199_254_740_993i64),
            json!(5),
            json!("it's \"quoted\""),
            json!("2024-02-29"),
            Value::Null,
        ];
        ops::add_row(&mut session, DB_A, "Samples", &row, None).await.unwrap();
        let contents = ops::get_table_contents(&mut session, DB_A, "Samples").await.unwrap();
        assert_eq!(contents.rows, vec![row]);

        drop_databases(&mut session).await;
    }
}
