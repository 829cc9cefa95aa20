//! Schema mutation operations.
//!
//! Each selects the database, runs one DDL statement and commits (MySQL
//! commits DDL implicitly).

use std::collections::HashSet;

use common::errors::{AppError, AppResult};
use common::models::ColumnDef;
use common::utils::IdentifierValidator;
use tracing::info;

use crate::session::DbSession;

/// Builds `CREATE TABLE` from the column definitions.
fn create_table_sql(table: &str, columns: &[ColumnDef]) -> AppResult<String> {
    if columns.is_empty() {
        return Err(AppError::Validation("a table needs at least one column".into()));
    }
    let mut seen = HashSet::new();
    let mut defs = Vec::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.name.as_str()) {
            return Err(AppError::Validation(format!(
                "duplicate column name `{}`",
                column.name
            )));
        }
        IdentifierValidator::validate_type(&column.column_type)?;
        defs.push(format!(
            "{} {}",
            IdentifierValidator::quote(&column.name)?,
            column.column_type.trim()
        ));
    }
    Ok(format!(
        "CREATE TABLE {} ({})",
        IdentifierValidator::quote(table)?,
        defs.join(", ")
    ))
}

/// Creates `table` in `database`.
pub async fn create_table(
    session: &mut DbSession,
    database: &str,
    table: &str,
    columns: &[ColumnDef],
) -> AppResult<()> {
    let sql = create_table_sql(table, columns)?;
    session.use_database(database).await?;
    session.execute(&sql, &[]).await?;
    info!(database, table, columns = columns.len(), "Table created");
    Ok(())
}

/// Drops `table`; fails if it does not exist.
pub async fn delete_table(session: &mut DbSession, database: &str, table: &str) -> AppResult<()> {
    let sql = format!("DROP TABLE {}", IdentifierValidator::quote(table)?);
    session.use_database(database).await?;
    session.execute(&sql, &[]).await?;
    info!(database, table, "Table dropped");
    Ok(())
}

/// Appends a column of `column_type` to `table`.
pub async fn add_column(
    session: &mut DbSession,
    database: &str,
    table: &str,
    column: &str,
    column_type: &str,
) -> AppResult<()> {
    IdentifierValidator::validate_type(column_type)?;
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        IdentifierValidator::quote(table)?,
        IdentifierValidator::quote(column)?,
        column_type.trim()
    );
    session.use_database(database).await?;
    session.execute(&sql, &[]).await?;
    info!(database, table, column, column_type, "Column added");
    Ok(())
}

/// Removes `column` from `table`.
pub async fn delete_column(
    session: &mut DbSession,
    database: &str,
    table: &str,
    column: &str,
) -> AppResult<()> {
    let sql = format!(
        "ALTER TABLE {} DROP COLUMN {}",
        IdentifierValidator::quote(table)?,
        IdentifierValidator::quote(column)?
    );
    session.use_database(database).await?;
    session.execute(&sql, &[]).await?;
    info!(database, table, column, "Column dropped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{get_table_contents, list_tables};
    use crate::testing::FakeServer;
    use common::errors::ErrorKind;

    fn widget_columns() -> Vec<ColumnDef> {
        vec![ColumnDef::new("id", "INT"), ColumnDef::new("name", "VARCHAR(255)")]
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql("Widgets", &widget_columns()).unwrap();
        assert_eq!(sql, "CREATE TABLE `Widgets` (`id` INT, `name` VARCHAR(255))");
    }

    #[test]
    fn test_create_table_sql_rejects_bad_input() {
        assert!(create_table_sql("Widgets", &[]).is_err());
        assert!(create_table_sql("Wid gets", &widget_columns()).is_err());
        let dup = vec![ColumnDef::new("id", "INT"), ColumnDef::new("id", "TEXT")];
        assert!(create_table_sql("Widgets", &dup).is_err());
        let injected = vec![ColumnDef::new("id", "INT); DROP TABLE users; --")];
        assert!(create_table_sql("Widgets", &injected).is_err());
    }

    #[tokio::test]
    async fn test_created_table_is_listed() {
        let server = FakeServer::new().with_database("shop");
        let mut session = server.connected_session().await;

        create_table(&mut session, "shop", "Widgets", &widget_columns())
            .await
            .unwrap();
        let tables = list_tables(&mut session, "shop").await.unwrap();
        assert!(tables.contains(&"Widgets".to_string()));
    }

    #[tokio::test]
    async fn test_deleted_table_is_gone_and_second_delete_fails() {
        let server = FakeServer::new().with_table("shop", "Widgets", &[("id", "INT")]);
        let mut session = server.connected_session().await;

        delete_table(&mut session, "shop", "Widgets").await.unwrap();
        let tables = list_tables(&mut session, "shop").await.unwrap();
        assert!(!tables.contains(&"Widgets".to_string()));

        let err = delete_table(&mut session, "shop", "Widgets").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[tokio::test]
    async fn test_add_and_delete_column() {
        let server = FakeServer::new().with_table("shop", "Widgets", &[("id", "INT")]);
        let mut session = server.connected_session().await;

        add_column(&mut session, "shop", "Widgets", "price", "DECIMAL(10,2)")
            .await
            .unwrap();
        let contents = get_table_contents(&mut session, "shop", "Widgets").await.unwrap();
        assert_eq!(contents.column_names(), vec!["id", "price"]);

        delete_column(&mut session, "shop", "Widgets", "price").await.unwrap();
        let contents = get_table_contents(&mut session, "shop", "Widgets").await.unwrap();
        assert_eq!(contents.column_names(), vec!["id"]);
    }

    #[tokio::test]
    async fn test_delete_missing_column_is_server_error() {
        let server = FakeServer::new().with_table("shop", "Widgets", &[("id", "INT"), ("a", "INT")]);
        let mut session = server.connected_session().await;
        let err = delete_column(&mut session, "shop", "Widgets", "zzz").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[tokio::test]
    async fn test_invalid_identifier_never_reaches_server() {
        let server = FakeServer::new().with_database("shop");
        let mut session = server.connected_session().await;

        let err = add_column(&mut session, "shop", "Widgets", "x; --", "INT")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(server.statements().is_empty());
    }
}
