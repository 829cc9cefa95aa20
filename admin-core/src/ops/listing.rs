//! Listing operations.

use common::errors::AppResult;
use common::utils::IdentifierValidator;

use crate::session::DbSession;

/// Database names in server order.
pub async fn list_databases(session: &mut DbSession) -> AppResult<Vec<String>> {
    let result = session.fetch("SHOW DATABASES", &[]).await?;
    Ok(result.first_column_strings())
}

/// Table names of `database`.
///
/// Leaves `database` selected as the session scope.
pub async fn list_tables(session: &mut DbSession, database: &str) -> AppResult<Vec<String>> {
    session.use_database(database).await?;
    let result = session.fetch("SHOW TABLES", &[]).await?;
    Ok(result.first_column_strings())
}

/// Column names of `table` in declaration order.
pub async fn list_columns(
    session: &mut DbSession,
    database: &str,
    table: &str,
) -> AppResult<Vec<String>> {
    let sql = format!("SHOW COLUMNS FROM {}", IdentifierValidator::quote(table)?);
    session.use_database(database).await?;
    let result = session.fetch(&sql, &[]).await?;
    Ok(result.first_column_strings())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeServer;
    use common::errors::AppError;

    #[tokio::test]
    async fn test_list_databases_in_server_order() {
        let server = FakeServer::new().with_database("farm").with_database("shop");
        let mut session = server.connected_session().await;
        assert_eq!(list_databases(&mut session).await.unwrap(), vec!["farm", "shop"]);
    }

    #[tokio::test]
    async fn test_list_tables_changes_scope() {
        let server = FakeServer::new()
            .with_table("shop", "Widgets", &[("id", "INT")])
            .with_table("shop", "Orders", &[("id", "INT")]);
        let mut session = server.connected_session().await;

        let tables = list_tables(&mut session, "shop").await.unwrap();
        assert_eq!(tables, vec!["Widgets", "Orders"]);
        assert_eq!(session.scope(), Some("shop"));
    }

    #[tokio::test]
    async fn test_list_tables_unknown_database() {
        let server = FakeServer::new();
        let mut session = server.connected_session().await;
        let err = list_tables(&mut session, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseQuery(_)));
    }

    #[tokio::test]
    async fn test_list_columns() {
        let server =
            FakeServer::new().with_table("shop", "Widgets", &[("id", "INT"), ("name", "TEXT")]);
        let mut session = server.connected_session().await;
        let columns = list_columns(&mut session, "shop", "Widgets").await.unwrap();
        assert_eq!(columns, vec!["id", "name"]);
    }
}
