//! Row operations.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, info};

use common::errors::{AppError, AppResult};
use common::models::QueryResult;
use common::utils::IdentifierValidator;

use super::listing::list_columns;
use crate::session::DbSession;

/// Every row of `table` plus its column descriptors.
///
/// No pagination: the whole table is materialised.
pub async fn get_table_contents(
    session: &mut DbSession,
    database: &str,
    table: &str,
) -> AppResult<QueryResult> {
    let sql = format!("SELECT * FROM {}", IdentifierValidator::quote(table)?);
    session.use_database(database).await?;
    session.fetch(&sql, &[]).await
}

/// Checks the caller's target columns against the table's real columns.
///
/// An explicit column list must name exactly the table's column set (any
/// order); partial inserts are refused. The value count must match too.
fn resolve_insert_columns(
    table_columns: Vec<String>,
    columns: Option<&[String]>,
    value_count: usize,
) -> AppResult<Vec<String>> {
    let target = match columns {
        None => table_columns,
        Some(given) => {
            let given_set: HashSet<&str> = given.iter().map(String::as_str).collect();
            let actual: HashSet<&str> = table_columns.iter().map(String::as_str).collect();
            if given_set != actual {
                return Err(AppError::Validation(
                    "provided columns do not match the table columns".into(),
                ));
            }
            given.to_vec()
        }
    };
    if target.len() != value_count {
        return Err(AppError::Validation(format!(
            "column count ({}) doesn't match value count ({})",
            target.len(),
            value_count
        )));
    }
    Ok(target)
}

/// Inserts one row.
///
/// With `columns` omitted the values are matched against the table's columns
/// in server order. Column-set and count mismatches fail before the INSERT
/// is sent.
pub async fn add_row(
    session: &mut DbSession,
    database: &str,
    table: &str,
    values: &[Value],
    columns: Option<&[String]>,
) -> AppResult<()> {
    let quoted_table = IdentifierValidator::quote(table)?;
    let table_columns = list_columns(session, database, table).await?;
    let target = resolve_insert_columns(table_columns, columns, values.len())?;
    debug!(table, columns = ?target, "Resolved insert columns");

    let quoted_columns = target
        .iter()
        .map(|c| IdentifierValidator::quote(c))
        .collect::<AppResult<Vec<_>>>()?;
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted_table,
        quoted_columns.join(", "),
        placeholders
    );

    session.execute(&sql, values).await?;
    info!(database, table, "Row added");
    Ok(())
}

/// Deletes every row where `column` equals `value`.
///
/// Matching zero rows is a success. Returns the number of rows removed.
pub async fn delete_row(
    session: &mut DbSession,
    database: &str,
    table: &str,
    column: &str,
    value: &Value,
) -> AppResult<u64> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        IdentifierValidator::quote(table)?,
        IdentifierValidator::quote(column)?
    );
    session.use_database(database).await?;
    let deleted = session.execute(&sql, std::slice::from_ref(value)).await?;
    info!(database, table, column, deleted, "Rows deleted");
    Ok(deleted)
}

/// Updates rows where `key_column` equals `key_value`.
///
/// Returns the affected row count.
pub async fn update_row(
    session: &mut DbSession,
    database: &str,
    table: &str,
    assignments: &[(String, Value)],
    key_column: &str,
    key_value: &Value,
) -> AppResult<u64> {
    if assignments.is_empty() {
        return Err(AppError::Validation("nothing to update".into()));
    }
    let set_clause = assignments
        .iter()
        .map(|(column, _)| IdentifierValidator::quote(column).map(|c| format!("{} = ?", c)))
        .collect::<AppResult<Vec<_>>>()?
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        IdentifierValidator::quote(table)?,
        set_clause,
        IdentifierValidator::quote(key_column)?
    );
    let params: Vec<Value> = assignments
        .iter()
        .map(|(_, value)| value.clone())
        .chain(std::iter::once(key_value.clone()))
        .collect();

    session.use_database(database).await?;
    let updated = session.execute(&sql, &params).await?;
    info!(database, table, key_column, updated, "Rows updated");
    Ok(updated)
}

/// First row of `table` (in the current scope) whose `id_column` equals
/// `id_value`, as a field-name to value mapping.
pub async fn get_row_by_id(
    session: &mut DbSession,
    table: &str,
    id_column: &str,
    id_value: &Value,
) -> AppResult<Option<Map<String, Value>>> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = ? LIMIT 1",
        IdentifierValidator::quote(table)?,
        IdentifierValidator::quote(id_column)?
    );
    let result = session.fetch(&sql, std::slice::from_ref(id_value)).await?;
    Ok(result.row_as_map(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;
    use crate::testing::FakeServer;
    use common::errors::ErrorKind;
    use serde_json::json;

    fn widgets() -> FakeServer {
        FakeServer::new().with_table("shop", "Widgets", &[("id", "INT"), ("name", "VARCHAR(255)")])
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_widgets_scenario() {
        let server = FakeServer::new().with_database("shop");
        let mut session = server.connected_session().await;
        let columns = vec![
            common::models::ColumnDef::new("id", "INT"),
            common::models::ColumnDef::new("name", "VARCHAR(255)"),
        ];

        assert!(crate::ops::create_table(&mut session, "shop", "Widgets", &columns)
            .await
            .succeeded("create_table"));
        let tables = crate::ops::list_tables(&mut session, "shop").await.or_empty("list_tables");
        assert!(tables.contains(&"Widgets".to_string()));
        assert!(add_row(&mut session, "shop", "Widgets", &[json!(1), json!("Bolt")], None)
            .await
            .succeeded("add_row"));

        let contents = get_table_contents(&mut session, "shop", "Widgets").await.unwrap();
        assert_eq!(contents.rows, vec![vec![json!(1), json!("Bolt")]]);
    }

    #[tokio::test]
    async fn test_explicit_columns_in_any_order() {
        let server = widgets();
        let mut session = server.connected_session().await;
        let columns = cols(&["name", "id"]);

        add_row(&mut session, "shop", "Widgets", &[json!("Nut"), json!(7)], Some(&columns))
            .await
            .unwrap();
        assert_eq!(server.rows("shop", "Widgets"), vec![vec![json!(7), json!("Nut")]]);
    }

    #[tokio::test]
    async fn test_partial_columns_rejected_without_insert() {
        let server = widgets();
        let mut session = server.connected_session().await;
        let columns = cols(&["name"]);

        let err = add_row(&mut session, "shop", "Widgets", &[json!("Nut")], Some(&columns))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(server.count_starting_with("INSERT"), 0);
    }

    #[tokio::test]
    async fn test_value_count_mismatch_rejected_without_insert() {
        let server = widgets();
        let mut session = server.connected_session().await;

        let result = add_row(&mut session, "shop", "Widgets", &[json!(1)], None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let columns = cols(&["id", "name"]);
        let result = add_row(
            &mut session,
            "shop",
            "Widgets",
            &[json!(1), json!("a"), json!("b")],
            Some(&columns),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(server.count_starting_with("INSERT"), 0);
    }

    #[tokio::test]
    async fn test_values_round_trip() {
        let server = FakeServer::new().with_table(
            "shop",
            "Items",
            &[("id", "INT"), ("label", "TEXT"), ("weight", "DOUBLE"), ("note", "TEXT")],
        );
        let mut session = server.connected_session().await;
        let row = vec![json!(42), json!("héllo, \"world\""), json!(2.5), Value::Null];

        add_row(&mut session, "shop", "Items", &row, None).await.unwrap();
        let contents = get_table_contents(&mut session, "shop", "Items").await.unwrap();
        assert_eq!(contents.rows, vec![row]);
    }

    #[tokio::test]
    async fn test_values_are_bound_not_interpolated() {
        let server = widgets();
        let mut session = server.connected_session().await;
        let nasty = json!("x'); DROP TABLE Widgets; --");

        add_row(&mut session, "shop", "Widgets", &[json!(1), nasty], None)
            .await
            .unwrap();
        let insert = server
            .statements()
            .into_iter()
            .find(|s| s.starts_with("INSERT"))
            .unwrap();
        assert_eq!(insert, "INSERT INTO `Widgets` (`id`, `name`) VALUES (?, ?)");
    }

    #[tokio::test]
    async fn test_delete_row_matching_nothing_succeeds() {
        let server = widgets().with_row("shop", "Widgets", vec![json!(1), json!("Bolt")]);
        let mut session = server.connected_session().await;

        let deleted = delete_row(&mut session, "shop", "Widgets", "id", &json!(99))
            .await
            .unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(server.rows("shop", "Widgets").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_row_removes_all_matches() {
        let server = widgets()
            .with_row("shop", "Widgets", vec![json!(1), json!("Bolt")])
            .with_row("shop", "Widgets", vec![json!(2), json!("Bolt")])
            .with_row("shop", "Widgets", vec![json!(3), json!("Nut")]);
        let mut session = server.connected_session().await;

        let deleted = delete_row(&mut session, "shop", "Widgets", "name", &json!("Bolt"))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(server.rows("shop", "Widgets"), vec![vec![json!(3), json!("Nut")]]);
    }

    #[tokio::test]
    async fn test_update_row() {
        let server = widgets().with_row("shop", "Widgets", vec![json!(1), json!("Bolt")]);
        let mut session = server.connected_session().await;

        let updated = update_row(
            &mut session,
            "shop",
            "Widgets",
            &[("name".to_string(), json!("Screw"))],
            "id",
            &json!(1),
        )
        .await
        .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(server.rows("shop", "Widgets"), vec![vec![json!(1), json!("Screw")]]);
    }

    #[tokio::test]
    async fn test_update_row_requires_assignments() {
        let server = widgets();
        let mut session = server.connected_session().await;
        let err = update_row(&mut session, "shop", "Widgets", &[], "id", &json!(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(server.statements().is_empty());
    }

    #[tokio::test]
    async fn test_get_row_by_id_uses_current_scope() {
        let server = widgets().with_row("shop", "Widgets", vec![json!(5), json!("Gear")]);
        let mut session = server.connected_session().await;
        session.use_database("shop").await.unwrap();

        let row = get_row_by_id(&mut session, "Widgets", "id", &json!(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("name"), Some(&json!("Gear")));

        let missing = get_row_by_id(&mut session, "Widgets", "id", &json!(6)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_no_connection_means_no_server_contact() {
        let server = widgets();
        let mut session = server.session();

        let databases = crate::ops::list_databases(&mut session).await.or_empty("list_databases");
        assert!(databases.is_empty());
        assert!(!add_row(&mut session, "shop", "Widgets", &[json!(1), json!("Bolt")], None)
            .await
            .succeeded("add_row"));
        let contents = get_table_contents(&mut session, "shop", "Widgets")
            .await
            .or_empty("get_table_contents");
        assert!(contents.rows.is_empty() && contents.columns.is_empty());

        assert_eq!(server.connects(), 0);
        assert!(server.statements().is_empty());
    }
}
