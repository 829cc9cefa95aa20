//! In-memory stand-in for a MySQL server.
//!
//! Understands exactly the statement shapes this crate generates, records
//! every statement it receives and every connection attempt, and answers
//! literal queries registered with [`FakeServer::respond_to`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use common::errors::{AppError, AppResult};
use common::models::{ColumnInfo, ConnectParams, QueryResult};

use crate::driver::{Connector, SqlDriver, Statement};
use crate::session::DbSession;

const PASSWORD: &str = "secret";

/// Credentials the fake server accepts.
pub fn params() -> ConnectParams {
    ConnectParams::new("localhost", "root", PASSWORD)
}

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<(String, String)>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    fn index_of(&self, column: &str) -> AppResult<usize> {
        self.columns
            .iter()
            .position(|(name, _)| name == column)
            .ok_or_else(|| query_error(format!("Unknown column '{}'", column)))
    }

    fn result(&self, rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: self
                .columns
                .iter()
                .map(|(name, ty)| ColumnInfo::new(name.clone(), ty.clone()))
                .collect(),
            rows,
        }
    }
}

type Databases = BTreeMap<String, Vec<(String, Table)>>;

#[derive(Default)]
struct ServerState {
    databases: Databases,
    statements: Vec<String>,
    connects: usize,
    canned: Vec<(String, QueryResult)>,
}

enum Reply {
    Rows(QueryResult),
    Affected(u64),
}

fn query_error(message: impl Into<String>) -> AppError {
    AppError::DatabaseQuery(message.into())
}

/// Shared handle on the fake server.
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn with_database(self, name: &str) -> Self {
        self.lock().databases.entry(name.to_string()).or_default();
        self
    }

    pub fn with_table(self, database: &str, table: &str, columns: &[(&str, &str)]) -> Self {
        {
            let mut state = self.lock();
            let tables = state.databases.entry(database.to_string()).or_default();
            tables.push((
                table.to_string(),
                Table {
                    columns: columns
                        .iter()
                        .map(|(n, t)| (n.to_string(), t.to_string()))
                        .collect(),
                    rows: Vec::new(),
                },
            ));
        }
        self
    }

    pub fn with_row(self, database: &str, table: &str, row: Vec<Value>) -> Self {
        {
            let mut state = self.lock();
            let tables = state.databases.get_mut(database).unwrap();
            let (_, t) = tables.iter_mut().find(|(n, _)| n == table).unwrap();
            t.rows.push(row);
        }
        self
    }

    pub fn respond_to(self, sql: &str, result: QueryResult) -> Self {
        self.lock().canned.push((sql.trim().to_string(), result));
        self
    }

    /// Every statement received, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Number of statements starting with `prefix`.
    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.lock()
            .statements
            .iter()
            .filter(|s| s.starts_with(prefix))
            .count()
    }

    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    pub fn rows(&self, database: &str, table: &str) -> Vec<Vec<Value>> {
        self.lock()
            .databases
            .get(database)
            .and_then(|tables| tables.iter().find(|(n, _)| n == table))
            .map(|(_, t)| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn session(&self) -> DbSession {
        DbSession::new(Arc::new(self.clone()))
    }

    pub async fn connected_session(&self) -> DbSession {
        let mut session = self.session();
        session.try_connect(&params()).await.unwrap();
        session
    }
}

#[async_trait]
impl Connector for FakeServer {
    async fn connect(&self, params: &ConnectParams) -> AppResult<Box<dyn SqlDriver>> {
        let mut state = self.lock();
        state.connects += 1;
        if params.password != PASSWORD {
            return Err(AppError::DatabaseConnection(format!(
                "Access denied for user '{}'@'{}'",
                params.username, params.host
            )));
        }
        if let Some(db) = &params.database {
            if !state.databases.contains_key(db) {
                return Err(AppError::DatabaseConnection(format!("Unknown database '{}'", db)));
            }
        }
        Ok(Box::new(FakeDriver {
            state: self.state.clone(),
            scope: params.database.clone(),
        }))
    }
}

struct FakeDriver {
    state: Arc<Mutex<ServerState>>,
    scope: Option<String>,
}

/// Splits on commas outside parentheses.
fn split_top_level(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts.into_iter().map(|p| p.trim().to_string()).collect()
}

/// `a = ?` conditions and assignments: returns the column name.
fn placeholder_column(clause: &str) -> AppResult<String> {
    clause
        .trim()
        .strip_suffix("= ?")
        .map(|c| c.trim().to_string())
        .ok_or_else(|| query_error(format!("unsupported clause '{}'", clause)))
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    fn text(v: &Value) -> Option<String> {
        match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
    matches!((text(a), text(b)), (Some(x), Some(y)) if x == y)
}

impl FakeDriver {
    fn tables<'s>(&self, databases: &'s mut Databases) -> AppResult<&'s mut Vec<(String, Table)>> {
        let scope = self
            .scope
            .as_ref()
            .ok_or_else(|| query_error("No database selected"))?;
        databases
            .get_mut(scope)
            .ok_or_else(|| query_error(format!("Unknown database '{}'", scope)))
    }

    fn table<'s>(&self, databases: &'s mut Databases, name: &str) -> AppResult<&'s mut Table> {
        let scope = self.scope.clone().unwrap_or_default();
        self.tables(databases)?
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| query_error(format!("Table '{}.{}' doesn't exist", scope, name)))
    }

    fn run(&mut self, sql: &str, params: &[Value]) -> AppResult<Reply> {
        let state = self.state.clone();
        let mut state = state.lock().unwrap();
        state.statements.push(sql.to_string());

        let stmt = sql.replace('`', "");
        let stmt = stmt.trim();

        if stmt == "SHOW DATABASES" {
            let rows = state.databases.keys().map(|n| vec![json!(n)]).collect();
            return Ok(Reply::Rows(QueryResult {
                columns: vec![ColumnInfo::new("Database", "VARCHAR")],
                rows,
            }));
        }
        if let Some(db) = stmt.strip_prefix("USE ") {
            if !state.databases.contains_key(db) {
                return Err(query_error(format!("Unknown database '{}'", db)));
            }
            self.scope = Some(db.to_string());
            return Ok(Reply::Affected(0));
        }
        if stmt == "SHOW TABLES" {
            let scope = self.scope.clone().unwrap_or_default();
            let rows = self
                .tables(&mut state.databases)?
                .iter()
                .map(|(n, _)| vec![json!(n)])
                .collect();
            return Ok(Reply::Rows(QueryResult {
                columns: vec![ColumnInfo::new(format!("Tables_in_{}", scope), "VARCHAR")],
                rows,
            }));
        }
        if let Some(name) = stmt.strip_prefix("SHOW COLUMNS FROM ") {
            let table = self.table(&mut state.databases, name)?;
            let rows = table
                .columns
                .iter()
                .map(|(n, t)| vec![json!(n), json!(t)])
                .collect();
            return Ok(Reply::Rows(QueryResult {
                columns: vec![
                    ColumnInfo::new("Field", "VARCHAR"),
                    ColumnInfo::new("Type", "TEXT"),
                ],
                rows,
            }));
        }
        if let Some(rest) = stmt.strip_prefix("CREATE TABLE ") {
            let (name, defs) = rest
                .split_once(" (")
                .ok_or_else(|| query_error("malformed CREATE TABLE"))?;
            let defs = defs.strip_suffix(')').unwrap_or(defs);
            let columns = split_top_level(defs)
                .into_iter()
                .map(|def| {
                    def.split_once(' ')
                        .map(|(n, t)| (n.to_string(), t.to_string()))
                        .ok_or_else(|| query_error(format!("malformed column '{}'", def)))
                })
                .collect::<AppResult<Vec<_>>>()?;
            let tables = self.tables(&mut state.databases)?;
            if tables.iter().any(|(n, _)| n == name) {
                return Err(query_error(format!("Table '{}' already exists", name)));
            }
            tables.push((name.to_string(), Table { columns, rows: Vec::new() }));
            return Ok(Reply::Affected(0));
        }
        if let Some(name) = stmt.strip_prefix("DROP TABLE ") {
            let scope = self.scope.clone().unwrap_or_default();
            let tables = self.tables(&mut state.databases)?;
            let before = tables.len();
            tables.retain(|(n, _)| n != name);
            if tables.len() == before {
                return Err(query_error(format!("Unknown table '{}.{}'", scope, name)));
            }
            return Ok(Reply::Affected(0));
        }
        if let Some(rest) = stmt.strip_prefix("ALTER TABLE ") {
            if let Some((name, def)) = rest.split_once(" ADD COLUMN ") {
                let (column, ty) = def
                    .split_once(' ')
                    .ok_or_else(|| query_error("malformed ADD COLUMN"))?;
                let table = self.table(&mut state.databases, name)?;
                if table.index_of(column).is_ok() {
                    return Err(query_error(format!("Duplicate column name '{}'", column)));
                }
                table.columns.push((column.to_string(), ty.to_string()));
                table.rows.iter_mut().for_each(|row| row.push(Value::Null));
                return Ok(Reply::Affected(0));
            }
            if let Some((name, column)) = rest.split_once(" DROP COLUMN ") {
                let table = self.table(&mut state.databases, name)?;
                let index = table.index_of(column).map_err(|_| {
                    query_error(format!("Can't DROP '{}'; check that column/key exists", column))
                })?;
                if table.columns.len() == 1 {
                    return Err(query_error(
                        "You can't delete all columns with ALTER TABLE; use DROP TABLE instead",
                    ));
                }
                table.columns.remove(index);
                table.rows.iter_mut().for_each(|row| {
                    row.remove(index);
                });
                return Ok(Reply::Affected(0));
            }
        }
        if let Some(rest) = stmt.strip_prefix("INSERT INTO ") {
            let (name, rest) = rest
                .split_once(" (")
                .ok_or_else(|| query_error("malformed INSERT"))?;
            let (columns, _) = rest
                .split_once(')')
                .ok_or_else(|| query_error("malformed INSERT"))?;
            let columns = split_top_level(columns);
            if columns.len() != params.len() {
                return Err(query_error("Column count doesn't match value count"));
            }
            let table = self.table(&mut state.databases, name)?;
            let mut row = vec![Value::Null; table.columns.len()];
            for (column, value) in columns.iter().zip(params) {
                row[table.index_of(column)?] = value.clone();
            }
            table.rows.push(row);
            return Ok(Reply::Affected(1));
        }
        if let Some(rest) = stmt.strip_prefix("SELECT * FROM ") {
            let limit_one = rest.ends_with(" LIMIT 1");
            let rest = rest.strip_suffix(" LIMIT 1").unwrap_or(rest);
            let (name, condition) = match rest.split_once(" WHERE ") {
                Some((name, condition)) => (name, Some(placeholder_column(condition)?)),
                None => (rest, None),
            };
            let table = self.table(&mut state.databases, name)?;
            let mut rows: Vec<Vec<Value>> = match condition {
                Some(column) => {
                    let index = table.index_of(&column)?;
                    let key = params.first().cloned().unwrap_or(Value::Null);
                    table
                        .rows
                        .iter()
                        .filter(|row| loose_eq(&row[index], &key))
                        .cloned()
                        .collect()
                }
                None => table.rows.clone(),
            };
            if limit_one {
                rows.truncate(1);
            }
            return Ok(Reply::Rows(table.result(rows)));
        }
        if let Some(rest) = stmt.strip_prefix("DELETE FROM ") {
            let (name, condition) = rest
                .split_once(" WHERE ")
                .ok_or_else(|| query_error("DELETE without WHERE"))?;
            let column = placeholder_column(condition)?;
            let key = params.first().cloned().unwrap_or(Value::Null);
            let table = self.table(&mut state.databases, name)?;
            let index = table.index_of(&column)?;
            let before = table.rows.len();
            table.rows.retain(|row| !loose_eq(&row[index], &key));
            return Ok(Reply::Affected((before - table.rows.len()) as u64));
        }
        if let Some(rest) = stmt.strip_prefix("UPDATE ") {
            let (name, rest) = rest
                .split_once(" SET ")
                .ok_or_else(|| query_error("malformed UPDATE"))?;
            let (assignments, condition) = rest
                .split_once(" WHERE ")
                .ok_or_else(|| query_error("UPDATE without WHERE"))?;
            let targets = split_top_level(assignments)
                .iter()
                .map(|a| placeholder_column(a))
                .collect::<AppResult<Vec<_>>>()?;
            let key_column = placeholder_column(condition)?;
            if params.len() != targets.len() + 1 {
                return Err(query_error("parameter count mismatch"));
            }
            let table = self.table(&mut state.databases, name)?;
            let key_index = table.index_of(&key_column)?;
            let indexes = targets
                .iter()
                .map(|c| table.index_of(c))
                .collect::<AppResult<Vec<_>>>()?;
            let key = &params[targets.len()];
            let mut affected = 0;
            for row in table.rows.iter_mut().filter(|row| loose_eq(&row[key_index], key)) {
                for (index, value) in indexes.iter().zip(params) {
                    row[*index] = value.clone();
                }
                affected += 1;
            }
            return Ok(Reply::Affected(affected));
        }
        if let Some((_, result)) = state.canned.iter().find(|(s, _)| s == sql.trim()) {
            return Ok(Reply::Rows(result.clone()));
        }
        Err(query_error(format!(
            "You have an error in your SQL syntax near '{}'",
            stmt
        )))
    }
}

#[async_trait]
impl SqlDriver for FakeDriver {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> AppResult<u64> {
        match self.run(sql, params)? {
            Reply::Affected(n) => Ok(n),
            Reply::Rows(_) => Ok(0),
        }
    }

    async fn execute_all(&mut self, statements: &[Statement<'_>]) -> AppResult<u64> {
        let snapshot = self.state.lock().unwrap().databases.clone();
        let mut affected = 0;
        for &(sql, params) in statements {
            match self.run(sql, params) {
                Ok(Reply::Affected(n)) => affected += n,
                Ok(Reply::Rows(_)) => {}
                Err(e) => {
                    self.state.lock().unwrap().databases = snapshot;
                    return Err(e);
                }
            }
        }
        Ok(affected)
    }

    async fn fetch(&mut self, sql: &str, params: &[Value]) -> AppResult<QueryResult> {
        match self.run(sql, params)? {
            Reply::Rows(result) => Ok(result),
            Reply::Affected(_) => Ok(QueryResult::empty()),
        }
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
