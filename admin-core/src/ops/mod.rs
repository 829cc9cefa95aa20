//! Schema and row operations.
//!
//! Stateless functions: each takes the session plus its parameters, selects
//! the database scope where one is given, and runs one statement.
//! Identifiers are validated and quoted; values are always bound.

pub mod listing;
pub mod rows;
pub mod schema;

pub use listing::{list_columns, list_databases, list_tables};
pub use rows::{add_row, delete_row, get_row_by_id, get_table_contents, update_row};
pub use schema::{add_column, create_table, delete_column, delete_table};
