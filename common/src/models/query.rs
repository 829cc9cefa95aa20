//! Row and result set models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

/// Result of a read: column descriptors plus materialised rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Column information.
    pub columns: Vec<ColumnInfo>,

    /// Row data, positionally aligned with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Column descriptor reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Declared column type as the driver names it.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a column descriptor.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of the first column, e.g. the names from `SHOW TABLES`.
    pub fn first_column_strings(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.first())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    /// Row `index` as a column-name to value mapping.
    pub fn row_as_map(&self, index: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .zip(row.iter())
                .map(|(col, value)| (col.name.clone(), value.clone()))
                .collect(),
        )
    }
}

/// Single row lookup result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RowRecord {
    /// Whether a row matched.
    pub found: bool,
    /// Field name to value mapping of the row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<serde_json::Value>,
}

impl From<Option<Map<String, Value>>> for RowRecord {
    fn from(row: Option<Map<String, Value>>) -> Self {
        Self {
            found: row.is_some(),
            row: row.map(Value::Object),
        }
    }
}

/// Request body for inserting a row.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddRowRequest {
    /// Values in column order.
    pub values: Vec<serde_json::Value>,
    /// Target columns; defaults to every table column in server order.
    pub columns: Option<Vec<String>>,
}

/// Request body for deleting rows by a single equality condition.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteRowRequest {
    /// Column compared against `value`.
    #[validate(length(min = 1, max = 64, message = "Column name must be 1-64 characters"))]
    pub column: String,
    /// Value to match (bound, never interpolated).
    pub value: serde_json::Value,
}

/// Request body for updating rows matched by a key column.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRowRequest {
    /// Key column.
    #[validate(length(min = 1, max = 64, message = "Key column must be 1-64 characters"))]
    pub key_column: String,
    /// Key value.
    pub key_value: serde_json::Value,
    /// Column to new value assignments.
    #[validate(length(min = 1, message = "At least one assignment is required"))]
    pub set: Vec<Assignment>,
}

/// One `column = value` pair of an update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Assignment {
    /// Column to change.
    pub column: String,
    /// New value.
    pub value: serde_json::Value,
}
