//! Schema mutation models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A column to create: name plus a free-form SQL type literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate, ToSchema)]
pub struct ColumnDef {
    /// Column name.
    #[validate(length(min = 1, max = 64, message = "Column name must be 1-64 characters"))]
    pub name: String,
    /// SQL type, e.g. `VARCHAR(255)`.
    #[validate(length(min = 1, max = 64, message = "Column type must be 1-64 characters"))]
    pub column_type: String,
}

impl ColumnDef {
    /// Creates a column definition.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// Request body for creating a table.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTableRequest {
    /// Table name.
    #[validate(length(min = 1, max = 64, message = "Table name must be 1-64 characters"))]
    pub name: String,
    /// Columns in creation order.
    #[validate(length(min = 1, message = "At least one column is required"), nested)]
    pub columns: Vec<ColumnDef>,
}

/// Request body for adding a column.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddColumnRequest {
    /// Column name.
    #[validate(length(min = 1, max = 64, message = "Column name must be 1-64 characters"))]
    pub name: String,
    /// SQL type literal.
    #[validate(length(min = 1, max = 64, message = "Column type must be 1-64 characters"))]
    pub column_type: String,
}
