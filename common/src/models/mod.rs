//! Shared data models.

pub mod connection;
pub mod farm;
pub mod query;
pub mod report;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectParams, LoginRequest, SessionInfo, UserRole};
pub use farm::{Customer, FarmTable, InventoryItem, Product, Sale};
pub use query::{
    AddRowRequest, Assignment, ColumnInfo, DeleteRowRequest, QueryResult, RowRecord,
    UpdateRowRequest,
};
pub use report::{ReportResult, ReportSummary};
pub use schema::{AddColumnRequest, ColumnDef, CreateTableRequest};
