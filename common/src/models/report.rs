//! Analytics report models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::query::QueryResult;

/// A report that can be run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ReportSummary {
    /// Path segment addressing the report.
    pub slug: String,
    /// Chart title.
    pub title: String,
}

/// Rows of one report, ready for charting.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResult {
    /// Path segment addressing the report.
    pub slug: String,
    /// Chart title.
    pub title: String,
    /// Aggregated rows.
    pub result: QueryResult,
}
