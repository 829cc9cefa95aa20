//! Farm analytics reports.

use tracing::info;

use common::errors::AppResult;
use common::models::{ReportResult, ReportSummary};

use crate::session::DbSession;

/// The fixed aggregate reports over the farm tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    SalesByProduct,
    InventoryLevels,
    SeasonalPatterns,
    DemandForecast,
}

impl Report {
    pub const ALL: [Report; 4] = [
        Report::SalesByProduct,
        Report::InventoryLevels,
        Report::SeasonalPatterns,
        Report::DemandForecast,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Report::SalesByProduct => "sales",
            Report::InventoryLevels => "inventory",
            Report::SeasonalPatterns => "seasonal",
            Report::DemandForecast => "forecast",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Report::SalesByProduct => "Sales Analytics",
            Report::InventoryLevels => "Inventory Analytics",
            Report::SeasonalPatterns => "Seasonal Patterns",
            Report::DemandForecast => "Demand Forecast",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Report::SalesByProduct => {
                "SELECT p.Name, SUM(s.QuantitySold) AS TotalUnitsSold, SUM(s.TotalPrice) AS TotalRevenue \
                 FROM Sale s \
                 JOIN Product p ON s.ProductID = p.ProductID \
                 GROUP BY p.ProductID"
            }
            Report::InventoryLevels => {
                "SELECT p.Name, i.QuantityInStock, i.RestockThreshold \
                 FROM Inventory i \
                 JOIN Product p ON i.ProductID = p.ProductID"
            }
            Report::SeasonalPatterns => {
                "SELECT p.Name, sa.DemandTrend, sa.SeasonalPeakPeriod \
                 FROM SeasonalAnalysis sa \
                 JOIN Product p ON sa.ProductID = p.ProductID"
            }
            Report::DemandForecast => {
                "SELECT p.Name, SUM(s.QuantitySold) AS TotalUnitsSold, sa.DemandTrend \
                 FROM Sale s \
                 JOIN Product p ON s.ProductID = p.ProductID \
                 JOIN SeasonalAnalysis sa ON p.ProductID = sa.ProductID \
                 GROUP BY p.ProductID, sa.DemandTrend"
            }
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.slug() == slug)
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            slug: self.slug().to_string(),
            title: self.title().to_string(),
        }
    }
}

/// Runs `report` against the farm database.
pub async fn run_report(
    session: &mut DbSession,
    database: &str,
    report: Report,
) -> AppResult<ReportResult> {
    session.use_database(database).await?;
    let result = session.fetch(report.sql(), &[]).await?;
    info!(report = report.slug(), rows = result.row_count(), "Report generated");
    Ok(ReportResult {
        slug: report.slug().to_string(),
        title: report.title().to_string(),
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeServer;
    use common::errors::ErrorKind;
    use common::models::{ColumnInfo, QueryResult};
    use serde_json::json;

    #[test]
    fn test_slugs_round_trip() {
        for report in Report::ALL {
            assert_eq!(Report::from_slug(report.slug()), Some(report));
        }
        assert_eq!(Report::from_slug("vendors"), None);
    }

    #[tokio::test]
    async fn test_run_report() {
        let canned = QueryResult {
            columns: vec![
                ColumnInfo::new("Name", "VARCHAR"),
                ColumnInfo::new("TotalUnitsSold", "DECIMAL"),
                ColumnInfo::new("TotalRevenue", "DECIMAL"),
            ],
            rows: vec![vec![json!("Carrot"), json!("12"), json!("18.00")]],
        };
        let server = FakeServer::new()
            .with_database("farmer_schema")
            .respond_to(Report::SalesByProduct.sql(), canned.clone());
        let mut session = server.connected_session().await;

        let report = run_report(&mut session, "farmer_schema", Report::SalesByProduct)
            .await
            .unwrap();
        assert_eq!(report.title, "Sales Analytics");
        assert_eq!(report.result, canned);
        assert_eq!(session.scope(), Some("farmer_schema"));
    }

    #[tokio::test]
    async fn test_run_report_missing_tables() {
        let server = FakeServer::new().with_database("farmer_schema");
        let mut session = server.connected_session().await;

        let err = run_report(&mut session, "farmer_schema", Report::InventoryLevels)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
    }
}
