//! Farm domain records.
//!
//! These tables must already exist in the farm database:
//! `Product`, `Inventory`, `Sale`, `Customer` and `SeasonalAnalysis`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

/// The fixed farm tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FarmTable {
    Product,
    Inventory,
    Sale,
    Customer,
    SeasonalAnalysis,
}

impl FarmTable {
    /// All farm tables.
    pub const ALL: [FarmTable; 5] = [
        FarmTable::Product,
        FarmTable::Inventory,
        FarmTable::Sale,
        FarmTable::Customer,
        FarmTable::SeasonalAnalysis,
    ];

    /// Table name as stored on the server.
    pub fn name(&self) -> &'static str {
        match self {
            FarmTable::Product => "Product",
            FarmTable::Inventory => "Inventory",
            FarmTable::Sale => "Sale",
            FarmTable::Customer => "Customer",
            FarmTable::SeasonalAnalysis => "SeasonalAnalysis",
        }
    }

    /// Looks a table up by name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

/// A product offered by the farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Product {
    pub product_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub category: String,
    pub price: f64,
    #[validate(length(max = 255))]
    pub seasonal_availability: String,
}

impl Product {
    pub const COLUMNS: [&'static str; 5] =
        ["ProductID", "Name", "Category", "Price", "SeasonalAvailability"];

    /// Values in [`Product::COLUMNS`] order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            json!(self.product_id),
            json!(self.name),
            json!(self.category),
            json!(self.price),
            json!(self.seasonal_availability),
        ]
    }
}

/// Stock held for one product by one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct InventoryItem {
    pub inventory_id: i64,
    pub product_id: i64,
    pub vendor_id: i64,
    #[validate(range(min = 0))]
    pub quantity_in_stock: i64,
    #[validate(range(min = 0))]
    pub restock_threshold: i64,
}

impl InventoryItem {
    pub const COLUMNS: [&'static str; 5] = [
        "InventoryID",
        "ProductID",
        "VendorID",
        "QuantityInStock",
        "RestockThreshold",
    ];

    /// Values in [`InventoryItem::COLUMNS`] order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            json!(self.inventory_id),
            json!(self.product_id),
            json!(self.vendor_id),
            json!(self.quantity_in_stock),
            json!(self.restock_threshold),
        ]
    }
}

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Sale {
    pub sale_id: i64,
    pub vendor_id: i64,
    pub product_id: i64,
    pub customer_id: i64,
    /// Calendar date, `YYYY-MM-DD`.
    pub sale_date: NaiveDate,
    #[validate(range(min = 0))]
    pub quantity_sold: i64,
    pub total_price: f64,
}

impl Sale {
    pub const COLUMNS: [&'static str; 7] = [
        "SaleID",
        "VendorID",
        "ProductID",
        "CustomerID",
        "SaleDate",
        "QuantitySold",
        "TotalPrice",
    ];

    /// Values in [`Sale::COLUMNS`] order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            json!(self.sale_id),
            json!(self.vendor_id),
            json!(self.product_id),
            json!(self.customer_id),
            json!(self.sale_date.format("%Y-%m-%d").to_string()),
            json!(self.quantity_sold),
            json!(self.total_price),
        ]
    }
}

/// A customer of the farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Customer {
    pub customer_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub contact_info: String,
    #[validate(length(max = 255))]
    pub preferences: String,
}

impl Customer {
    pub const COLUMNS: [&'static str; 4] = ["CustomerID", "Name", "ContactInfo", "Preferences"];

    /// Values in [`Customer::COLUMNS`] order.
    pub fn values(&self) -> Vec<Value> {
        vec![
            json!(self.customer_id),
            json!(self.name),
            json!(self.contact_info),
            json!(self.preferences),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_name() {
        assert_eq!(FarmTable::parse("inventory"), Some(FarmTable::Inventory));
        assert_eq!(FarmTable::parse("Vendor"), None);
    }

    #[test]
    fn test_sale_values_format_date() {
        let sale = Sale {
            sale_id: 1,
            vendor_id: 2,
            product_id: 3,
            customer_id: 4,
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            quantity_sold: 5,
            total_price: 12.5,
        };
        let values = sale.values();
        assert_eq!(values.len(), Sale::COLUMNS.len());
        assert_eq!(values[4], json!("2024-03-09"));
    }

    #[test]
    fn test_sale_deserializes_iso_date() {
        let sale: Sale = serde_json::from_str(
            r#"{"sale_id":1,"vendor_id":1,"product_id":1,"customer_id":1,
                "sale_date":"2023-10-01","quantity_sold":2,"total_price":3.0}"#,
        )
        .unwrap();
        assert_eq!(sale.sale_date, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
    }
}
