//! Farm operations.
//!
//! Typed wrappers over the generic row operations for the fixed farm tables.
//! Every insert goes through [`add_row`] with the record's full column list.

use chrono::Datelike;
use serde_json::{json, Map, Value};
use tracing::info;
use validator::Validate;

use common::errors::{AppError, AppResult};
use common::models::{Customer, FarmTable, InventoryItem, Product, QueryResult, Sale};

use crate::ops::{add_row, get_row_by_id, get_table_contents, update_row};
use crate::session::DbSession;

fn column_list(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Pairs every column but the first (the key) with its value.
fn assignments(columns: &[&str], values: Vec<Value>) -> Vec<(String, Value)> {
    columns
        .iter()
        .zip(values)
        .skip(1)
        .map(|(c, v)| (c.to_string(), v))
        .collect()
}

async fn insert(
    session: &mut DbSession,
    database: &str,
    table: FarmTable,
    columns: &[&str],
    values: Vec<Value>,
) -> AppResult<()> {
    let columns = column_list(columns);
    add_row(session, database, table.name(), &values, Some(&columns)).await
}

async fn lookup(
    session: &mut DbSession,
    database: &str,
    table: FarmTable,
    key_column: &str,
    id: i64,
) -> AppResult<Option<Map<String, Value>>> {
    session.use_database(database).await?;
    get_row_by_id(session, table.name(), key_column, &json!(id)).await
}

// DECIMAL columns arrive as text, integer columns may too.

fn field<'a>(row: &'a Map<String, Value>, column: &str) -> AppResult<&'a Value> {
    row.get(column)
        .ok_or_else(|| AppError::Internal(format!("missing column {}", column)))
}

fn int_field(row: &Map<String, Value>, column: &str) -> AppResult<i64> {
    let value = field(row, column)?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| AppError::Internal(format!("column {} is not an integer", column)))
}

fn float_field(row: &Map<String, Value>, column: &str) -> AppResult<f64> {
    let value = field(row, column)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| AppError::Internal(format!("column {} is not a number", column)))
}

fn text_field(row: &Map<String, Value>, column: &str) -> AppResult<String> {
    Ok(match field(row, column)? {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn product_from_row(row: &Map<String, Value>) -> AppResult<Product> {
    Ok(Product {
        product_id: int_field(row, "ProductID")?,
        name: text_field(row, "Name")?,
        category: text_field(row, "Category")?,
        price: float_field(row, "Price")?,
        seasonal_availability: text_field(row, "SeasonalAvailability")?,
    })
}

fn inventory_from_row(row: &Map<String, Value>) -> AppResult<InventoryItem> {
    Ok(InventoryItem {
        inventory_id: int_field(row, "InventoryID")?,
        product_id: int_field(row, "ProductID")?,
        vendor_id: int_field(row, "VendorID")?,
        quantity_in_stock: int_field(row, "QuantityInStock")?,
        restock_threshold: int_field(row, "RestockThreshold")?,
    })
}

pub async fn add_product(session: &mut DbSession, database: &str, product: &Product) -> AppResult<()> {
    product.validate()?;
    insert(session, database, FarmTable::Product, &Product::COLUMNS, product.values()).await?;
    info!(product_id = product.product_id, "Product added");
    Ok(())
}

/// Rewrites every non-key field of the product. Returns the affected count.
pub async fn update_product(
    session: &mut DbSession,
    database: &str,
    product: &Product,
) -> AppResult<u64> {
    product.validate()?;
    update_row(
        session,
        database,
        FarmTable::Product.name(),
        &assignments(&Product::COLUMNS, product.values()),
        "ProductID",
        &json!(product.product_id),
    )
    .await
}

/// Removes a product together with its inventory rows, in one transaction.
pub async fn delete_product(session: &mut DbSession, database: &str, product_id: i64) -> AppResult<u64> {
    let key: &[Value] = &[json!(product_id)];
    session.use_database(database).await?;
    let deleted = session
        .execute_all(&[
            ("DELETE FROM `Inventory` WHERE `ProductID` = ?", key),
            ("DELETE FROM `Product` WHERE `ProductID` = ?", key),
        ])
        .await?;
    info!(product_id, deleted, "Product deleted");
    Ok(deleted)
}

pub async fn get_product(
    session: &mut DbSession,
    database: &str,
    product_id: i64,
) -> AppResult<Option<Product>> {
    lookup(session, database, FarmTable::Product, "ProductID", product_id)
        .await?
        .map(|row| product_from_row(&row))
        .transpose()
}

pub async fn add_inventory(
    session: &mut DbSession,
    database: &str,
    item: &InventoryItem,
) -> AppResult<()> {
    item.validate()?;
    insert(session, database, FarmTable::Inventory, &InventoryItem::COLUMNS, item.values()).await?;
    info!(inventory_id = item.inventory_id, "Stock added");
    Ok(())
}

pub async fn update_inventory(
    session: &mut DbSession,
    database: &str,
    item: &InventoryItem,
) -> AppResult<u64> {
    item.validate()?;
    update_row(
        session,
        database,
        FarmTable::Inventory.name(),
        &assignments(&InventoryItem::COLUMNS, item.values()),
        "InventoryID",
        &json!(item.inventory_id),
    )
    .await
}

pub async fn delete_inventory(
    session: &mut DbSession,
    database: &str,
    inventory_id: i64,
) -> AppResult<u64> {
    crate::ops::delete_row(
        session,
        database,
        FarmTable::Inventory.name(),
        "InventoryID",
        &json!(inventory_id),
    )
    .await
}

pub async fn get_inventory(
    session: &mut DbSession,
    database: &str,
    inventory_id: i64,
) -> AppResult<Option<InventoryItem>> {
    lookup(session, database, FarmTable::Inventory, "InventoryID", inventory_id)
        .await?
        .map(|row| inventory_from_row(&row))
        .transpose()
}

/// Records a sale. Dates before year 1 are refused.
pub async fn record_sale(session: &mut DbSession, database: &str, sale: &Sale) -> AppResult<()> {
    if sale.sale_date.year() < 1 {
        return Err(AppError::Validation(format!(
            "invalid sale date {}",
            sale.sale_date
        )));
    }
    sale.validate()?;
    insert(session, database, FarmTable::Sale, &Sale::COLUMNS, sale.values()).await?;
    info!(sale_id = sale.sale_id, "Sale recorded");
    Ok(())
}

pub async fn add_customer(session: &mut DbSession, database: &str, customer: &Customer) -> AppResult<()> {
    customer.validate()?;
    insert(session, database, FarmTable::Customer, &Customer::COLUMNS, customer.values()).await?;
    info!(customer_id = customer.customer_id, "Customer added");
    Ok(())
}

/// Full contents of one farm table.
pub async fn view(session: &mut DbSession, database: &str, table: FarmTable) -> AppResult<QueryResult> {
    get_table_contents(session, database, table.name()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeServer;
    use chrono::NaiveDate;
    use common::errors::ErrorKind;

    const DB: &str = "farmer_schema";

    fn farm() -> FakeServer {
        FakeServer::new()
            .with_table(
                DB,
                "Product",
                &[
                    ("ProductID", "INT"),
                    ("Name", "VARCHAR(255)"),
                    ("Category", "VARCHAR(255)"),
                    ("Price", "DECIMAL(10,2)"),
                    ("SeasonalAvailability", "VARCHAR(255)"),
                ],
            )
            .with_table(
                DB,
                "Inventory",
                &[
                    ("InventoryID", "INT"),
                    ("ProductID", "INT"),
                    ("VendorID", "INT"),
                    ("QuantityInStock", "INT"),
                    ("RestockThreshold", "INT"),
                ],
            )
            .with_table(
                DB,
                "Sale",
                &[
                    ("SaleID", "INT"),
                    ("VendorID", "INT"),
                    ("ProductID", "INT"),
                    ("CustomerID", "INT"),
                    ("SaleDate", "DATE"),
                    ("QuantitySold", "INT"),
                    ("TotalPrice", "DECIMAL(10,2)"),
                ],
            )
    }

    fn carrots() -> Product {
        Product {
            product_id: 1,
            name: "Carrot".into(),
            category: "Vegetable".into(),
            price: 1.5,
            seasonal_availability: "Autumn".into(),
        }
    }

    fn stock(inventory_id: i64, product_id: i64) -> InventoryItem {
        InventoryItem {
            inventory_id,
            product_id,
            vendor_id: 7,
            quantity_in_stock: 40,
            restock_threshold: 10,
        }
    }

    #[tokio::test]
    async fn test_product_lifecycle() {
        let server = farm();
        let mut session = server.connected_session().await;

        add_product(&mut session, DB, &carrots()).await.unwrap();
        assert_eq!(get_product(&mut session, DB, 1).await.unwrap(), Some(carrots()));

        let mut repriced = carrots();
        repriced.price = 2.0;
        assert_eq!(update_product(&mut session, DB, &repriced).await.unwrap(), 1);
        assert_eq!(get_product(&mut session, DB, 1).await.unwrap(), Some(repriced));

        assert_eq!(get_product(&mut session, DB, 99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_product_decimal_price_as_text() {
        let server = farm().with_row(
            DB,
            "Product",
            vec![json!(3), json!("Kale"), json!("Leafy"), json!("4.25"), json!("Winter")],
        );
        let mut session = server.connected_session().await;

        let product = get_product(&mut session, DB, 3).await.unwrap().unwrap();
        assert_eq!(product.price, 4.25);
    }

    #[tokio::test]
    async fn test_delete_product_removes_inventory() {
        let server = farm();
        let mut session = server.connected_session().await;
        add_product(&mut session, DB, &carrots()).await.unwrap();
        add_inventory(&mut session, DB, &stock(10, 1)).await.unwrap();
        add_inventory(&mut session, DB, &stock(11, 2)).await.unwrap();

        let deleted = delete_product(&mut session, DB, 1).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(server.rows(DB, "Product").is_empty());
        assert_eq!(server.rows(DB, "Inventory").len(), 1);
    }

    #[tokio::test]
    async fn test_inventory_lifecycle() {
        let server = farm();
        let mut session = server.connected_session().await;
        add_inventory(&mut session, DB, &stock(10, 1)).await.unwrap();

        let mut restocked = stock(10, 1);
        restocked.quantity_in_stock = 80;
        update_inventory(&mut session, DB, &restocked).await.unwrap();
        assert_eq!(get_inventory(&mut session, DB, 10).await.unwrap(), Some(restocked));

        assert_eq!(delete_inventory(&mut session, DB, 10).await.unwrap(), 1);
        assert_eq!(get_inventory(&mut session, DB, 10).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_locally() {
        let server = farm();
        let mut session = server.connected_session().await;
        let mut item = stock(10, 1);
        item.quantity_in_stock = -1;

        let err = add_inventory(&mut session, DB, &item).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(server.statements().is_empty());
    }

    #[tokio::test]
    async fn test_record_sale_binds_iso_date() {
        let server = farm();
        let mut session = server.connected_session().await;
        let sale = Sale {
            sale_id: 1,
            vendor_id: 7,
            product_id: 1,
            customer_id: 3,
            sale_date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            quantity_sold: 4,
            total_price: 6.0,
        };

        record_sale(&mut session, DB, &sale).await.unwrap();
        assert_eq!(server.rows(DB, "Sale")[0][4], json!("2024-05-17"));
    }

    #[tokio::test]
    async fn test_record_sale_rejects_year_zero() {
        let server = farm();
        let mut session = server.connected_session().await;
        let sale = Sale {
            sale_id: 1,
            vendor_id: 7,
            product_id: 1,
            customer_id: 3,
            sale_date: NaiveDate::from_ymd_opt(0, 1, 1).unwrap(),
            quantity_sold: 4,
            total_price: 6.0,
        };

        let err = record_sale(&mut session, DB, &sale).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(server.statements().is_empty());
    }

    #[tokio::test]
    async fn test_add_customer_needs_table() {
        let server = farm();
        let mut session = server.connected_session().await;
        let customer = Customer {
            customer_id: 1,
            name: "Ada".into(),
            contact_info: "ada@example.com".into(),
            preferences: "Organic".into(),
        };

        let err = add_customer(&mut session, DB, &customer).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[tokio::test]
    async fn test_view_table() {
        let server = farm();
        let mut session = server.connected_session().await;
        add_product(&mut session, DB, &carrots()).await.unwrap();

        let result = view(&mut session, DB, FarmTable::Product).await.unwrap();
        assert_eq!(result.column_names(), Product::COLUMNS.to_vec());
        assert_eq!(result.row_count(), 1);
    }
}
