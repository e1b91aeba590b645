//! Product rows and the inventory table's column set.
use std::path::Path;

use chrono::NaiveDate;
use eyre::{Context, Result};
use libstockroom::dates::DateParser;
use libstockroom::{
    CellValue, ColumnDefinition, ColumnId, SearchTargets, SearchType, TableRecord, TableRowId,
};
use serde::Deserialize;
use tracing::warn;

pub const STATUS_OPTIONS: [&str; 5] = ["Active", "Inactive", "Low stock", "Pending", "Discontinued"];

/// A product as stored in the JSON export.
#[derive(Debug, Clone, Deserialize)]
struct RawProduct {
    id: u64,
    name: String,
    sku: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    supplier_email: Option<String>,
    price: f64,
    quantity: i64,
    status: String,
    #[serde(default)]
    received: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub supplier_email: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub status: String,
    pub received: Option<NaiveDate>,
}

impl TableRecord for Product {
    fn row_id(&self) -> TableRowId {
        TableRowId(self.id)
    }
}

impl Product {
    fn from_raw(raw: RawProduct, dates: &DateParser) -> Self {
        let received = raw.received.as_deref().and_then(|text| {
            let day = dates.parse(text);
            if day.is_none() {
                warn!("Product {} has unreadable received date '{text}'", raw.id);
            }
            day
        });
        Self {
            id: raw.id,
            name: raw.name,
            sku: raw.sku,
            category: raw.category,
            supplier_email: raw.supplier_email,
            price: raw.price,
            quantity: raw.quantity,
            status: raw.status,
            received,
        }
    }
}

pub fn parse_products(json: &str, dates: &DateParser) -> Result<Vec<Product>> {
    let raw: Vec<RawProduct> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|raw| Product::from_raw(raw, dates))
        .collect())
}

pub fn load_products(path: &Path, dates: &DateParser) -> Result<Vec<Product>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read products from {}", path.display()))?;
    parse_products(&json, dates)
        .with_context(|| format!("Failed to parse products in {}", path.display()))
}

pub fn columns() -> Vec<ColumnDefinition<Product>> {
    vec![
        ColumnDefinition::new("id", "ID", |p: &Product| CellValue::Number(p.id as f64))
            .search_type(SearchType::Number),
        ColumnDefinition::new("name", "Name", |p: &Product| p.name.clone().into()),
        ColumnDefinition::new("sku", "SKU", |p: &Product| p.sku.clone().into()),
        ColumnDefinition::new("category", "Category", |p: &Product| p.category.clone().into())
            .search_type(SearchType::Select),
        ColumnDefinition::new("supplier", "Supplier", |p: &Product| {
            p.supplier_email.clone().into()
        })
        .search_type(SearchType::Email),
        ColumnDefinition::new("price", "Price", |p: &Product| p.price.into())
            .search_type(SearchType::Number),
        ColumnDefinition::new("quantity", "Qty", |p: &Product| p.quantity.into())
            .search_type(SearchType::Number),
        ColumnDefinition::new("status", "Status", |p: &Product| p.status.clone().into())
            .search_type(SearchType::Select)
            .options(STATUS_OPTIONS),
        ColumnDefinition::new("received", "Received", |p: &Product| p.received.into())
            .search_type(SearchType::Date),
    ]
}

/// Global search fans out to one column per tier.
pub fn search_targets() -> SearchTargets {
    SearchTargets {
        date_columns: vec![ColumnId::from("received")],
        numeric_columns: vec![ColumnId::from("quantity")],
        email_column: Some(ColumnId::from("supplier")),
        text_columns: vec![ColumnId::from("name")],
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn parses_export_and_tolerates_bad_dates() {
        let json = r#"[
            {"id": 1, "name": "Hinge", "sku": "HG-1", "price": 2.5, "quantity": 4,
             "status": "Active", "received": "2024-03-05"},
            {"id": 2, "name": "Anchor", "sku": "AN-2", "category": "Fasteners",
             "supplier_email": "ops@acme.io", "price": 0.1, "quantity": 0,
             "status": "Inactive", "received": "soon"}
        ]"#;
        let products = parse_products(json, &DateParser::default()).expect("valid json");

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].received, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(products[0].category, None);
        assert_eq!(products[1].received, None);
        assert_eq!(products[1].supplier_email.as_deref(), Some("ops@acme.io"));
    }

    #[test]
    fn malformed_export_is_an_error() {
        assert!(parse_products("{\"id\": 1}", &DateParser::default()).is_err());
    }

    #[test]
    fn search_targets_name_real_columns() {
        let columns = columns();
        let targets = search_targets();
        for id in targets.managed_columns() {
            assert!(columns.iter().any(|column| &column.id == id), "{id}");
        }
    }
}
