//! Derived reporting
//!
//! Dashboard metrics are recomputed from the full item set on every
//! read, never stored, so they stay correct under arbitrary edits and
//! deletes. Data volumes are single-business inventories; O(n) per
//! read is acceptable.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{Item, ItemStatus};
use crate::store::ItemStore;

/// Dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    /// Σ sold (sale − purchase) × quantity
    pub net_profit: Decimal,
    /// Σ sold sale × quantity
    pub total_revenue: Decimal,
    pub units_sold: i64,
    /// Σ in-stock purchase × quantity
    pub stock_value: Decimal,
    pub units_in_stock: i64,
    /// Σ in-stock target sale × quantity, where a target is set
    pub potential_revenue: Decimal,
    pub item_count: i64,
}

/// Flat CSV row for export
#[derive(Debug, Serialize)]
struct ItemCsvRow<'a> {
    id: String,
    product_name: &'a str,
    purchase_price: Decimal,
    sale_price: Option<Decimal>,
    quantity: i32,
    date: String,
    sale_date: Option<String>,
    status: &'static str,
    condition: &'static str,
    batch_ref: Option<&'a str>,
}

/// Reporting service over the item store
#[derive(Clone)]
pub struct ReportingService {
    items: Arc<dyn ItemStore>,
}

impl ReportingService {
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }

    /// Recompute the dashboard from the full item set
    pub async fn dashboard(&self) -> AppResult<DashboardMetrics> {
        let items = self.items.list().await?;
        Ok(compute_dashboard(&items))
    }

    /// Export the full item set as CSV
    pub async fn export_items_csv(&self) -> AppResult<String> {
        let items = self.items.list().await?;
        let rows: Vec<ItemCsvRow> = items
            .iter()
            .map(|item| ItemCsvRow {
                id: item.id.to_string(),
                product_name: &item.product_name,
                purchase_price: item.purchase_price,
                sale_price: item.sale_price,
                quantity: item.quantity,
                date: item.date.to_rfc3339(),
                sale_date: item.sale_date.map(|d| d.to_rfc3339()),
                status: item.status.as_str(),
                condition: item.condition.as_str(),
                batch_ref: item.batch_ref.as_deref(),
            })
            .collect();
        export_to_csv(&rows)
    }
}

/// Aggregate the item set into dashboard metrics
pub fn compute_dashboard(items: &[Item]) -> DashboardMetrics {
    let mut metrics = DashboardMetrics {
        net_profit: Decimal::ZERO,
        total_revenue: Decimal::ZERO,
        units_sold: 0,
        stock_value: Decimal::ZERO,
        units_in_stock: 0,
        potential_revenue: Decimal::ZERO,
        item_count: items.len() as i64,
    };

    for item in items {
        let quantity = Decimal::from(item.quantity);
        match item.status {
            ItemStatus::Sold => {
                let sale_price = item.sale_price.unwrap_or(Decimal::ZERO);
                metrics.total_revenue += sale_price * quantity;
                metrics.net_profit += (sale_price - item.purchase_price) * quantity;
                metrics.units_sold += i64::from(item.quantity);
            }
            ItemStatus::InStock => {
                metrics.stock_value += item.purchase_price * quantity;
                metrics.units_in_stock += i64::from(item.quantity);
                if let Some(target) = item.sale_price {
                    metrics.potential_revenue += target * quantity;
                }
            }
        }
    }

    metrics
}

/// Serialize records as CSV
fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let csv_data = String::from_utf8(
        wtr.into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
    )
    .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
    Ok(csv_data)
}
