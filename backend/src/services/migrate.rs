//! Legacy data migration
//!
//! One-time importer that moves client-local records into the
//! persistent store. Client-local identities are not carried over (the
//! store assigns fresh ones), so batch association for imported stock
//! is recovered afterwards by the reconciler.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{
    BatchType, ItemCondition, ItemStatus, NewBatch, NewItem, PricingLineItem,
};
use crate::store::{BatchStore, ItemStore};
use shared::validation::{
    validate_batch_code, validate_price, validate_product_name, validate_quantity,
};

/// A client-local item record. The local id is accepted and discarded.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyItem {
    #[serde(default)]
    pub local_id: Option<String>,
    pub product_name: String,
    pub purchase_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub quantity: i32,
    pub date: DateTime<Utc>,
    pub sale_date: Option<DateTime<Utc>>,
    pub status: ItemStatus,
    #[serde(default)]
    pub condition: ItemCondition,
    pub batch_ref: Option<String>,
}

/// A client-local batch summary. Line snapshots may be missing
/// entirely on old records.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBatch {
    pub batch_code: String,
    pub created_at: DateTime<Utc>,
    pub total_paid: Decimal,
    pub total_sell_revenue: Decimal,
    pub cash_profit: Decimal,
    pub retained_value: Decimal,
    pub items_count: i32,
    #[serde(default)]
    pub items: Vec<PricingLineItem>,
    pub note: Option<String>,
}

/// Full legacy export payload
#[derive(Debug, Deserialize)]
pub struct LegacyImportInput {
    #[serde(default)]
    pub items: Vec<LegacyItem>,
    #[serde(default)]
    pub batches: Vec<LegacyBatch>,
}

/// Import counts reported back to the caller
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub items_imported: usize,
    pub batches_imported: usize,
    /// Batches whose code already exists in the store
    pub batches_skipped: usize,
}

/// Legacy import service
#[derive(Clone)]
pub struct MigrationService {
    items: Arc<dyn ItemStore>,
    batches: Arc<dyn BatchStore>,
}

impl MigrationService {
    pub fn new(items: Arc<dyn ItemStore>, batches: Arc<dyn BatchStore>) -> Self {
        Self { items, batches }
    }

    /// Import a legacy export. Batches with an already-stored code are
    /// skipped, so re-running a failed import does not duplicate them;
    /// items are always appended.
    pub async fn import(&self, input: LegacyImportInput) -> AppResult<ImportSummary> {
        let new_items = input
            .items
            .into_iter()
            .map(convert_item)
            .collect::<AppResult<Vec<NewItem>>>()?;
        for batch in &input.batches {
            validate_batch_code(&batch.batch_code)
                .map_err(|msg| AppError::validation("batch_code", msg))?;
        }

        let existing_codes: HashSet<String> = self
            .batches
            .list()
            .await?
            .into_iter()
            .map(|b| b.batch_code)
            .collect();

        let items_imported = self.items.create_many(new_items).await?.len();

        let mut batches_imported = 0;
        let mut batches_skipped = 0;
        for batch in input.batches {
            if existing_codes.contains(&batch.batch_code) {
                batches_skipped += 1;
                continue;
            }
            let batch_type = BatchType::derive(&batch.items);
            self.batches
                .create(NewBatch {
                    batch_code: batch.batch_code,
                    created_at: Some(batch.created_at),
                    batch_type,
                    total_paid: batch.total_paid,
                    total_sell_revenue: batch.total_sell_revenue,
                    cash_profit: batch.cash_profit,
                    retained_value: batch.retained_value,
                    items_count: batch.items_count,
                    items: batch.items,
                    note: batch.note,
                })
                .await?;
            batches_imported += 1;
        }

        tracing::info!(
            items = items_imported,
            batches = batches_imported,
            skipped = batches_skipped,
            "Legacy import finished"
        );

        Ok(ImportSummary {
            items_imported,
            batches_imported,
            batches_skipped,
        })
    }
}

/// Validate a legacy item and map it onto the store's create shape,
/// normalizing the sale-date invariant along the way.
fn convert_item(legacy: LegacyItem) -> AppResult<NewItem> {
    validate_product_name(&legacy.product_name)
        .map_err(|msg| AppError::validation("product_name", msg))?;
    validate_price(legacy.purchase_price)
        .map_err(|msg| AppError::validation("purchase_price", msg))?;
    if let Some(price) = legacy.sale_price {
        validate_price(price).map_err(|msg| AppError::validation("sale_price", msg))?;
    }
    validate_quantity(legacy.quantity).map_err(|msg| AppError::validation("quantity", msg))?;

    // sale_date present iff sold
    let sale_date = match legacy.status {
        ItemStatus::Sold => Some(legacy.sale_date.unwrap_or(legacy.date)),
        ItemStatus::InStock => None,
    };

    Ok(NewItem {
        product_name: legacy.product_name.trim().to_string(),
        purchase_price: legacy.purchase_price,
        sale_price: legacy.sale_price,
        quantity: legacy.quantity,
        date: legacy.date,
        sale_date,
        status: legacy.status,
        condition: legacy.condition,
        batch_ref: legacy.batch_ref,
    })
}
