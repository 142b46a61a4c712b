//! Batch materialization and management
//!
//! A priced batch's sell lines become persistent stock lots, merged
//! into a compatible lot when one exists and created otherwise, and the
//! batch summary is persisted alongside. Writes are sequential with no
//! rollback: a failure mid-pass surfaces as a partial-batch error
//! carrying the batch code and the number of writes that succeeded.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    BatchPatch, BatchRecord, BatchType, Disposition, Item, ItemBatchMap, ItemCondition,
    ItemPatch, ItemStatus, NewBatch, NewItem, PricingLineItem,
};
use crate::services::pricing::{price_batch, round_currency, BatchPricing};
use crate::store::{BatchStore, ItemStore, SideCache};
use shared::validation::{validate_price, validate_product_name, validate_quantity};

/// One raw batch line from the client
#[derive(Debug, Clone, Deserialize)]
pub struct BatchLineInput {
    pub product_name: String,
    pub quantity: i32,
    pub listed_unit_price: Decimal,
    /// Zero or absent for kept lines
    #[serde(default)]
    pub unit_sale_price: Decimal,
    #[serde(default)]
    pub condition: ItemCondition,
    pub disposition: Disposition,
}

/// Input for pricing or materializing a batch
#[derive(Debug, Deserialize)]
pub struct BatchInput {
    pub total_paid: Decimal,
    pub line_items: Vec<BatchLineInput>,
    pub note: Option<String>,
}

/// Input for editing a batch record
#[derive(Debug, Deserialize)]
pub struct UpdateBatchInput {
    pub note: Option<String>,
}

/// Result of a materialization: the persisted summary and the stock
/// lots it produced or merged into
#[derive(Debug, Serialize)]
pub struct MaterializeOutcome {
    pub batch: BatchRecord,
    pub items: Vec<Item>,
}

/// Result of a cascade delete
#[derive(Debug, Serialize)]
pub struct DeleteBatchOutcome {
    pub batch_code: String,
    pub items_deleted: usize,
}

/// Batch service: pricing preview, materialization, history, cascade
/// delete
#[derive(Clone)]
pub struct BatchService {
    items: Arc<dyn ItemStore>,
    batches: Arc<dyn BatchStore>,
    cache: Arc<SideCache>,
}

impl BatchService {
    pub fn new(
        items: Arc<dyn ItemStore>,
        batches: Arc<dyn BatchStore>,
        cache: Arc<SideCache>,
    ) -> Self {
        Self {
            items,
            batches,
            cache,
        }
    }

    /// Price a batch without persisting anything
    pub fn preview(&self, input: &BatchInput) -> AppResult<BatchPricing> {
        let lines = validate_lines(input)?;
        Ok(price_batch(input.total_paid, &lines))
    }

    /// Materialize a priced batch: persist the sell lines as stock and
    /// the batch summary, and tag the touched items in the side index.
    pub async fn materialize(&self, input: BatchInput) -> AppResult<MaterializeOutcome> {
        let lines = validate_lines(&input)?;
        let pricing = price_batch(input.total_paid, &lines);

        let seq = self.batches.next_batch_seq().await?;
        let batch_code = format!("T-{:03}", seq);
        let batch_type = BatchType::derive(&lines);

        let snapshot = self.items.list().await?;
        let map = self.cache.item_batch_map().await;

        let mut touched: Vec<Item> = Vec::new();
        let mut writes = 0usize;

        for line in lines.iter().filter(|l| l.disposition == Disposition::Sell) {
            let adjusted_unit_cost = round_currency(line.listed_unit_price * pricing.allocation_factor);

            let result = self
                .write_stock_line(line, adjusted_unit_cost, &batch_code, &snapshot, &map, &mut touched)
                .await;

            if let Err(e) = result {
                return Err(AppError::PartialBatchFailure {
                    batch_code,
                    items_written: writes,
                    source: Box::new(e),
                });
            }
            writes += 1;
        }

        let batch = self
            .batches
            .create(NewBatch {
                batch_code: batch_code.clone(),
                created_at: None,
                batch_type,
                total_paid: input.total_paid,
                total_sell_revenue: pricing.total_sell_revenue,
                cash_profit: pricing.expected_profit,
                retained_value: pricing.retained_value,
                items_count: lines.len() as i32,
                items: lines,
                note: input.note,
            })
            .await
            .map_err(|e| AppError::PartialBatchFailure {
                batch_code: batch_code.clone(),
                items_written: writes,
                source: Box::new(e),
            })?;

        // The side index is tagged even though the item rows carry
        // batch_ref; a cache failure never fails the batch
        let touched_ids: Vec<Uuid> = touched.iter().map(|i| i.id).collect();
        if let Err(e) = self.cache.tag_items(&touched_ids, &batch_code).await {
            tracing::warn!(error = %e, "Side-cache tagging failed for materialized batch");
        }
        self.refresh_history_cache().await;

        tracing::info!(
            batch_code = %batch.batch_code,
            items = touched_ids.len(),
            "Batch materialized"
        );

        Ok(MaterializeOutcome {
            batch,
            items: touched,
        })
    }

    /// Merge one sell line into an existing compatible stock lot, or
    /// create a new lot. Lots created earlier in the same pass are
    /// merge targets too.
    async fn write_stock_line(
        &self,
        line: &PricingLineItem,
        adjusted_unit_cost: Decimal,
        batch_code: &str,
        snapshot: &[Item],
        map: &ItemBatchMap,
        touched: &mut Vec<Item>,
    ) -> AppResult<()> {
        let matches = |item: &Item| {
            item.status == ItemStatus::InStock
                && item.product_name == line.product_name
                && item.condition == line.condition
                && round_currency(item.purchase_price) == adjusted_unit_cost
                && item.resolved_batch_ref(map) == Some(batch_code)
        };

        let this_pass = touched.iter().position(|item| {
            item.status == ItemStatus::InStock
                && item.product_name == line.product_name
                && item.condition == line.condition
                && round_currency(item.purchase_price) == adjusted_unit_cost
                && item.batch_ref.as_deref() == Some(batch_code)
        });

        let existing = this_pass
            .map(|idx| touched[idx].clone())
            .or_else(|| snapshot.iter().find(|item| matches(item)).cloned());

        match existing {
            Some(lot) => {
                // Merge: last write wins on price, condition and tag
                let updated = self
                    .items
                    .update(
                        lot.id,
                        ItemPatch {
                            quantity: Some(lot.quantity + line.quantity),
                            sale_price: Some(Some(line.unit_sale_price)),
                            condition: Some(line.condition),
                            batch_ref: Some(Some(batch_code.to_string())),
                            ..Default::default()
                        },
                    )
                    .await?;
                match this_pass {
                    Some(idx) => touched[idx] = updated,
                    None => touched.push(updated),
                }
            }
            None => {
                let created = self
                    .items
                    .create(NewItem {
                        product_name: line.product_name.clone(),
                        purchase_price: adjusted_unit_cost,
                        sale_price: Some(line.unit_sale_price),
                        quantity: line.quantity,
                        date: Utc::now(),
                        sale_date: None,
                        status: ItemStatus::InStock,
                        condition: line.condition,
                        batch_ref: Some(batch_code.to_string()),
                    })
                    .await?;
                touched.push(created);
            }
        }
        Ok(())
    }

    /// Batch history, newest first. Falls back to the cached snapshot
    /// when the primary store is unreachable.
    pub async fn list(&self) -> AppResult<Vec<BatchRecord>> {
        match self.batches.list().await {
            Ok(batches) => {
                if let Err(e) = self.cache.put_history(batches.clone()).await {
                    tracing::warn!(error = %e, "Batch history cache refresh failed");
                }
                Ok(batches)
            }
            Err(e) => {
                let cached = self.cache.cached_history().await;
                if cached.is_empty() {
                    return Err(e);
                }
                tracing::warn!(error = %e, "Batch store unavailable, serving cached history");
                Ok(cached)
            }
        }
    }

    /// Edit a batch record's note
    pub async fn update(&self, id: Uuid, input: UpdateBatchInput) -> AppResult<BatchRecord> {
        self.batches
            .update(
                id,
                BatchPatch {
                    note: Some(input.note),
                },
            )
            .await
    }

    /// Delete a batch and cascade to every item whose resolved batch
    /// reference equals its code.
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteBatchOutcome> {
        let batch = self
            .batches
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        let map = self.cache.item_batch_map().await;
        let doomed: Vec<Uuid> = self
            .items
            .list()
            .await?
            .into_iter()
            .filter(|item| item.resolved_batch_ref(&map) == Some(batch.batch_code.as_str()))
            .map(|item| item.id)
            .collect();

        for item_id in &doomed {
            self.items.delete(*item_id).await?;
        }
        self.batches.delete(id).await?;

        if let Err(e) = self.cache.remove_batch(&batch.batch_code).await {
            tracing::warn!(error = %e, "Side-cache cleanup failed for deleted batch");
        }
        self.refresh_history_cache().await;

        tracing::info!(
            batch_code = %batch.batch_code,
            items_deleted = doomed.len(),
            "Batch deleted with cascade"
        );

        Ok(DeleteBatchOutcome {
            batch_code: batch.batch_code,
            items_deleted: doomed.len(),
        })
    }

    async fn refresh_history_cache(&self) {
        match self.batches.list().await {
            Ok(history) => {
                if let Err(e) = self.cache.put_history(history).await {
                    tracing::warn!(error = %e, "Batch history cache refresh failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Batch history cache refresh failed"),
        }
    }
}

/// Validate the raw lines and assign their ephemeral identities.
/// Allocation itself accepts any numbers; the service is the caller
/// that enforces non-negativity.
fn validate_lines(input: &BatchInput) -> AppResult<Vec<PricingLineItem>> {
    if input.line_items.is_empty() {
        return Err(AppError::validation(
            "line_items",
            "Batch must contain at least one line item",
        ));
    }
    validate_price(input.total_paid).map_err(|msg| AppError::validation("total_paid", msg))?;

    let mut lines = Vec::with_capacity(input.line_items.len());
    for line in &input.line_items {
        validate_product_name(&line.product_name)
            .map_err(|msg| AppError::validation("product_name", msg))?;
        validate_quantity(line.quantity).map_err(|msg| AppError::validation("quantity", msg))?;
        validate_price(line.listed_unit_price)
            .map_err(|msg| AppError::validation("listed_unit_price", msg))?;
        validate_price(line.unit_sale_price)
            .map_err(|msg| AppError::validation("unit_sale_price", msg))?;

        lines.push(PricingLineItem {
            id: Uuid::new_v4(),
            product_name: line.product_name.trim().to_string(),
            quantity: line.quantity,
            listed_unit_price: line.listed_unit_price,
            unit_sale_price: line.unit_sale_price,
            condition: line.condition,
            disposition: line.disposition,
        });
    }
    Ok(lines)
}
