//! Batch reconciliation
//!
//! Earlier schema versions had no `batch_ref` column, so historical
//! batches could not tag the stock they produced. This pass backfills
//! those associations by fuzzy-matching untagged in-stock items against
//! historical sell lines. Best-effort and idempotent: it only fills
//! gaps, never overwrites an item's own tag, and an ambiguous item is
//! silently left untagged.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{BatchRecord, Disposition, Item, ItemBatchMap, ItemStatus};
use crate::services::pricing::round_currency;
use crate::store::{BatchStore, ItemStore, SideCache};

/// Case- and whitespace-insensitive name form used for matching:
/// trimmed, inner whitespace collapsed, lowercased.
pub fn normalize_product_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Match untagged in-stock items to historical batches.
///
/// Returns the updated map only if at least one new tag was assigned;
/// `None` means "no change" and the caller skips persisting.
pub fn reconcile(
    inventory_items: &[Item],
    batch_history: &[BatchRecord],
    current_map: &ItemBatchMap,
) -> Option<ItemBatchMap> {
    if inventory_items.is_empty() || batch_history.is_empty() {
        return None;
    }

    // Untagged candidate pool: in stock, no explicit tag, no map entry
    let pool: Vec<&Item> = inventory_items
        .iter()
        .filter(|item| {
            item.status == ItemStatus::InStock
                && item.batch_ref.is_none()
                && !current_map.contains_key(&item.id)
        })
        .collect();

    let mut history: Vec<&BatchRecord> = batch_history.iter().collect();
    history.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut consumed: HashSet<Uuid> = HashSet::new();
    let mut new_tags: Vec<(Uuid, String)> = Vec::new();

    for batch in history {
        let sell_lines = batch
            .items
            .iter()
            .filter(|line| line.disposition == Disposition::Sell);

        for line in sell_lines {
            let line_name = normalize_product_name(&line.product_name);
            let line_price = round_currency(line.unit_sale_price);

            let best = pool
                .iter()
                .filter(|item| {
                    !consumed.contains(&item.id)
                        && item.condition == line.condition
                        && normalize_product_name(&item.product_name) == line_name
                })
                .min_by_key(|item| {
                    // Tie-break priority: exact rounded sale-price match,
                    // then quantity distance, then time distance
                    let price_mismatch = match item.sale_price {
                        Some(price) if round_currency(price) == line_price => 0u8,
                        _ => 1,
                    };
                    let quantity_distance = i64::from((item.quantity - line.quantity).abs());
                    let time_distance = (item.date - batch.created_at).num_seconds().abs();
                    (price_mismatch, quantity_distance, time_distance)
                });

            if let Some(item) = best {
                consumed.insert(item.id);
                new_tags.push((item.id, batch.batch_code.clone()));
            }
        }
    }

    if new_tags.is_empty() {
        return None;
    }

    let mut updated = current_map.clone();
    updated.extend(new_tags);
    Some(updated)
}

/// Runs the reconciliation pass against the stores and side-cache.
/// Invoked opportunistically on inventory load while the legacy
/// capability flag is on.
#[derive(Clone)]
pub struct ReconcileService {
    items: Arc<dyn ItemStore>,
    batches: Arc<dyn BatchStore>,
    cache: Arc<SideCache>,
}

impl ReconcileService {
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

    /// Run one pass. Returns the number of newly tagged items.
    pub async fn run(&self) -> AppResult<usize> {
        let inventory = self.items.list().await?;

        // Fall back to the cached history when the primary store fails
        let history = match self.batches.list().await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(error = %e, "Batch store unavailable, reconciling against cached history");
                self.cache.cached_history().await
            }
        };

        let current_map = self.cache.item_batch_map().await;
        let Some(updated) = reconcile(&inventory, &history, &current_map) else {
            return Ok(0);
        };

        let added = updated.len() - current_map.len();
        self.cache.put_item_batch_map(updated).await?;
        tracing::info!(tagged = added, "Reconciled untagged stock against batch history");
        Ok(added)
    }
}
