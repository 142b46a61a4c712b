//! Item lifecycle management
//!
//! Items move between in-stock and sold; there is no terminal state,
//! a lot is simply deleted when its quantity is exhausted. Selling part of a
//! lot splits it: the stock lot shrinks and a new sold record captures
//! the sale. Returns merge back into a compatible lot when one exists.
//! Every mutation is validated before any write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Item, ItemCondition, ItemPatch, ItemStatus, NewItem};
use crate::store::{ItemStore, SideCache};
use shared::validation::{validate_price, validate_product_name, validate_quantity};

/// Input for creating an item directly (in stock or already sold)
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub product_name: String,
    pub purchase_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub quantity: i32,
    pub date: Option<DateTime<Utc>>,
    pub sale_date: Option<DateTime<Utc>>,
    pub status: Option<ItemStatus>,
    pub condition: Option<ItemCondition>,
    pub batch_ref: Option<String>,
}

/// Input for selling all or part of a stock lot
#[derive(Debug, Deserialize)]
pub struct SellItemInput {
    pub quantity: i32,
    pub unit_sale_price: Decimal,
    pub sale_date: Option<DateTime<Utc>>,
}

/// Input for returning a sold item to stock
#[derive(Debug, Deserialize, Default)]
pub struct ReturnItemInput {
    /// New target sale price for the restocked lot, if the caller
    /// wants to adjust it
    pub sale_price: Option<Decimal>,
}

/// Field-level edit; leaves status and identity untouched
#[derive(Debug, Deserialize, Default)]
pub struct UpdateItemInput {
    pub product_name: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub date: Option<DateTime<Utc>>,
    pub condition: Option<ItemCondition>,
}

/// Result of a sale: the new sold record, and the source lot when a
/// partial sale left stock behind
#[derive(Debug, Serialize)]
pub struct SaleOutcome {
    pub sold: Item,
    pub remaining: Option<Item>,
}

/// Item service governing status transitions and edits
#[derive(Clone)]
pub struct ItemService {
    items: Arc<dyn ItemStore>,
    cache: Arc<SideCache>,
}

impl ItemService {
    pub fn new(items: Arc<dyn ItemStore>, cache: Arc<SideCache>) -> Self {
        Self { items, cache }
    }

    /// List all items
    pub async fn list(&self) -> AppResult<Vec<Item>> {
        self.items.list().await
    }

    /// Create an item in stock, or record a past sale directly
    pub async fn create(&self, input: CreateItemInput) -> AppResult<Item> {
        validate_product_name(&input.product_name)
            .map_err(|msg| AppError::validation("product_name", msg))?;
        validate_price(input.purchase_price)
            .map_err(|msg| AppError::validation("purchase_price", msg))?;
        if let Some(price) = input.sale_price {
            validate_price(price).map_err(|msg| AppError::validation("sale_price", msg))?;
        }
        validate_quantity(input.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;

        let status = input.status.unwrap_or(ItemStatus::InStock);
        let date = input.date.unwrap_or_else(Utc::now);
        // sale_date present iff sold
        let sale_date = match status {
            ItemStatus::Sold => Some(input.sale_date.unwrap_or(date)),
            ItemStatus::InStock => None,
        };

        self.items
            .create(NewItem {
                product_name: input.product_name.trim().to_string(),
                purchase_price: input.purchase_price,
                sale_price: input.sale_price,
                quantity: input.quantity,
                date,
                sale_date,
                status,
                condition: input.condition.unwrap_or_default(),
                batch_ref: input.batch_ref,
            })
            .await
    }

    /// Sell `input.quantity` units out of a stock lot.
    ///
    /// Creates a new sold record carrying the lot's name, cost,
    /// condition and batch tag; the source lot is deleted on a full
    /// sale or decremented in place on a partial one.
    pub async fn sell(&self, id: Uuid, input: SellItemInput) -> AppResult<SaleOutcome> {
        let item = self
            .items
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        if item.status != ItemStatus::InStock {
            return Err(AppError::validation("status", "Item is not in stock"));
        }
        validate_quantity(input.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;
        if input.quantity > item.quantity {
            return Err(AppError::InsufficientStock(format!(
                "Cannot sell {} of '{}'; only {} in stock",
                input.quantity, item.product_name, item.quantity
            )));
        }
        validate_price(input.unit_sale_price)
            .map_err(|msg| AppError::validation("unit_sale_price", msg))?;

        let sold = self
            .items
            .create(NewItem {
                product_name: item.product_name.clone(),
                purchase_price: item.purchase_price,
                sale_price: Some(input.unit_sale_price),
                quantity: input.quantity,
                date: item.date,
                sale_date: Some(input.sale_date.unwrap_or_else(Utc::now)),
                status: ItemStatus::Sold,
                condition: item.condition,
                batch_ref: item.batch_ref.clone(),
            })
            .await?;

        // Carry a map-only batch association over to the sold record
        if item.batch_ref.is_none() {
            let map = self.cache.item_batch_map().await;
            if let Some(code) = map.get(&item.id).cloned() {
                if let Err(e) = self.cache.tag_items(&[sold.id], &code).await {
                    tracing::warn!(error = %e, "Side-cache tag failed for sold item");
                }
            }
        }

        let remaining = if input.quantity == item.quantity {
            self.items.delete(item.id).await?;
            if let Err(e) = self.cache.remove_items(&[item.id]).await {
                tracing::warn!(error = %e, "Side-cache cleanup failed for sold-out lot");
            }
            None
        } else {
            let updated = self
                .items
                .update(
                    item.id,
                    ItemPatch {
                        quantity: Some(item.quantity - input.quantity),
                        ..Default::default()
                    },
                )
                .await?;
            Some(updated)
        };

        Ok(SaleOutcome { sold, remaining })
    }

    /// Return a sold item to stock.
    ///
    /// Merges into an existing compatible lot (same name, cost,
    /// condition and resolved batch tag) when one exists; otherwise the
    /// sold record itself converts back to in-stock.
    pub async fn return_to_stock(&self, id: Uuid, input: ReturnItemInput) -> AppResult<Item> {
        let item = self
            .items
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        if item.status != ItemStatus::Sold {
            return Err(AppError::validation("status", "Item is not sold"));
        }
        if let Some(price) = input.sale_price {
            validate_price(price).map_err(|msg| AppError::validation("sale_price", msg))?;
        }

        let map = self.cache.item_batch_map().await;
        let resolved_ref = item.resolved_batch_ref(&map).map(str::to_string);

        let existing_lot = self.items.list().await?.into_iter().find(|candidate| {
            candidate.id != item.id
                && candidate.status == ItemStatus::InStock
                && candidate.product_name == item.product_name
                && candidate.purchase_price == item.purchase_price
                && candidate.condition == item.condition
                && candidate.resolved_batch_ref(&map).map(str::to_string) == resolved_ref
        });

        match existing_lot {
            Some(lot) => {
                let merged = self
                    .items
                    .update(
                        lot.id,
                        ItemPatch {
                            quantity: Some(lot.quantity + item.quantity),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.items.delete(item.id).await?;
                if let Err(e) = self.cache.remove_items(&[item.id]).await {
                    tracing::warn!(error = %e, "Side-cache cleanup failed for returned item");
                }
                Ok(merged)
            }
            None => {
                self.items
                    .update(
                        item.id,
                        ItemPatch {
                            status: Some(ItemStatus::InStock),
                            sale_date: Some(None),
                            sale_price: input.sale_price.map(Some),
                            ..Default::default()
                        },
                    )
                    .await
            }
        }
    }

    /// Field-level edit of an item in either state
    pub async fn update(&self, id: Uuid, input: UpdateItemInput) -> AppResult<Item> {
        if let Some(name) = &input.product_name {
            validate_product_name(name).map_err(|msg| AppError::validation("product_name", msg))?;
        }
        if let Some(price) = input.purchase_price {
            validate_price(price).map_err(|msg| AppError::validation("purchase_price", msg))?;
        }
        if let Some(price) = input.sale_price {
            validate_price(price).map_err(|msg| AppError::validation("sale_price", msg))?;
        }
        if let Some(quantity) = input.quantity {
            validate_quantity(quantity).map_err(|msg| AppError::validation("quantity", msg))?;
        }

        self.items
            .update(
                id,
                ItemPatch {
                    product_name: input.product_name.map(|n| n.trim().to_string()),
                    purchase_price: input.purchase_price,
                    sale_price: input.sale_price.map(Some),
                    quantity: input.quantity,
                    date: input.date,
                    condition: input.condition,
                    ..Default::default()
                },
            )
            .await
    }

    /// Delete an item explicitly
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.items.delete(id).await?;
        if let Err(e) = self.cache.remove_items(&[id]).await {
            tracing::warn!(error = %e, "Side-cache cleanup failed for deleted item");
        }
        Ok(())
    }
}
