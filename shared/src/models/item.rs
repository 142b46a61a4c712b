//! Inventory and sale item models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemBatchMap;

/// Lifecycle status of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    InStock,
    Sold,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::InStock => "in_stock",
            ItemStatus::Sold => "sold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_stock" => Some(ItemStatus::InStock),
            "sold" => Some(ItemStatus::Sold),
            _ => None,
        }
    }
}

/// Physical condition of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    #[default]
    New,
    LightlyUsed,
    Used,
}

impl ItemCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::New => "new",
            ItemCondition::LightlyUsed => "lightly_used",
            ItemCondition::Used => "used",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ItemCondition::New),
            "lightly_used" => Some(ItemCondition::LightlyUsed),
            "used" => Some(ItemCondition::Used),
            _ => None,
        }
    }
}

/// A persisted record representing either inventory on hand or a completed sale.
///
/// Invariant: `sale_date` is present iff `status == Sold`, and `quantity >= 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub product_name: String,
    /// Unit cost
    pub purchase_price: Decimal,
    /// Unit sale price; present once sold or once a target price is set
    pub sale_price: Option<Decimal>,
    pub quantity: i32,
    /// Acquisition date
    pub date: DateTime<Utc>,
    pub sale_date: Option<DateTime<Utc>>,
    pub status: ItemStatus,
    pub condition: ItemCondition,
    /// Code of the batch that produced this item, when known
    pub batch_ref: Option<String>,
}

impl Item {
    /// Resolve the item's batch association. The item's own `batch_ref`
    /// always wins; the side map is a lookup aid only.
    pub fn resolved_batch_ref<'a>(&'a self, map: &'a ItemBatchMap) -> Option<&'a str> {
        self.batch_ref
            .as_deref()
            .or_else(|| map.get(&self.id).map(String::as_str))
    }
}

/// Fields for creating an item; the store assigns the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
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

/// Partial field update for an item. `None` leaves a field untouched;
/// the double-`Option` fields distinguish "clear" from "keep".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub product_name: Option<String>,
    pub purchase_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Option<Decimal>>,
    pub quantity: Option<i32>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<ItemStatus>,
    pub condition: Option<ItemCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_ref: Option<Option<String>>,
}

impl ItemPatch {
    /// Apply the patch to an item, last-write-wins at the field level.
    pub fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.product_name {
            item.product_name = name.clone();
        }
        if let Some(price) = self.purchase_price {
            item.purchase_price = price;
        }
        if let Some(sale_price) = &self.sale_price {
            item.sale_price = *sale_price;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(date) = self.date {
            item.date = date;
        }
        if let Some(sale_date) = &self.sale_date {
            item.sale_date = *sale_date;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(condition) = self.condition {
            item.condition = condition;
        }
        if let Some(batch_ref) = &self.batch_ref {
            item.batch_ref = batch_ref.clone();
        }
    }
}
