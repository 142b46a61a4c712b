//! Purchase batch models
//!
//! A batch is a bulk purchase order paid with a single lump amount and
//! split into line items that are either resold or retained.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemCondition;

/// Per-line-item classification within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Intended for resale
    Sell,
    /// Retained by the purchaser
    Keep,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Sell => "sell",
            Disposition::Keep => "keep",
        }
    }
}

/// A batch line item, transient until the batch is materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingLineItem {
    /// Ephemeral identity, not preserved by the store
    pub id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    /// Pre-allocation unit price from the source order
    pub listed_unit_price: Decimal,
    /// Intended unit sale price; zero if kept
    pub unit_sale_price: Decimal,
    #[serde(default)]
    pub condition: ItemCondition,
    pub disposition: Disposition,
}

/// Batch classification derived from line dispositions, never stored
/// independently of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchType {
    AllSell,
    Mixed,
    AllRetained,
}

impl BatchType {
    /// AllRetained iff zero sell lines, AllSell iff every line sells,
    /// otherwise Mixed.
    pub fn derive(lines: &[PricingLineItem]) -> Self {
        let sell_count = lines
            .iter()
            .filter(|l| l.disposition == Disposition::Sell)
            .count();
        if sell_count == 0 {
            BatchType::AllRetained
        } else if sell_count == lines.len() {
            BatchType::AllSell
        } else {
            BatchType::Mixed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchType::AllSell => "all_sell",
            BatchType::Mixed => "mixed",
            BatchType::AllRetained => "all_retained",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all_sell" => Some(BatchType::AllSell),
            "mixed" => Some(BatchType::Mixed),
            "all_retained" => Some(BatchType::AllRetained),
            _ => None,
        }
    }
}

/// Persisted batch summary, created once when a batch is sent to stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: Uuid,
    /// Human-readable sequential code, e.g. "T-003"
    pub batch_code: String,
    pub batch_type: BatchType,
    pub created_at: DateTime<Utc>,
    pub total_paid: Decimal,
    pub total_sell_revenue: Decimal,
    pub cash_profit: Decimal,
    pub retained_value: Decimal,
    /// Count of all line items, sell and keep
    pub items_count: i32,
    /// Full unrounded line snapshots; may be empty for legacy records
    pub items: Vec<PricingLineItem>,
    pub note: Option<String>,
}

/// Fields for creating a batch record; the store assigns the identity.
/// `created_at` is stamped by the store unless given explicitly (legacy
/// imports preserve the historical creation time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatch {
    pub batch_code: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub batch_type: BatchType,
    pub total_paid: Decimal,
    pub total_sell_revenue: Decimal,
    pub cash_profit: Decimal,
    pub retained_value: Decimal,
    pub items_count: i32,
    pub items: Vec<PricingLineItem>,
    pub note: Option<String>,
}

/// Partial field update for a batch record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
}

/// Side index from item id to batch code, used only to recover batch
/// association for items whose `batch_ref` was never persisted.
/// Not authoritative: an item's own `batch_ref`, when present, wins.
pub type ItemBatchMap = HashMap<Uuid, String>;
