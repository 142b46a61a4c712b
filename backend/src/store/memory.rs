//! In-memory store adapter
//!
//! Backs the test suite and the no-database demo mode. State lives for
//! the lifetime of the process; ordering matches the Postgres adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{BatchPatch, BatchRecord, Item, ItemPatch, NewBatch, NewItem};
use crate::store::{BatchStore, ItemStore};

#[derive(Default)]
struct Inner {
    items: HashMap<Uuid, Item>,
    batches: HashMap<Uuid, BatchRecord>,
    batch_seq: i64,
}

/// Item and batch store held in process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Item>> {
        let inner = self.inner.read().await;
        let mut items: Vec<Item> = inner.items.values().cloned().collect();
        items.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Item>> {
        let inner = self.inner.read().await;
        Ok(inner.items.get(&id).cloned())
    }

    async fn create(&self, new: NewItem) -> AppResult<Item> {
        let item = Item {
            id: Uuid::new_v4(),
            product_name: new.product_name,
            purchase_price: new.purchase_price,
            sale_price: new.sale_price,
            quantity: new.quantity,
            date: new.date,
            sale_date: new.sale_date,
            status: new.status,
            condition: new.condition,
            batch_ref: new.batch_ref,
        };
        let mut inner = self.inner.write().await;
        inner.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn create_many(&self, new: Vec<NewItem>) -> AppResult<Vec<Item>> {
        let mut created = Vec::with_capacity(new.len());
        for item in new {
            created.push(ItemStore::create(self, item).await?);
        }
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: ItemPatch) -> AppResult<Item> {
        let mut inner = self.inner.write().await;
        let item = inner
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        patch.apply(item);
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<BatchRecord>> {
        let inner = self.inner.read().await;
        let mut batches: Vec<BatchRecord> = inner.batches.values().cloned().collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(batches)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<BatchRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.batches.get(&id).cloned())
    }

    async fn create(&self, new: NewBatch) -> AppResult<BatchRecord> {
        let batch = BatchRecord {
            id: Uuid::new_v4(),
            batch_code: new.batch_code,
            batch_type: new.batch_type,
            created_at: new.created_at.unwrap_or_else(Utc::now),
            total_paid: new.total_paid,
            total_sell_revenue: new.total_sell_revenue,
            cash_profit: new.cash_profit,
            retained_value: new.retained_value,
            items_count: new.items_count,
            items: new.items,
            note: new.note,
        };
        let mut inner = self.inner.write().await;
        inner.batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn update(&self, id: Uuid, patch: BatchPatch) -> AppResult<BatchRecord> {
        let mut inner = self.inner.write().await;
        let batch = inner
            .batches
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;
        if let Some(note) = patch.note {
            batch.note = note;
        }
        Ok(batch.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .batches
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))
    }

    async fn next_batch_seq(&self) -> AppResult<i64> {
        let mut inner = self.inner.write().await;
        // Never reissue a sequence value below an already-stored code
        let highest = inner
            .batches
            .values()
            .filter_map(|b| b.batch_code.strip_prefix("T-"))
            .filter_map(|digits| digits.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        inner.batch_seq = inner.batch_seq.max(highest) + 1;
        Ok(inner.batch_seq)
    }
}
