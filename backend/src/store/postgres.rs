//! PostgreSQL adapters for the item and batch stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    BatchPatch, BatchRecord, BatchType, Item, ItemCondition, ItemPatch, ItemStatus, NewBatch,
    NewItem, PricingLineItem,
};
use crate::store::{BatchStore, ItemStore};

type ItemRow = (
    Uuid,
    String,
    Decimal,
    Option<Decimal>,
    i32,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    String,
    String,
    Option<String>,
);

type BatchRow = (
    Uuid,
    String,
    String,
    DateTime<Utc>,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    i32,
    serde_json::Value,
    Option<String>,
);

const ITEM_COLUMNS: &str = "id, product_name, purchase_price, sale_price, quantity, date, \
     sale_date, status, condition, batch_ref";

const BATCH_COLUMNS: &str = "id, batch_code, batch_type, created_at, total_paid, \
     total_sell_revenue, cash_profit, retained_value, items_count, items, note";

fn item_from_row(row: ItemRow) -> AppResult<Item> {
    let status = ItemStatus::from_str(&row.7)
        .ok_or_else(|| AppError::Internal(format!("Unknown item status '{}'", row.7)))?;
    let condition = ItemCondition::from_str(&row.8)
        .ok_or_else(|| AppError::Internal(format!("Unknown item condition '{}'", row.8)))?;

    Ok(Item {
        id: row.0,
        product_name: row.1,
        purchase_price: row.2,
        sale_price: row.3,
        quantity: row.4,
        date: row.5,
        sale_date: row.6,
        status,
        condition,
        batch_ref: row.9,
    })
}

fn batch_from_row(row: BatchRow) -> AppResult<BatchRecord> {
    let batch_type = BatchType::from_str(&row.2)
        .ok_or_else(|| AppError::Internal(format!("Unknown batch type '{}'", row.2)))?;
    let items: Vec<PricingLineItem> = serde_json::from_value(row.9)
        .map_err(|e| AppError::Internal(format!("Corrupt batch line items: {}", e)))?;

    Ok(BatchRecord {
        id: row.0,
        batch_code: row.1,
        batch_type,
        created_at: row.3,
        total_paid: row.4,
        total_sell_revenue: row.5,
        cash_profit: row.6,
        retained_value: row.7,
        items_count: row.8,
        items,
        note: row.10,
    })
}

/// Item store backed by the `items` table
#[derive(Clone)]
pub struct PgItemStore {
    db: PgPool,
}

impl PgItemStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn list(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items ORDER BY date DESC, id",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(item_from_row).collect()
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(item_from_row).transpose()
    }

    async fn create(&self, new: NewItem) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO items (product_name, purchase_price, sale_price, quantity, date,
                               sale_date, status, condition, batch_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&new.product_name)
        .bind(new.purchase_price)
        .bind(new.sale_price)
        .bind(new.quantity)
        .bind(new.date)
        .bind(new.sale_date)
        .bind(new.status.as_str())
        .bind(new.condition.as_str())
        .bind(&new.batch_ref)
        .fetch_one(&self.db)
        .await?;

        item_from_row(row)
    }

    async fn create_many(&self, new: Vec<NewItem>) -> AppResult<Vec<Item>> {
        let mut created = Vec::with_capacity(new.len());
        for item in new {
            created.push(self.create(item).await?);
        }
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: ItemPatch) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let mut item = item_from_row(row)?;
        patch.apply(&mut item);

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE items
            SET product_name = $1, purchase_price = $2, sale_price = $3, quantity = $4,
                date = $5, sale_date = $6, status = $7, condition = $8, batch_ref = $9
            WHERE id = $10
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&item.product_name)
        .bind(item.purchase_price)
        .bind(item.sale_price)
        .bind(item.quantity)
        .bind(item.date)
        .bind(item.sale_date)
        .bind(item.status.as_str())
        .bind(item.condition.as_str())
        .bind(&item.batch_ref)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        item_from_row(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }
        Ok(())
    }
}

/// Batch store backed by the `batches` table
#[derive(Clone)]
pub struct PgBatchStore {
    db: PgPool,
}

impl PgBatchStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BatchStore for PgBatchStore {
    async fn list(&self) -> AppResult<Vec<BatchRecord>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM batches ORDER BY created_at DESC, id",
            BATCH_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(batch_from_row).collect()
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<BatchRecord>> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM batches WHERE id = $1",
            BATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(batch_from_row).transpose()
    }

    async fn create(&self, new: NewBatch) -> AppResult<BatchRecord> {
        let items = serde_json::to_value(&new.items)
            .map_err(|e| AppError::Internal(format!("Line item serialization: {}", e)))?;

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO batches (batch_code, batch_type, created_at, total_paid,
                                 total_sell_revenue, cash_profit, retained_value,
                                 items_count, items, note)
            VALUES ($1, $2, COALESCE($3, NOW()), $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(&new.batch_code)
        .bind(new.batch_type.as_str())
        .bind(new.created_at)
        .bind(new.total_paid)
        .bind(new.total_sell_revenue)
        .bind(new.cash_profit)
        .bind(new.retained_value)
        .bind(new.items_count)
        .bind(items)
        .bind(&new.note)
        .fetch_one(&self.db)
        .await?;

        batch_from_row(row)
    }

    async fn update(&self, id: Uuid, patch: BatchPatch) -> AppResult<BatchRecord> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        let note = match patch.note {
            Some(note) => note,
            None => existing.note,
        };

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "UPDATE batches SET note = $1 WHERE id = $2 RETURNING {}",
            BATCH_COLUMNS
        ))
        .bind(&note)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        batch_from_row(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM batches WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Batch".to_string()));
        }
        Ok(())
    }

    async fn next_batch_seq(&self) -> AppResult<i64> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('batch_code_seq')")
            .fetch_one(&self.db)
            .await?;
        Ok(seq)
    }
}
