//! Store ports for items and batches
//!
//! The core never talks to a database directly; it consumes these
//! object-safe traits. Two adapters exist: Postgres (`postgres`) and an
//! in-memory store (`memory`) used by tests and the no-database demo
//! mode. The durable side-cache lives in `cache`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{BatchPatch, BatchRecord, Item, ItemPatch, NewBatch, NewItem};

pub mod cache;
pub mod memory;
pub mod postgres;

pub use cache::SideCache;
pub use memory::MemoryStore;
pub use postgres::{PgBatchStore, PgItemStore};

/// Port for the item record store
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// List all items, newest acquisition first
    async fn list(&self) -> AppResult<Vec<Item>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Item>>;

    async fn create(&self, new: NewItem) -> AppResult<Item>;

    /// Create several items with sequential writes; a failure aborts the
    /// remainder and earlier writes stay in place
    async fn create_many(&self, new: Vec<NewItem>) -> AppResult<Vec<Item>>;

    async fn update(&self, id: Uuid, patch: ItemPatch) -> AppResult<Item>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Port for the batch record store
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// List all batch records, newest first
    async fn list(&self) -> AppResult<Vec<BatchRecord>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<BatchRecord>>;

    async fn create(&self, new: NewBatch) -> AppResult<BatchRecord>;

    async fn update(&self, id: Uuid, patch: BatchPatch) -> AppResult<BatchRecord>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Next value of the monotonic batch-code sequence
    async fn next_batch_seq(&self) -> AppResult<i64>;
}
