//! Durable side-cache
//!
//! A string-keyed JSON document on local disk holding the item-to-batch
//! side index and the most recent batch history snapshot. The cache is
//! a lookup aid and a fallback when the primary store is unreachable,
//! never authoritative: an item's own `batch_ref` always wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{BatchRecord, ItemBatchMap};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    item_batch_map: ItemBatchMap,
    #[serde(default)]
    batch_history: Vec<BatchRecord>,
}

/// File-backed side-cache for the ItemBatchMap and batch history
pub struct SideCache {
    path: PathBuf,
    state: RwLock<CacheDocument>,
}

impl SideCache {
    /// Load the cache from disk. A missing or corrupt file degrades to
    /// an empty cache.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<CacheDocument>(&bytes) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Corrupt side-cache, starting empty");
                    CacheDocument::default()
                }
            },
            Err(_) => CacheDocument::default(),
        };
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    /// Snapshot of the item→batch side index
    pub async fn item_batch_map(&self) -> ItemBatchMap {
        self.state.read().await.item_batch_map.clone()
    }

    /// Replace the side index and persist
    pub async fn put_item_batch_map(&self, map: ItemBatchMap) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.item_batch_map = map;
        persist(&self.path, &state).await
    }

    /// Tag item ids with a batch code and persist
    pub async fn tag_items(&self, ids: &[Uuid], batch_code: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        for id in ids {
            state
                .item_batch_map
                .insert(*id, batch_code.to_string());
        }
        persist(&self.path, &state).await
    }

    /// Drop map entries for the given item ids and persist
    pub async fn remove_items(&self, ids: &[Uuid]) -> AppResult<()> {
        let mut state = self.state.write().await;
        for id in ids {
            state.item_batch_map.remove(id);
        }
        persist(&self.path, &state).await
    }

    /// Drop every map entry pointing at a batch code and persist
    pub async fn remove_batch(&self, batch_code: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.item_batch_map.retain(|_, code| code != batch_code);
        persist(&self.path, &state).await
    }

    /// Last known batch history (fallback when the store read fails)
    pub async fn cached_history(&self) -> Vec<BatchRecord> {
        self.state.read().await.batch_history.clone()
    }

    /// Replace the batch history snapshot and persist
    pub async fn put_history(&self, history: Vec<BatchRecord>) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.batch_history = history;
        persist(&self.path, &state).await
    }
}

/// Atomic rewrite: temp file in the same directory, then rename.
async fn persist(path: &Path, state: &CacheDocument) -> AppResult<()> {
    let bytes = serde_json::to_vec_pretty(state)
        .map_err(|e| AppError::Cache(format!("Serialize side-cache: {}", e)))?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| AppError::Cache(format!("Write side-cache: {}", e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| AppError::Cache(format!("Replace side-cache: {}", e)))?;
    Ok(())
}
