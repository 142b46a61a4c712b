//! Legacy migration tests
//!
//! Runs the one-time importer against the in-memory store, then the
//! reconciler over the imported rows: the full legacy recovery flow.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use restock_backend::error::AppError;
use restock_backend::models::{Disposition, ItemCondition, ItemStatus, PricingLineItem};
use restock_backend::services::migrate::{
    LegacyBatch, LegacyImportInput, LegacyItem, MigrationService,
};
use restock_backend::services::reconcile::ReconcileService;
use restock_backend::store::{BatchStore, ItemStore, MemoryStore, SideCache};

struct TestEnv {
    items: Arc<dyn ItemStore>,
    batches: Arc<dyn BatchStore>,
    cache: Arc<SideCache>,
    service: MigrationService,
    _tmp: TempDir,
}

async fn env() -> TestEnv {
    let tmp = tempfile::tempdir().unwrap();
    let cache = Arc::new(SideCache::load(tmp.path().join("cache.json")).await);
    let store = Arc::new(MemoryStore::new());
    let items: Arc<dyn ItemStore> = store.clone();
    let batches: Arc<dyn BatchStore> = store;
    let service = MigrationService::new(items.clone(), batches.clone());
    TestEnv {
        items,
        batches,
        cache,
        service,
        _tmp: tmp,
    }
}

fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 11, day, 9, 0, 0).unwrap()
}

fn legacy_item(name: &str, status: ItemStatus) -> LegacyItem {
    LegacyItem {
        local_id: Some("local-42".to_string()),
        product_name: name.to_string(),
        purchase_price: Decimal::from(8_000),
        sale_price: Some(Decimal::from(12_000)),
        quantity: 1,
        date: ts(5),
        sale_date: None,
        status,
        condition: ItemCondition::New,
        batch_ref: None,
    }
}

fn legacy_batch(code: &str, lines: Vec<PricingLineItem>) -> LegacyBatch {
    LegacyBatch {
        batch_code: code.to_string(),
        created_at: ts(4),
        total_paid: Decimal::from(8_000),
        total_sell_revenue: Decimal::from(12_000),
        cash_profit: Decimal::from(4_000),
        retained_value: Decimal::ZERO,
        items_count: lines.len().max(1) as i32,
        items: lines,
        note: None,
    }
}

fn sell_line(name: &str) -> PricingLineItem {
    PricingLineItem {
        id: Uuid::new_v4(),
        product_name: name.to_string(),
        quantity: 1,
        listed_unit_price: Decimal::from(8_000),
        unit_sale_price: Decimal::from(12_000),
        condition: ItemCondition::New,
        disposition: Disposition::Sell,
    }
}

#[tokio::test]
async fn import_moves_records_into_the_store() {
    let env = env().await;
    let summary = env
        .service
        .import(LegacyImportInput {
            items: vec![
                legacy_item("Console", ItemStatus::InStock),
                legacy_item("Headset", ItemStatus::InStock),
            ],
            batches: vec![legacy_batch("T-001", vec![sell_line("Console")])],
        })
        .await
        .unwrap();

    assert_eq!(summary.items_imported, 2);
    assert_eq!(summary.batches_imported, 1);
    assert_eq!(summary.batches_skipped, 0);

    let items = env.items.list().await.unwrap();
    assert_eq!(items.len(), 2);
    // Identity-free fields carried over; the store assigned fresh ids
    assert!(items.iter().any(|i| i.product_name == "Console"));
    assert!(items
        .iter()
        .all(|i| i.purchase_price == Decimal::from(8_000)));

    let batches = env.batches.list().await.unwrap();
    assert_eq!(batches.len(), 1);
    // Historical creation time preserved
    assert_eq!(batches[0].created_at, ts(4));
}

#[tokio::test]
async fn reimport_skips_existing_batch_codes() {
    let env = env().await;
    let payload = || LegacyImportInput {
        items: vec![],
        batches: vec![legacy_batch("T-001", vec![])],
    };

    let first = env.service.import(payload()).await.unwrap();
    assert_eq!(first.batches_imported, 1);

    let second = env.service.import(payload()).await.unwrap();
    assert_eq!(second.batches_imported, 0);
    assert_eq!(second.batches_skipped, 1);
    assert_eq!(env.batches.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn import_normalizes_the_sale_date_invariant() {
    let env = env().await;
    // Sold without a sale date; in-stock with a stray one
    let mut sold = legacy_item("Console", ItemStatus::Sold);
    sold.sale_date = None;
    let mut stocked = legacy_item("Headset", ItemStatus::InStock);
    stocked.sale_date = Some(ts(6));

    env.service
        .import(LegacyImportInput {
            items: vec![sold, stocked],
            batches: vec![],
        })
        .await
        .unwrap();

    let items = env.items.list().await.unwrap();
    let sold = items.iter().find(|i| i.status == ItemStatus::Sold).unwrap();
    let stocked = items
        .iter()
        .find(|i| i.status == ItemStatus::InStock)
        .unwrap();

    assert_eq!(sold.sale_date, Some(sold.date));
    assert!(stocked.sale_date.is_none());
}

#[tokio::test]
async fn import_rejects_malformed_batch_codes() {
    let env = env().await;
    let result = env
        .service
        .import(LegacyImportInput {
            items: vec![],
            batches: vec![legacy_batch("BATCH-1", vec![])],
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert!(env.batches.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn import_rejects_invalid_items_before_writing() {
    let env = env().await;
    let mut bad = legacy_item("Console", ItemStatus::InStock);
    bad.quantity = 0;

    let result = env
        .service
        .import(LegacyImportInput {
            items: vec![legacy_item("Headset", ItemStatus::InStock), bad],
            batches: vec![],
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert!(env.items.list().await.unwrap().is_empty());
}

/// The full legacy flow: imported stock carries no batch tag, and the
/// reconciler recovers the association from the imported batch history.
#[tokio::test]
async fn imported_stock_reconciles_to_its_batch() {
    let env = env().await;
    env.service
        .import(LegacyImportInput {
            items: vec![legacy_item("Console", ItemStatus::InStock)],
            batches: vec![legacy_batch("T-001", vec![sell_line("Console")])],
        })
        .await
        .unwrap();

    let reconciler = ReconcileService::new(
        env.items.clone(),
        env.batches.clone(),
        env.cache.clone(),
    );
    let tagged = reconciler.run().await.unwrap();
    assert_eq!(tagged, 1);

    let map = env.cache.item_batch_map().await;
    let items = env.items.list().await.unwrap();
    assert_eq!(
        items[0].resolved_batch_ref(&map),
        Some("T-001")
    );

    // A second pass changes nothing
    assert_eq!(reconciler.run().await.unwrap(), 0);
}
