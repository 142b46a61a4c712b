//! Item lifecycle tests
//!
//! Runs the item service against the in-memory store:
//! - full and partial sales split lots correctly
//! - returns merge into compatible lots or convert in place
//! - validation rejects before any mutation

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

use restock_backend::error::AppError;
use restock_backend::models::{ItemCondition, ItemStatus};
use restock_backend::services::lifecycle::{
    CreateItemInput, ItemService, ReturnItemInput, SellItemInput, UpdateItemInput,
};
use restock_backend::store::{ItemStore, MemoryStore, SideCache};

struct TestEnv {
    items: Arc<dyn ItemStore>,
    cache: Arc<SideCache>,
    service: ItemService,
    _tmp: TempDir,
}

async fn env() -> TestEnv {
    let tmp = tempfile::tempdir().unwrap();
    let cache = Arc::new(SideCache::load(tmp.path().join("cache.json")).await);
    let items: Arc<dyn ItemStore> = Arc::new(MemoryStore::new());
    let service = ItemService::new(items.clone(), cache.clone());
    TestEnv {
        items,
        cache,
        service,
        _tmp: tmp,
    }
}

fn stock_input(name: &str, quantity: i32) -> CreateItemInput {
    CreateItemInput {
        product_name: name.to_string(),
        purchase_price: Decimal::from(20_000),
        sale_price: Some(Decimal::from(30_000)),
        quantity,
        date: None,
        sale_date: None,
        status: None,
        condition: None,
        batch_ref: None,
    }
}

#[tokio::test]
async fn create_defaults_to_in_stock() {
    let env = env().await;
    let item = env.service.create(stock_input("Console", 2)).await.unwrap();

    assert_eq!(item.status, ItemStatus::InStock);
    assert_eq!(item.condition, ItemCondition::New);
    assert!(item.sale_date.is_none());
    assert_eq!(item.quantity, 2);
}

#[tokio::test]
async fn create_sold_item_gets_a_sale_date() {
    let env = env().await;
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let item = env
        .service
        .create(CreateItemInput {
            status: Some(ItemStatus::Sold),
            date: Some(date),
            sale_date: None,
            ..stock_input("Console", 1)
        })
        .await
        .unwrap();

    assert_eq!(item.status, ItemStatus::Sold);
    // Defaults to the acquisition date when not given
    assert_eq!(item.sale_date, Some(date));
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let env = env().await;

    let empty_name = env.service.create(stock_input("   ", 1)).await;
    assert!(matches!(empty_name, Err(AppError::Validation { .. })));

    let zero_quantity = env.service.create(stock_input("Console", 0)).await;
    assert!(matches!(zero_quantity, Err(AppError::Validation { .. })));

    let negative_price = env
        .service
        .create(CreateItemInput {
            purchase_price: Decimal::from(-5),
            ..stock_input("Console", 1)
        })
        .await;
    assert!(matches!(negative_price, Err(AppError::Validation { .. })));

    // Nothing was written
    assert!(env.items.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn full_sale_deletes_the_source_lot() {
    let env = env().await;
    let lot = env.service.create(stock_input("Console", 3)).await.unwrap();

    let outcome = env
        .service
        .sell(
            lot.id,
            SellItemInput {
                quantity: 3,
                unit_sale_price: Decimal::from(35_000),
                sale_date: None,
            },
        )
        .await
        .unwrap();

    assert!(outcome.remaining.is_none());
    assert_eq!(outcome.sold.status, ItemStatus::Sold);
    assert_eq!(outcome.sold.quantity, 3);
    assert_eq!(outcome.sold.sale_price, Some(Decimal::from(35_000)));
    assert!(outcome.sold.sale_date.is_some());
    // The sold record is a new identity and the lot is gone
    assert_ne!(outcome.sold.id, lot.id);
    assert!(env.items.get(lot.id).await.unwrap().is_none());
    assert_eq!(env.items.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn partial_sale_splits_the_lot() {
    let env = env().await;
    let lot = env.service.create(stock_input("Console", 5)).await.unwrap();

    let outcome = env
        .service
        .sell(
            lot.id,
            SellItemInput {
                quantity: 2,
                unit_sale_price: Decimal::from(35_000),
                sale_date: None,
            },
        )
        .await
        .unwrap();

    let remaining = outcome.remaining.unwrap();
    assert_eq!(remaining.id, lot.id);
    assert_eq!(remaining.quantity, 3);
    assert_eq!(remaining.status, ItemStatus::InStock);
    assert_eq!(outcome.sold.quantity, 2);
    // Copied from the source lot
    assert_eq!(outcome.sold.product_name, lot.product_name);
    assert_eq!(outcome.sold.purchase_price, lot.purchase_price);
    assert_eq!(outcome.sold.date, lot.date);
    assert_eq!(env.items.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn oversell_is_rejected_without_mutation() {
    let env = env().await;
    let lot = env.service.create(stock_input("Console", 2)).await.unwrap();

    let result = env
        .service
        .sell(
            lot.id,
            SellItemInput {
                quantity: 3,
                unit_sale_price: Decimal::from(35_000),
                sale_date: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::InsufficientStock(_))));
    let items = env.items.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
}

#[tokio::test]
async fn selling_a_sold_item_is_rejected() {
    let env = env().await;
    let sold = env
        .service
        .create(CreateItemInput {
            status: Some(ItemStatus::Sold),
            ..stock_input("Console", 1)
        })
        .await
        .unwrap();

    let result = env
        .service
        .sell(
            sold.id,
            SellItemInput {
                quantity: 1,
                unit_sale_price: Decimal::from(35_000),
                sale_date: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
}

#[tokio::test]
async fn return_merges_into_a_matching_lot() {
    let env = env().await;
    let lot = env.service.create(stock_input("Console", 4)).await.unwrap();
    let sold = env
        .service
        .create(CreateItemInput {
            status: Some(ItemStatus::Sold),
            quantity: 2,
            ..stock_input("Console", 2)
        })
        .await
        .unwrap();

    let merged = env
        .service
        .return_to_stock(sold.id, ReturnItemInput::default())
        .await
        .unwrap();

    // Quantity folded into the existing lot, sold record removed
    assert_eq!(merged.id, lot.id);
    assert_eq!(merged.quantity, 6);
    assert!(env.items.get(sold.id).await.unwrap().is_none());
    assert_eq!(env.items.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn return_without_a_match_converts_in_place() {
    let env = env().await;
    let sold = env
        .service
        .create(CreateItemInput {
            status: Some(ItemStatus::Sold),
            ..stock_input("Console", 1)
        })
        .await
        .unwrap();

    let returned = env
        .service
        .return_to_stock(
            sold.id,
            ReturnItemInput {
                sale_price: Some(Decimal::from(28_000)),
            },
        )
        .await
        .unwrap();

    // Same identity, back in stock, invariant restored
    assert_eq!(returned.id, sold.id);
    assert_eq!(returned.status, ItemStatus::InStock);
    assert!(returned.sale_date.is_none());
    assert_eq!(returned.sale_price, Some(Decimal::from(28_000)));
}

#[tokio::test]
async fn return_does_not_merge_across_batches() {
    let env = env().await;
    env.service
        .create(CreateItemInput {
            batch_ref: Some("T-001".to_string()),
            ..stock_input("Console", 4)
        })
        .await
        .unwrap();
    let sold = env
        .service
        .create(CreateItemInput {
            status: Some(ItemStatus::Sold),
            batch_ref: Some("T-002".to_string()),
            ..stock_input("Console", 2)
        })
        .await
        .unwrap();

    let returned = env
        .service
        .return_to_stock(sold.id, ReturnItemInput::default())
        .await
        .unwrap();

    // Different batch origin: converted in place instead of merged
    assert_eq!(returned.id, sold.id);
    assert_eq!(env.items.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn edit_updates_fields_without_identity_change() {
    let env = env().await;
    let lot = env.service.create(stock_input("Console", 2)).await.unwrap();

    let updated = env
        .service
        .update(
            lot.id,
            UpdateItemInput {
                product_name: Some("Console Pro".to_string()),
                sale_price: Some(Decimal::from(45_000)),
                condition: Some(ItemCondition::LightlyUsed),
                ..UpdateItemInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, lot.id);
    assert_eq!(updated.product_name, "Console Pro");
    assert_eq!(updated.sale_price, Some(Decimal::from(45_000)));
    assert_eq!(updated.condition, ItemCondition::LightlyUsed);
    // Untouched fields survive
    assert_eq!(updated.quantity, 2);
    assert_eq!(updated.status, ItemStatus::InStock);
}

#[tokio::test]
async fn delete_removes_item_and_map_entry() {
    let env = env().await;
    let lot = env.service.create(stock_input("Console", 1)).await.unwrap();
    env.cache.tag_items(&[lot.id], "T-001").await.unwrap();

    env.service.delete(lot.id).await.unwrap();

    assert!(env.items.get(lot.id).await.unwrap().is_none());
    assert!(!env.cache.item_batch_map().await.contains_key(&lot.id));
}

#[tokio::test]
async fn sold_record_inherits_map_association() {
    let env = env().await;
    let lot = env.service.create(stock_input("Console", 2)).await.unwrap();
    // Association known only through the side map
    env.cache.tag_items(&[lot.id], "T-004").await.unwrap();

    let outcome = env
        .service
        .sell(
            lot.id,
            SellItemInput {
                quantity: 1,
                unit_sale_price: Decimal::from(35_000),
                sale_date: None,
            },
        )
        .await
        .unwrap();

    let map = env.cache.item_batch_map().await;
    assert_eq!(map.get(&outcome.sold.id).map(String::as_str), Some("T-004"));
}
