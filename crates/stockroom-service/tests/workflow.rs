//! End-to-end workflows through `Stockroom` on a file-backed database.

use std::path::PathBuf;

use stockroom_core::{DomainEvent, EventKind, Money, ProductDraft, SaleRequest};
use stockroom_service::{AppConfig, ErrorCode, ServiceError, Stockroom, View, ViewModel};

fn temp_db() -> PathBuf {
    std::env::temp_dir()
        .join(format!("stockroom-test-{}", uuid::Uuid::new_v4()))
        .join("stockroom.db")
}

fn draft(name: &str, stock: i64, cost: i64, price: i64) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        category: "Shirts".to_string(),
        stock: Some(stock),
        cost: Some(Money::from_cents(cost)),
        price: Some(Money::from_cents(price)),
    }
}

#[tokio::test]
async fn sell_then_oversell() {
    let app = Stockroom::open(AppConfig::in_memory()).await.unwrap();
    let product = app
        .inventory()
        .add_product(&draft("Plain Tee", 10, 500, 1000))
        .await
        .unwrap();

    let sale = app
        .sales()
        .process_sale(&SaleRequest::new(&product.id, 3))
        .await
        .unwrap();
    assert_eq!(sale.total().cents(), 3000);
    assert_eq!(sale.profit().cents(), 1500);
    assert_eq!(app.inventory().product(&product.id).await.unwrap().stock, 7);

    let err = app
        .sales()
        .process_sale(&SaleRequest::new(&product.id, 8))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(err.messages()[0].contains("7 available"), "{:?}", err.messages());
    assert_eq!(app.inventory().product(&product.id).await.unwrap().stock, 7);
    assert_eq!(app.sales().all_sales().await.len(), 1);

    let restored = app.sales().delete_sale(&sale.id).await.unwrap();
    assert_eq!(restored.id, sale.id);
    assert_eq!(app.inventory().product(&product.id).await.unwrap().stock, 10);
    assert!(app.sales().all_sales().await.is_empty());
}

#[tokio::test]
async fn data_survives_reopen() {
    let path = temp_db();

    let first = Stockroom::open(AppConfig::local(&path)).await.unwrap();
    let products = first.inventory().all_products().await;
    assert_eq!(products.len(), 8);
    let tee = products.iter().find(|p| p.name == "Basic White Tee").unwrap();
    first
        .sales()
        .process_sale(&SaleRequest::new(&tee.id, 5))
        .await
        .unwrap();
    let revenue = first.analytics().total_revenue().await;
    first.shutdown().await;

    let second = Stockroom::open(AppConfig::local(&path)).await.unwrap();
    assert_eq!(second.sales().all_sales().await.len(), 6);
    assert_eq!(second.analytics().total_revenue().await, revenue);
    assert_eq!(second.inventory().product(&tee.id).await.unwrap().stock, 40);
    second.shutdown().await;

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn events_follow_each_write() {
    let app = Stockroom::open(AppConfig::in_memory()).await.unwrap();
    let mut events = app.subscribe();

    let product = app
        .inventory()
        .add_product(&draft("Plain Tee", 4, 500, 1000))
        .await
        .unwrap();
    app.sales()
        .process_sale(&SaleRequest::new(&product.id, 1))
        .await
        .unwrap();

    let kinds: Vec<EventKind> = events.drain().iter().map(DomainEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ProductAdded,
            EventKind::DataChanged,
            EventKind::SaleAdded,
            EventKind::ProductUpdated,
            EventKind::DataChanged,
        ]
    );

    let err = app.inventory().reduce_stock(&product.id, 10).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
    assert!(events.drain().is_empty());
}

#[tokio::test]
async fn controller_tracks_profits() {
    let mut config = AppConfig::in_memory();
    config.app.seed_sample_data = true;
    let app = Stockroom::open(config).await.unwrap();
    let mut controller = app.controller();

    let before = match controller.navigate(View::Profits).await {
        ViewModel::Profits(view) => view.summary.profit,
        other => panic!("unexpected {other:?}"),
    };

    let jacket = app.inventory().search_products("leather").await.remove(0);
    controller
        .add_sale(&SaleRequest::new(&jacket.id, 2))
        .await
        .unwrap();

    match controller.current().unwrap() {
        ViewModel::Profits(view) => {
            assert_eq!(view.summary.profit - before, Money::from_cents(2 * 11_999));
            assert_eq!(view.summary.profit, view.summary.revenue - view.summary.costs);
        }
        other => panic!("unexpected {other:?}"),
    }
}
