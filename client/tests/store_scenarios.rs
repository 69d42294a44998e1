//! End-to-end scenarios through the application store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use hawker_client::api::ApiError;
use hawker_client::app::{AppAction, AppEnvironment, AppStore, app_store};
use hawker_client::cart::{CartAction, CartLineItem, CartState};
use hawker_client::mocks::{InMemoryCartStorage, StubOrdersApi, StubStallsApi, sample_order};
use hawker_client::orders::OrdersAction;
use hawker_client::persistence::{
    CartStorage, PersistenceError, persist_cart, restore_cart, spawn_autosave,
};
use hawker_client::resource::ResourceAction;
use hawker_client::stalls::{FETCH_STALLS_FAILED, StallsAction};
use hawker_client::types::{MenuItemId, OrderRequest, Stall, StallId};
use hawker_runtime::StoreConfig;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn stall(id: u64, name: &str) -> Stall {
    Stall {
        id: StallId::new(id),
        name: name.to_string(),
        location: "Old Airport Road Food Centre".to_string(),
        cuisine_type: "Hainanese".to_string(),
        rating: 4.2,
        is_open: true,
        image_url: None,
        distance: None,
    }
}

fn item(
    menu_item_id: u64,
    price: rust_decimal::Decimal,
    quantity: u32,
    stall_id: u64,
) -> CartLineItem {
    CartLineItem {
        menu_item_id: MenuItemId::new(menu_item_id),
        name: format!("Item {menu_item_id}"),
        price,
        quantity,
        special_requests: None,
        stall_id: StallId::new(stall_id),
        stall_name: "Ah Seng".to_string(),
    }
}

fn store(stalls: &StubStallsApi, orders: &StubOrdersApi) -> AppStore {
    app_store(
        AppEnvironment::new(Arc::new(stalls.clone()), Arc::new(orders.clone())),
        StoreConfig::default(),
    )
}

async fn dispatch(store: &AppStore, action: impl Into<AppAction>) {
    let mut handle = store.send(action.into()).await.unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();
}

#[tokio::test]
async fn cart_add_then_remove_returns_to_empty() {
    let store = store(&StubStallsApi::new(), &StubOrdersApi::new());

    dispatch(&store, CartAction::Add(item(1, dec!(5), 2, 7))).await;
    let cart = store.state(|s| s.cart.clone()).await;
    assert_eq!(cart.total(), dec!(10));
    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.stall_id(), Some(StallId::new(7)));

    dispatch(
        &store,
        CartAction::Remove {
            menu_item_id: MenuItemId::new(1),
        },
    )
    .await;
    assert_eq!(store.state(|s| s.cart.clone()).await, CartState::new());
}

#[tokio::test]
async fn stall_fetch_success_replaces_list() {
    let api = StubStallsApi::new()
        .with_stalls(vec![stall(1, "Ah Seng"), stall(2, "Tian Tian")])
        .with_latency(Duration::from_millis(30));
    let store = store(&api, &StubOrdersApi::new());

    assert!(!store.state(|s| s.stalls.is_loading()).await);

    let mut handle = store.send(StallsAction::FetchAll.into()).await.unwrap();
    assert!(store.state(|s| s.stalls.is_loading()).await);

    handle.wait_with_timeout(WAIT).await.unwrap();
    let stalls = store.state(|s| s.stalls.clone()).await;
    assert!(!stalls.is_loading());
    assert_eq!(stalls.error(), None);
    assert_eq!(stalls.items().len(), 2);
    assert_eq!(stalls.items()[1].name, "Tian Tian");
}

#[tokio::test]
async fn stall_fetch_failure_keeps_list_and_records_error() {
    let api = StubStallsApi::new().with_stalls(vec![stall(1, "Ah Seng")]);
    let store = store(&api, &StubOrdersApi::new());
    dispatch(&store, StallsAction::FetchAll).await;

    api.set_failure(Some(ApiError::Transport("connection reset".to_string())));
    let mut handle = store.send(StallsAction::FetchAll.into()).await.unwrap();
    assert!(store.state(|s| s.stalls.is_loading()).await);
    handle.wait_with_timeout(WAIT).await.unwrap();

    let stalls = store.state(|s| s.stalls.clone()).await;
    assert!(!stalls.is_loading());
    assert_eq!(stalls.items().len(), 1);
    assert_eq!(stalls.error(), Some(FETCH_STALLS_FAILED));

    api.set_failure(None);
    let mut handle = store.send(StallsAction::FetchAll.into()).await.unwrap();
    assert_eq!(store.state(|s| s.stalls.error().map(str::to_owned)).await, None);
    handle.wait_with_timeout(WAIT).await.unwrap();
}

#[tokio::test]
async fn created_order_goes_first() {
    let orders = StubOrdersApi::new().with_orders(vec![sample_order(5), sample_order(3)]);
    let store = store(&StubStallsApi::new(), &orders);
    dispatch(&store, OrdersAction::FetchAll).await;

    dispatch(
        &store,
        OrdersAction::Create {
            request: OrderRequest::new(json!({
                "stall_id": 1,
                "items": [{ "menu_item_id": 2, "quantity": 1 }]
            })),
        },
    )
    .await;

    let ids: Vec<u64> = store
        .state(|s| s.orders.items().iter().map(|o| o.id.get()).collect())
        .await;
    assert_eq!(ids, vec![6, 5, 3]);
}

#[tokio::test]
async fn last_settled_fetch_wins() {
    let api = StubStallsApi::new();
    api.script_get_all(Duration::from_millis(80), Ok(vec![stall(1, "Slow")]));
    api.script_get_all(Duration::from_millis(10), Ok(vec![stall(2, "Fast")]));
    let store = store(&api, &StubOrdersApi::new());

    let mut slow = store.send(StallsAction::FetchAll.into()).await.unwrap();
    let mut fast = store.send(StallsAction::FetchAll.into()).await.unwrap();

    fast.wait_with_timeout(WAIT).await.unwrap();
    assert_eq!(store.state(|s| s.stalls.items()[0].name.clone()).await, "Fast");
    assert!(!store.state(|s| s.stalls.is_loading()).await);

    slow.wait_with_timeout(WAIT).await.unwrap();
    assert_eq!(store.state(|s| s.stalls.items()[0].name.clone()).await, "Slow");
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn subscribers_see_intent_then_settlement() {
    let api = StubStallsApi::new().with_stalls(vec![stall(1, "Ah Seng")]);
    let store = store(&api, &StubOrdersApi::new());
    let mut actions = store.subscribe_actions();

    dispatch(&store, StallsAction::FetchById { id: StallId::new(9) }).await;

    assert_eq!(
        actions.recv().await.unwrap(),
        AppAction::Stalls(StallsAction::FetchById { id: StallId::new(9) })
    );
    assert_eq!(
        actions.recv().await.unwrap(),
        AppAction::Stalls(StallsAction::Resource(ResourceAction::Rejected {
            message: "Stall not found".to_string()
        }))
    );
}

#[tokio::test]
async fn send_and_wait_for_returns_the_settlement() {
    let orders = StubOrdersApi::new().with_orders(vec![sample_order(1)]);
    let store = store(&StubStallsApi::new(), &orders);

    let settled = store
        .send_and_wait_for(
            OrdersAction::FetchAll.into(),
            |a| matches!(a, AppAction::Orders(OrdersAction::Resource(r)) if r.is_settlement()),
            WAIT,
        )
        .await
        .unwrap();

    assert!(matches!(
        settled,
        AppAction::Orders(OrdersAction::Resource(ResourceAction::Fulfilled(_)))
    ));
    assert_eq!(store.state(|s| s.orders.items().len()).await, 1);
}

#[tokio::test]
async fn caller_confirms_stall_switch_with_clear_then_add() {
    let store = store(&StubStallsApi::new(), &StubOrdersApi::new());
    dispatch(&store, CartAction::Add(item(1, dec!(3), 1, 7))).await;

    let other_stall = item(2, dec!(4), 1, 8);
    assert!(store.state(|s| s.cart.conflicts_with(&other_stall)).await);

    dispatch(&store, CartAction::Add(other_stall.clone())).await;
    assert_eq!(store.state(|s| s.cart.stall_id()).await, Some(StallId::new(7)));

    dispatch(&store, CartAction::Clear).await;
    dispatch(&store, CartAction::Add(other_stall)).await;
    let cart = store.state(|s| s.cart.clone()).await;
    assert_eq!(cart.stall_id(), Some(StallId::new(8)));
    assert_eq!(cart.total(), dec!(4));
}

#[tokio::test]
async fn restore_then_persist_round_trips() {
    let saved = CartState::from_items(vec![item(1, dec!(2.50), 2, 7)]).unwrap();
    let storage = InMemoryCartStorage::with_cart(saved.clone());
    let store = store(&StubStallsApi::new(), &StubOrdersApi::new());

    assert!(restore_cart(&store, &storage).await.unwrap());
    assert_eq!(store.state(|s| s.cart.clone()).await, saved);

    dispatch(
        &store,
        CartAction::SetQuantity {
            menu_item_id: MenuItemId::new(1),
            quantity: 3,
        },
    )
    .await;
    persist_cart(&store, &storage).await.unwrap();

    assert_eq!(storage.saved().unwrap().total(), dec!(7.50));
}

#[tokio::test]
async fn restore_rejects_inconsistent_snapshot() {
    let tampered: CartState = serde_json::from_value(json!({
        "items": [],
        "stall_id": 7,
        "stall_name": "Ah Seng",
        "total": "0",
        "item_count": 0
    }))
    .unwrap();
    let storage = InMemoryCartStorage::with_cart(tampered);
    let store = store(&StubStallsApi::new(), &StubOrdersApi::new());

    assert!(matches!(
        restore_cart(&store, &storage).await,
        Err(PersistenceError::Inconsistent(_))
    ));
    assert_eq!(store.state(|s| s.cart.clone()).await, CartState::new());
}

#[tokio::test]
async fn autosave_follows_cart_actions_only() {
    let storage = InMemoryCartStorage::new();
    let store = store(&StubStallsApi::new(), &StubOrdersApi::new());
    let autosave = spawn_autosave(store.clone(), Arc::new(storage.clone()));

    dispatch(&store, StallsAction::clear_error()).await;
    dispatch(&store, CartAction::Add(item(1, dec!(1.20), 4, 7))).await;

    let deadline = tokio::time::Instant::now() + WAIT;
    while storage.save_count() == 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    autosave.abort();

    assert_eq!(storage.save_count(), 1);
    assert_eq!(storage.load().await.unwrap().unwrap().total(), dec!(4.80));
}

#[tokio::test]
async fn shutdown_refuses_further_actions() {
    let store = store(&StubStallsApi::new(), &StubOrdersApi::new());
    store.shutdown(Duration::from_millis(100)).await.unwrap();

    assert!(store.send(CartAction::Clear.into()).await.is_err());
}
