//! Command-line demo of the hawker client.
//!
//! Restores the saved cart, loads stalls and orders from the backend through
//! the store, prints what it got, then saves the cart and shuts down.

use anyhow::Context;
use hawker_client::app::{AppAction, AppEnvironment, AppStore, app_store};
use hawker_client::config::ClientConfig;
use hawker_client::http::HttpApi;
use hawker_client::orders::OrdersAction;
use hawker_client::persistence::{
    CartStorage, JsonFileCartStorage, persist_cart, restore_cart, spawn_autosave,
};
use hawker_client::resource::ResourceAction;
use hawker_client::stalls::StallsAction;
use hawker_core::environment::SystemClock;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn is_settlement(action: &AppAction) -> bool {
    match action {
        AppAction::Stalls(StallsAction::Resource(transition)) => transition.is_settlement(),
        AppAction::Orders(OrdersAction::Resource(transition)) => transition.is_settlement(),
        _ => false,
    }
}

async fn fetch(store: &AppStore, action: AppAction, timeout: Duration) {
    match store.send_and_wait_for(action, is_settlement, timeout).await {
        Ok(
            AppAction::Stalls(StallsAction::Resource(ResourceAction::Rejected { message }))
            | AppAction::Orders(OrdersAction::Resource(ResourceAction::Rejected { message })),
        ) => {
            println!("  ! {message}");
        },
        Ok(_) => {},
        Err(error) => println!("  ! no answer: {error}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env();

    tracing_subscriber::registry()
        .with(config.log_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        endpoint = %config.api.endpoint(),
        cart_path = %config.cart_path.display(),
        "Starting hawker client demo"
    );

    let api = HttpApi::from_config(&config.api).context("building HTTP client")?;
    let store = app_store(AppEnvironment::from_http(api), config.store.clone());

    let storage: Arc<dyn CartStorage> = Arc::new(JsonFileCartStorage::new(
        config.cart_path.clone(),
        Arc::new(SystemClock),
    ));
    match restore_cart(&store, storage.as_ref()).await {
        Ok(true) => info!("Restored saved cart"),
        Ok(false) => info!("Starting with an empty cart"),
        Err(error) => tracing::warn!(error = %error, "Ignoring unreadable saved cart"),
    }
    let autosave = spawn_autosave(store.clone(), Arc::clone(&storage));

    let timeout = config.api.request_timeout + Duration::from_secs(1);

    println!("=== Stalls ===");
    fetch(&store, StallsAction::FetchAll.into(), timeout).await;
    let stalls = store.state(|s| s.stalls.items().to_vec()).await;
    for stall in &stalls {
        let status = if stall.is_open { "open" } else { "closed" };
        println!(
            "  [{}] {} ({}, {}) rating {:.1}, {status}",
            stall.id, stall.name, stall.cuisine_type, stall.location, stall.rating
        );
    }

    println!("\n=== Orders ===");
    fetch(&store, OrdersAction::FetchAll.into(), timeout).await;
    let orders = store.state(|s| s.orders.items().to_vec()).await;
    for order in &orders {
        println!(
            "  #{} {} at {}: {} / {} ({})",
            order.order_number.as_deref().unwrap_or("-"),
            order.id,
            order.stall_name,
            order.status,
            order.payment_status,
            order.total_amount
        );
    }

    println!("\n=== Cart ===");
    let cart = store.state(|s| s.cart.clone()).await;
    match cart.stall_name() {
        Some(stall) => {
            println!("  From {stall}:");
            for line in cart.items() {
                println!("    {} x {} @ {}", line.quantity, line.name, line.price);
            }
            println!("  {} items, total {}", cart.item_count(), cart.total());
        },
        None => println!("  (empty)"),
    }

    autosave.abort();
    match autosave.await {
        Err(error) if !error.is_cancelled() => {
            tracing::warn!(error = %error, "Autosave task failed");
        },
        _ => {},
    }
    persist_cart(&store, storage.as_ref())
        .await
        .context("saving cart")?;
    store
        .shutdown_with_default_timeout()
        .await
        .context("shutting down store")?;

    Ok(())
}
