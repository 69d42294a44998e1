//! # Hawker Client
//!
//! Client-side state for the hawker food-ordering app: a single-stall cart,
//! the stall catalog and the order ledger, composed into one store.
//!
//! - [`cart`]: the cart state machine (single-stall, merged lines, derived totals)
//! - [`resource`]: the pending / fulfilled / rejected lifecycle shared by fetched collections
//! - [`stalls`] and [`orders`]: the two fetched collections
//! - [`app`]: the root state tree, reducer and store
//! - [`api`] and [`http`]: network collaborators
//! - [`persistence`]: cart snapshots
//!
//! ## Example
//!
//! ```no_run
//! use hawker_client::app::{AppAction, AppEnvironment, app_store};
//! use hawker_client::config::ClientConfig;
//! use hawker_client::http::HttpApi;
//! use hawker_client::stalls::StallsAction;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env();
//! let env = AppEnvironment::from_http(HttpApi::from_config(&config.api)?);
//! let store = app_store(env, config.store.clone());
//!
//! let mut handle = store.send(AppAction::Stalls(StallsAction::FetchAll)).await?;
//! handle.wait_with_timeout(Duration::from_secs(10)).await?;
//!
//! let open = store
//!     .state(|s| s.stalls.items().iter().filter(|stall| stall.is_open).count())
//!     .await;
//! println!("{open} stalls open");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod cart;
pub mod config;
pub mod http;
pub mod mocks;
pub mod orders;
pub mod persistence;
pub mod resource;
pub mod stalls;
pub mod types;

pub use app::{AppAction, AppEnvironment, AppReducer, AppState, AppStore, app_store};
pub use cart::{CartAction, CartLineItem, CartReducer, CartState};
pub use types::{MenuItemId, Order, OrderId, OrderRequest, Stall, StallId};
