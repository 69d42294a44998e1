//! Root aggregator: one state tree, one action type, one store.
//!
//! Each feature reducer only sees its own slice. The [`AppStore`] is the
//! single place where state changes; UI code reads through
//! [`hawker_runtime::Store::state`] and writes through
//! [`hawker_runtime::Store::send`].

use crate::api::{OrdersApi, StallsApi};
use crate::cart::{CartAction, CartReducer, CartState};
use crate::http::HttpApi;
use crate::orders::{OrdersAction, OrdersEnvironment, OrdersReducer, OrdersState};
use crate::stalls::{StallsAction, StallsEnvironment, StallsReducer, StallsState};
use hawker_core::composition::{ScopedReducer, scope_reducer};
use hawker_core::{SmallVec, effect::Effect, reducer::Reducer};
use hawker_runtime::{Store, StoreConfig};
use std::sync::Arc;

/// The whole client state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Stall catalog
    pub stalls: StallsState,
    /// Order ledger
    pub orders: OrdersState,
    /// Cart
    pub cart: CartState,
}

/// Every action the client accepts
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Stall catalog action
    Stalls(StallsAction),
    /// Order ledger action
    Orders(OrdersAction),
    /// Cart action
    Cart(CartAction),
}

impl From<StallsAction> for AppAction {
    fn from(action: StallsAction) -> Self {
        Self::Stalls(action)
    }
}

impl From<OrdersAction> for AppAction {
    fn from(action: OrdersAction) -> Self {
        Self::Orders(action)
    }
}

impl From<CartAction> for AppAction {
    fn from(action: CartAction) -> Self {
        Self::Cart(action)
    }
}

/// Injected dependencies of every feature
#[derive(Clone, Debug)]
pub struct AppEnvironment {
    /// Stall catalog dependencies
    pub stalls: StallsEnvironment,
    /// Order ledger dependencies
    pub orders: OrdersEnvironment,
}

impl AppEnvironment {
    /// Creates an environment from the network collaborators
    #[must_use]
    pub fn new(stalls: Arc<dyn StallsApi>, orders: Arc<dyn OrdersApi>) -> Self {
        Self {
            stalls: StallsEnvironment::new(stalls),
            orders: OrdersEnvironment::new(orders),
        }
    }

    /// Creates an environment backed by one HTTP client
    #[must_use]
    pub fn from_http(api: HttpApi) -> Self {
        let api = Arc::new(api);
        Self::new(Arc::clone(&api) as Arc<dyn StallsApi>, api)
    }
}

type ScopedStalls = ScopedReducer<
    AppState,
    StallsState,
    AppAction,
    StallsAction,
    AppEnvironment,
    StallsEnvironment,
    StallsReducer,
>;
type ScopedOrders = ScopedReducer<
    AppState,
    OrdersState,
    AppAction,
    OrdersAction,
    AppEnvironment,
    OrdersEnvironment,
    OrdersReducer,
>;
type ScopedCart = ScopedReducer<
    AppState,
    CartState,
    AppAction,
    CartAction,
    AppEnvironment,
    (),
    CartReducer,
>;

fn stalls_state(state: &mut AppState) -> &mut StallsState {
    &mut state.stalls
}

fn stalls_action(action: AppAction) -> Option<StallsAction> {
    match action {
        AppAction::Stalls(action) => Some(action),
        _ => None,
    }
}

fn stalls_env(env: &AppEnvironment) -> &StallsEnvironment {
    &env.stalls
}

fn orders_state(state: &mut AppState) -> &mut OrdersState {
    &mut state.orders
}

fn orders_action(action: AppAction) -> Option<OrdersAction> {
    match action {
        AppAction::Orders(action) => Some(action),
        _ => None,
    }
}

fn orders_env(env: &AppEnvironment) -> &OrdersEnvironment {
    &env.orders
}

fn cart_state(state: &mut AppState) -> &mut CartState {
    &mut state.cart
}

fn cart_action(action: AppAction) -> Option<CartAction> {
    match action {
        AppAction::Cart(action) => Some(action),
        _ => None,
    }
}

fn cart_env(_env: &AppEnvironment) -> &() {
    &()
}

/// Reducer of the whole client, routing each action to its feature
#[derive(Clone, Debug)]
pub struct AppReducer {
    stalls: ScopedStalls,
    orders: ScopedOrders,
    cart: ScopedCart,
}

impl AppReducer {
    /// Creates the composed reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stalls: scope_reducer(
                StallsReducer::new(),
                stalls_state,
                stalls_action,
                AppAction::Stalls,
                stalls_env,
            ),
            orders: scope_reducer(
                OrdersReducer::new(),
                orders_state,
                orders_action,
                AppAction::Orders,
                orders_env,
            ),
            cart: scope_reducer(
                CartReducer::new(),
                cart_state,
                cart_action,
                AppAction::Cart,
                cart_env,
            ),
        }
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::Stalls(_) => self.stalls.reduce(state, action, env),
            AppAction::Orders(_) => self.orders.reduce(state, action, env),
            AppAction::Cart(_) => self.cart.reduce(state, action, env),
        }
    }
}

/// The client's store
pub type AppStore = Store<AppState, AppAction, AppEnvironment, AppReducer>;

/// Creates a store with an empty state tree
#[must_use]
pub fn app_store(environment: AppEnvironment, config: StoreConfig) -> AppStore {
    Store::with_config(AppState::default(), AppReducer::new(), environment, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLineItem;
    use crate::mocks::{StubOrdersApi, StubStallsApi};
    use crate::types::{MenuItemId, StallId};
    use hawker_testing::{ReducerTest, assertions};
    use rust_decimal_macros::dec;

    fn env() -> AppEnvironment {
        AppEnvironment::new(Arc::new(StubStallsApi::new()), Arc::new(StubOrdersApi::new()))
    }

    #[test]
    fn cart_actions_only_touch_the_cart() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(AppAction::Cart(CartAction::Add(CartLineItem {
                menu_item_id: MenuItemId::new(1),
                name: "Laksa".to_string(),
                price: dec!(6.50),
                quantity: 1,
                special_requests: None,
                stall_id: StallId::new(3),
                stall_name: "Sungei Road Laksa".to_string(),
            })))
            .then_state(|state| {
                assert_eq!(state.cart.item_count(), 1);
                assert_eq!(state.stalls, StallsState::default());
                assert_eq!(state.orders, OrdersState::default());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn fetch_effects_are_lifted_into_app_actions() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(StallsAction::FetchAll.into())
            .then_state(|state| {
                assert!(state.stalls.is_loading());
                assert!(!state.orders.is_loading());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }
}
