//! Order ledger: the caller's placed orders and the selected order.

use crate::api::OrdersApi;
use crate::resource::{Fetched, Resource, ResourceAction, settle};
use crate::types::{Order, OrderId, OrderRequest};
use hawker_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Shown when listing orders fails without a server message
pub const FETCH_ORDERS_FAILED: &str = "Failed to fetch orders";
/// Shown when fetching one order fails without a server message
pub const FETCH_ORDER_FAILED: &str = "Failed to fetch order";
/// Shown when placing an order fails without a server message
pub const CREATE_ORDER_FAILED: &str = "Failed to create order";

/// State of the order ledger
pub type OrdersState = Resource<Order>;

/// Actions of the order ledger
#[derive(Clone, Debug, PartialEq)]
pub enum OrdersAction {
    /// Fetch every order, replacing the list
    FetchAll,
    /// Fetch one order into the selection
    FetchById {
        /// Order to fetch
        id: OrderId,
    },
    /// Place an order; on success it is prepended to the list
    Create {
        /// Opaque creation payload
        request: OrderRequest,
    },
    /// Lifecycle transition of the ledger
    Resource(ResourceAction<Order>),
}

impl OrdersAction {
    /// Select an order, or deselect with `None`
    #[must_use]
    pub const fn set_selected(order: Option<Order>) -> Self {
        Self::Resource(ResourceAction::SetSelected(order))
    }

    /// Dismiss the current error
    #[must_use]
    pub const fn clear_error() -> Self {
        Self::Resource(ResourceAction::ClearError)
    }
}

/// Dependencies of the order ledger
#[derive(Clone)]
pub struct OrdersEnvironment {
    /// Order endpoints
    pub api: Arc<dyn OrdersApi>,
}

impl OrdersEnvironment {
    /// Creates an environment around a collaborator
    #[must_use]
    pub fn new(api: Arc<dyn OrdersApi>) -> Self {
        Self { api }
    }
}

impl std::fmt::Debug for OrdersEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersEnvironment").finish_non_exhaustive()
    }
}

/// Reducer of the order ledger
#[derive(Clone, Debug, Default)]
pub struct OrdersReducer;

impl OrdersReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for OrdersReducer {
    type State = OrdersState;
    type Action = OrdersAction;
    type Environment = OrdersEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let api = Arc::clone(&env.api);
        let effect = match action {
            OrdersAction::Resource(transition) => {
                state.apply(transition);
                return SmallVec::new();
            },
            OrdersAction::FetchAll => settle(
                async move { api.get_all().await.map(Fetched::Many) },
                FETCH_ORDERS_FAILED,
                OrdersAction::Resource,
            ),
            OrdersAction::FetchById { id } => settle(
                async move { api.get_by_id(id).await.map(Fetched::One) },
                FETCH_ORDER_FAILED,
                OrdersAction::Resource,
            ),
            OrdersAction::Create { request } => settle(
                async move { api.create(request).await.map(Fetched::Created) },
                CREATE_ORDER_FAILED,
                OrdersAction::Resource,
            ),
        };

        state.apply(ResourceAction::Pending);
        smallvec![effect]
    }
}
