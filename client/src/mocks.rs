//! In-memory collaborators for tests and offline use.
//!
//! Stubs are cheap to clone and clones share state, so a test can keep a
//! handle for inspection after moving one into the environment.

use crate::api::{ApiError, ApiFuture, OrdersApi, StallsApi};
use crate::cart::CartState;
use crate::persistence::{CartStorage, PersistenceError, StorageFuture};
use crate::types::{Order, OrderId, OrderRequest, Stall, StallId};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn poisoned() -> ApiError {
    ApiError::Transport("stub lock poisoned".to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ApiError> {
    mutex.lock().map_err(|_| poisoned())
}

fn not_found(what: &str) -> ApiError {
    ApiError::Server {
        status: 404,
        detail: Some(format!("{what} not found")),
    }
}

async fn pause(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[derive(Default)]
struct StallsStub {
    stalls: Vec<Stall>,
    nearby: Vec<Stall>,
    scripted: VecDeque<(Duration, Result<Vec<Stall>, ApiError>)>,
    failure: Option<ApiError>,
    nearby_queries: Vec<(f64, f64)>,
    calls: usize,
}

/// Stall endpoints served from memory
#[derive(Clone, Default)]
pub struct StubStallsApi {
    inner: Arc<Mutex<StallsStub>>,
    latency: Duration,
}

impl StubStallsApi {
    /// Creates a stub with no stalls
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `stalls` from the listing and by-id lookups
    #[must_use]
    pub fn with_stalls(self, stalls: Vec<Stall>) -> Self {
        self.set_stalls(stalls);
        self
    }

    /// Serve `stalls` from proximity queries
    #[must_use]
    pub fn with_nearby(self, stalls: Vec<Stall>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.nearby = stalls;
        }
        self
    }

    /// Fail every call with `error`
    #[must_use]
    pub fn failing(self, error: ApiError) -> Self {
        self.set_failure(Some(error));
        self
    }

    /// Delay every response
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replace the stall listing
    pub fn set_stalls(&self, stalls: Vec<Stall>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.stalls = stalls;
        }
    }

    /// Start or stop failing every call
    pub fn set_failure(&self, failure: Option<ApiError>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failure = failure;
        }
    }

    /// Queue a one-off answer for the next listing call, delivered after `delay`
    pub fn script_get_all(&self, delay: Duration, response: Result<Vec<Stall>, ApiError>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.scripted.push_back((delay, response));
        }
    }

    /// Coordinates of every proximity query so far
    #[must_use]
    pub fn nearby_queries(&self) -> Vec<(f64, f64)> {
        self.inner
            .lock()
            .map(|inner| inner.nearby_queries.clone())
            .unwrap_or_default()
    }

    /// Number of calls served so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.lock().map(|inner| inner.calls).unwrap_or_default()
    }

    /// Records a call, returning the configured failure if any
    fn begin(&self) -> Result<MutexGuard<'_, StallsStub>, ApiError> {
        let mut inner = lock(&self.inner)?;
        inner.calls += 1;
        match inner.failure.clone() {
            Some(error) => Err(error),
            None => Ok(inner),
        }
    }
}

impl StallsApi for StubStallsApi {
    fn get_all(&self) -> ApiFuture<'_, Vec<Stall>> {
        Box::pin(async move {
            let (delay, response) = {
                let mut inner = lock(&self.inner)?;
                inner.calls += 1;
                match inner.scripted.pop_front() {
                    Some(scripted) => scripted,
                    None => (
                        self.latency,
                        inner.failure.clone().map_or_else(|| Ok(inner.stalls.clone()), Err),
                    ),
                }
            };
            pause(delay).await;
            response
        })
    }

    fn get_by_id(&self, id: StallId) -> ApiFuture<'_, Stall> {
        Box::pin(async move {
            let response = self.begin().and_then(|inner| {
                inner
                    .stalls
                    .iter()
                    .find(|stall| stall.id == id)
                    .cloned()
                    .ok_or_else(|| not_found("Stall"))
            });
            pause(self.latency).await;
            response
        })
    }

    fn get_nearby(&self, latitude: f64, longitude: f64) -> ApiFuture<'_, Vec<Stall>> {
        Box::pin(async move {
            let response = self.begin().map(|mut inner| {
                inner.nearby_queries.push((latitude, longitude));
                inner.nearby.clone()
            });
            pause(self.latency).await;
            response
        })
    }
}

#[derive(Default)]
struct OrdersStub {
    orders: Vec<Order>,
    created: Option<Order>,
    created_requests: Vec<serde_json::Value>,
    failure: Option<ApiError>,
}

/// Order endpoints served from memory
#[derive(Clone, Default)]
pub struct StubOrdersApi {
    inner: Arc<Mutex<OrdersStub>>,
    latency: Duration,
}

impl StubOrdersApi {
    /// Creates a stub with no orders
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `orders` from the listing and by-id lookups
    #[must_use]
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.orders = orders;
        }
        self
    }

    /// Answer the next create with `order`
    ///
    /// Without this, creates answer with [`sample_order`] numbered after the
    /// highest known order id.
    #[must_use]
    pub fn with_created(self, order: Order) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.created = Some(order);
        }
        self
    }

    /// Fail every call with `error`
    #[must_use]
    pub fn failing(self, error: ApiError) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failure = Some(error);
        }
        self
    }

    /// Delay every response
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Payloads of every create call so far
    #[must_use]
    pub fn created_requests(&self) -> Vec<serde_json::Value> {
        self.inner
            .lock()
            .map(|inner| inner.created_requests.clone())
            .unwrap_or_default()
    }

    fn begin(&self) -> Result<MutexGuard<'_, OrdersStub>, ApiError> {
        let inner = lock(&self.inner)?;
        match inner.failure.clone() {
            Some(error) => Err(error),
            None => Ok(inner),
        }
    }
}

impl OrdersApi for StubOrdersApi {
    fn get_all(&self) -> ApiFuture<'_, Vec<Order>> {
        Box::pin(async move {
            let response = self.begin().map(|inner| inner.orders.clone());
            pause(self.latency).await;
            response
        })
    }

    fn get_by_id(&self, id: OrderId) -> ApiFuture<'_, Order> {
        Box::pin(async move {
            let response = self.begin().and_then(|inner| {
                inner
                    .orders
                    .iter()
                    .find(|order| order.id == id)
                    .cloned()
                    .ok_or_else(|| not_found("Order"))
            });
            pause(self.latency).await;
            response
        })
    }

    fn create(&self, request: OrderRequest) -> ApiFuture<'_, Order> {
        Box::pin(async move {
            let response = self.begin().map(|mut inner| {
                inner.created_requests.push(request.payload().clone());
                let order = inner.created.take().unwrap_or_else(|| {
                    let next = inner.orders.iter().map(|o| o.id.get()).max().unwrap_or(0) + 1;
                    sample_order(next)
                });
                inner.orders.insert(0, order.clone());
                order
            });
            pause(self.latency).await;
            response
        })
    }
}

/// A pending order at stall 1, created 2025-01-01 12:00 UTC
#[must_use]
pub fn sample_order(id: u64) -> Order {
    Order {
        id: OrderId::new(id),
        stall_id: StallId::new(1),
        stall_name: "Ah Seng".to_string(),
        status: "pending".to_string(),
        payment_status: "unpaid".to_string(),
        total_amount: Decimal::new(1050, 2),
        queue_number: None,
        order_number: Some(format!("HWK-{id:04}")),
        pickup_window_start: None,
        pickup_window_end: None,
        created_at: Utc
            .with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_default(),
    }
}

/// Cart storage held in memory
#[derive(Clone, Default)]
pub struct InMemoryCartStorage {
    saved: Arc<Mutex<Option<CartState>>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryCartStorage {
    /// Creates empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage holding `cart`
    ///
    /// The cart is stored as given, without validation.
    #[must_use]
    pub fn with_cart(cart: CartState) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Some(cart))),
            saves: Arc::default(),
        }
    }

    /// The last saved cart
    #[must_use]
    pub fn saved(&self) -> Option<CartState> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }

    /// Number of saves so far
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|saves| *saves).unwrap_or_default()
    }
}

fn storage_poisoned() -> PersistenceError {
    PersistenceError::Io(std::io::Error::other("storage lock poisoned"))
}

impl CartStorage for InMemoryCartStorage {
    fn load(&self) -> StorageFuture<'_, Option<CartState>> {
        Box::pin(async move {
            let cart = self.saved.lock().map_err(|_| storage_poisoned())?.clone();
            if let Some(cart) = &cart {
                cart.validate()?;
            }
            Ok(cart)
        })
    }

    fn save<'a>(&'a self, cart: &'a CartState) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            *self.saved.lock().map_err(|_| storage_poisoned())? = Some(cart.clone());
            *self.saves.lock().map_err(|_| storage_poisoned())? += 1;
            Ok(())
        })
    }
}
