//! Network collaborator interfaces.
//!
//! The containers never perform I/O themselves; they describe fetches as
//! effects that call these traits. Production code injects [`crate::http::HttpApi`],
//! tests inject the stubs in [`crate::mocks`].

use crate::types::{Order, OrderId, OrderRequest, Stall, StallId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by the collaborator traits
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Failure of a network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection, timeout, ...)
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("server returned {status}{}", detail_suffix(.detail))]
    Server {
        /// HTTP status code
        status: u16,
        /// Human-readable message from the response body, if any
        detail: Option<String>,
    },

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[allow(clippy::ref_option)] // called from the derived Display impl
fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl ApiError {
    /// The message to show for this failure
    ///
    /// Only a server-supplied detail is shown verbatim; every other failure
    /// is reported with the operation's `fallback` text.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::Server {
                detail: Some(detail),
                ..
            } if !detail.is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Stall endpoints
pub trait StallsApi: Send + Sync {
    /// Fetch every stall
    fn get_all(&self) -> ApiFuture<'_, Vec<Stall>>;

    /// Fetch one stall
    fn get_by_id(&self, id: StallId) -> ApiFuture<'_, Stall>;

    /// Fetch stalls near a coordinate, with `distance` populated
    fn get_nearby(&self, latitude: f64, longitude: f64) -> ApiFuture<'_, Vec<Stall>>;
}

/// Order endpoints
pub trait OrdersApi: Send + Sync {
    /// Fetch the caller's orders
    fn get_all(&self) -> ApiFuture<'_, Vec<Order>>;

    /// Fetch one order
    fn get_by_id(&self, id: OrderId) -> ApiFuture<'_, Order>;

    /// Place an order, returning it as persisted by the server
    fn create(&self, request: OrderRequest) -> ApiFuture<'_, Order>;
}
