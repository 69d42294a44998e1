//! HTTP implementation of the network collaborators.

use crate::api::{ApiError, ApiFuture, OrdersApi, StallsApi};
use crate::config::ApiConfig;
use crate::types::{Order, OrderId, OrderRequest, Stall, StallId};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Client for the backend REST API
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    endpoint: String,
}

impl HttpApi {
    /// Create a client for an API root such as `http://localhost:8000/api`
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    /// Create a client from configuration, applying the request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built
    /// (for example when no TLS backend is available).
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, config.endpoint()))
    }

    /// Create a client around an existing `reqwest` client
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    #[tracing::instrument(level = "debug", skip(self, request), fields(endpoint = %self.endpoint))]
    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), path, "Request failed");
            return Err(ApiError::Server {
                status: status.as_u16(),
                detail: detail_from_body(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(path, self.client.get(self.url(path))).await
    }
}

/// Extracts a displayable message from an error body
///
/// The backend reports errors as `{"detail": "..."}`. Validation failures
/// carry a list in `detail` instead, which is not shown verbatim.
fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        _ => None,
    }
}

impl StallsApi for HttpApi {
    fn get_all(&self) -> ApiFuture<'_, Vec<Stall>> {
        Box::pin(self.get::<Vec<Stall>>("/stalls"))
    }

    fn get_by_id(&self, id: StallId) -> ApiFuture<'_, Stall> {
        Box::pin(async move { self.get::<Stall>(&format!("/stalls/{id}")).await })
    }

    fn get_nearby(&self, latitude: f64, longitude: f64) -> ApiFuture<'_, Vec<Stall>> {
        Box::pin(async move {
            let path = "/stalls/nearby";
            let request = self
                .client
                .get(self.url(path))
                .query(&[("lat", latitude), ("lng", longitude)]);
            self.execute(path, request).await
        })
    }
}

impl OrdersApi for HttpApi {
    fn get_all(&self) -> ApiFuture<'_, Vec<Order>> {
        Box::pin(self.get::<Vec<Order>>("/orders"))
    }

    fn get_by_id(&self, id: OrderId) -> ApiFuture<'_, Order> {
        Box::pin(async move { self.get::<Order>(&format!("/orders/{id}")).await })
    }

    fn create(&self, request: OrderRequest) -> ApiFuture<'_, Order> {
        Box::pin(async move {
            let path = "/orders";
            let builder = self.client.post(self.url(path)).json(&request);
            self.execute(path, builder).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        assert_eq!(
            detail_from_body(r#"{"detail":"Stall not found"}"#),
            Some("Stall not found".to_string())
        );
    }

    #[test]
    fn non_string_or_missing_detail_is_ignored() {
        assert_eq!(
            detail_from_body(r#"{"detail":[{"loc":["body","items"],"msg":"field required"}]}"#),
            None
        );
        assert_eq!(detail_from_body(r#"{"detail":""}"#), None);
        assert_eq!(detail_from_body(r#"{"message":"nope"}"#), None);
        assert_eq!(detail_from_body("<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let api = HttpApi::new("http://localhost:8000/api/");
        assert_eq!(api.url("/stalls"), "http://localhost:8000/api/stalls");
    }
}
